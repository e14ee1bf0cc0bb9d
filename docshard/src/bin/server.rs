use std::process;

use docshard::config::Config;
use docshard::net::Router;

fn main() {
    colog::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("USAGE: docshard-server config.properties\n");
        process::exit(2);
    }

    if let Err(err) = run(&args[1]) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run(config_path: &str) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let router = Router::from_config(&config)?;
    router.run()?;
    Ok(())
}
