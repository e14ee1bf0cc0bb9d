use std::io::{BufRead, Write};
use std::process;
use std::thread;

use docshard::command::Execution;
use docshard::config::Config;
use docshard::net::ShardNode;

fn main() {
    colog::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("USAGE: docshard-shard config.properties\n");
        process::exit(2);
    }

    if let Err(err) = run(&args[1]) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run(config_path: &str) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let shard = ShardNode::from_config(&config)?;

    // local console over the same engine the router connection uses
    let engine = shard.engine();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            let _ = write!(stdout, "> ");
            let _ = stdout.flush();

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            if line.trim().is_empty() {
                continue;
            }

            match engine.lock().execute(&line) {
                Execution::Output(reply) => println!("{reply}"),
                Execution::Quiet => {}
                Execution::Exit => process::exit(0),
            }
        }
    });

    shard.run()?;
    Ok(())
}
