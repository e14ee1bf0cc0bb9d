use std::io::{BufRead, Write};
use std::process;
use std::thread;

use docshard::config::Config;
use docshard::net::ClientNode;

fn main() {
    colog::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("USAGE: docshard-client config.properties\n");
        process::exit(2);
    }

    if let Err(err) = run(&args[1]) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run(config_path: &str) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let client = ClientNode::from_config(&config)?;

    let connection = client.connect()?;
    println!("SUCCESSFUL\n");

    let (mut sender, replies) = connection.into_split();

    // print shard replies as they arrive
    thread::spawn(move || {
        for line in replies {
            println!("{line}");
        }
    });

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        let _ = write!(stdout, "> ");
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => return Ok(()),
            Ok(_) => {}
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") {
            return Ok(());
        }
        sender.send(line)?;
    }
}
