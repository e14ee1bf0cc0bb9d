//! A storage shard node.
//!
//! Each shard owns one file-backed collection and a command engine over it.
//! On startup it dials the router, answers the identification handshake, and
//! then executes every command line the router relays to it, writing replies
//! back on the same socket. The engine is also shared with the local console,
//! so both inputs funnel through one serialized execution path.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::collection::Collection;
use crate::command::{CommandEngine, Execution};
use crate::common::{KEY_BASE_PATH, KEY_FILE, KEY_SERVER, RECONNECT_DELAY};
use crate::config::{normalize_server, Config};
use crate::errors::DocshardResult;

#[derive(Debug, Eq, PartialEq)]
enum ServeOutcome {
    /// The router hung up; dial again.
    Disconnected,
    /// An `exit` command arrived; shut the shard down.
    Exit,
}

pub struct ShardNode {
    server: String,
    port: u16,
    engine: Arc<Mutex<CommandEngine>>,
}

impl ShardNode {
    /// Builds a shard from a properties file: `server`, `port`, `basePath`
    /// and `file` are all required. The collection is loaded eagerly so a
    /// console is usable before the router is reachable.
    pub fn from_config(config: &Config) -> DocshardResult<ShardNode> {
        let server = normalize_server(config.require(KEY_SERVER)?);
        let port = config.port()?;
        let base_path = config.require(KEY_BASE_PATH)?.to_string();
        let file = config.require(KEY_FILE)?.to_string();

        let mut collection = Collection::new(base_path, file);
        collection.load()?;

        let engine = CommandEngine::new(collection, server.clone());
        Ok(ShardNode {
            server,
            port,
            engine: Arc::new(Mutex::new(engine)),
        })
    }

    /// The shared command engine, for wiring up a local console.
    pub fn engine(&self) -> Arc<Mutex<CommandEngine>> {
        Arc::clone(&self.engine)
    }

    /// Connects to the router and serves relayed commands until an `exit`
    /// command arrives. A refused or dropped connection is retried after a
    /// fixed delay, so shards may start before the router.
    pub fn run(&self) -> DocshardResult<()> {
        loop {
            let stream = match TcpStream::connect((self.server.as_str(), self.port)) {
                Ok(stream) => stream,
                Err(err) => {
                    log::info!(
                        "router {}:{} not reachable ({}), retrying in {:?}",
                        self.server,
                        self.port,
                        err,
                        RECONNECT_DELAY
                    );
                    thread::sleep(RECONNECT_DELAY);
                    continue;
                }
            };

            log::info!("connected to router {}:{}", self.server, self.port);
            match self.serve(stream)? {
                ServeOutcome::Exit => return Ok(()),
                ServeOutcome::Disconnected => {
                    log::info!("router connection lost, reconnecting");
                    thread::sleep(RECONNECT_DELAY);
                }
            }
        }
    }

    /// Executes every line arriving on one router connection.
    fn serve(&self, stream: TcpStream) -> DocshardResult<ServeOutcome> {
        let mut writer = stream.try_clone()?;
        let reader = BufReader::new(stream);

        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    log::warn!("read from router failed: {err}");
                    return Ok(ServeOutcome::Disconnected);
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let execution = self.engine.lock().execute(&line);
            match execution {
                Execution::Output(reply) => {
                    // a failed reply write is a lost connection, not a fatal
                    // shard error; the caller re-enters the reconnect loop
                    let wrote = writer
                        .write_all(reply.as_bytes())
                        .and_then(|()| writer.write_all(b"\n"))
                        .and_then(|()| writer.flush());
                    if let Err(err) = wrote {
                        log::warn!("write to router failed: {err}");
                        return Ok(ServeOutcome::Disconnected);
                    }
                }
                Execution::Quiet => {}
                Execution::Exit => return Ok(ServeOutcome::Exit),
            }
        }
        Ok(ServeOutcome::Disconnected)
    }
}
