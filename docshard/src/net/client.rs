//! A client node: dials the router, identifies itself, and exchanges command
//! lines for shard replies.
//!
//! The connection is split into a writing half and a channel of reply lines.
//! A background reader thread owns the read half; it answers `IDENTIFY`
//! challenges itself (the router may re-issue them at any time) and forwards
//! every other line to the reply channel.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::common::{IDENTIFY, KEY_SERVER, RECONNECT_DELAY, ROLE_CLIENT};
use crate::config::{normalize_server, Config};
use crate::errors::DocshardResult;

pub struct ClientNode {
    server: String,
    port: u16,
}

impl ClientNode {
    pub fn from_config(config: &Config) -> DocshardResult<ClientNode> {
        let server = normalize_server(config.require(KEY_SERVER)?);
        let port = config.port()?;
        Ok(ClientNode::new(server, port))
    }

    pub fn new(server: impl Into<String>, port: u16) -> ClientNode {
        ClientNode {
            server: server.into(),
            port,
        }
    }

    /// Dials the router, retrying a refused connection after a fixed delay.
    pub fn connect(&self) -> DocshardResult<ClientConnection> {
        loop {
            match self.try_connect() {
                Ok(connection) => return Ok(connection),
                Err(err) => {
                    log::info!(
                        "router {}:{} not reachable ({}), retrying in {:?}",
                        self.server,
                        self.port,
                        err,
                        RECONNECT_DELAY
                    );
                    thread::sleep(RECONNECT_DELAY);
                }
            }
        }
    }

    /// Dials the router once.
    pub fn try_connect(&self) -> DocshardResult<ClientConnection> {
        let stream = TcpStream::connect((self.server.as_str(), self.port))?;
        ClientConnection::over(stream)
    }
}

/// An established client connection.
pub struct ClientConnection {
    writer: TcpStream,
    responses: Receiver<String>,
}

impl ClientConnection {
    /// Wraps a connected socket, spawning the reader thread that handles the
    /// identification handshake and collects replies.
    pub fn over(stream: TcpStream) -> DocshardResult<ClientConnection> {
        let reader_stream = stream.try_clone()?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || read_loop(reader_stream, tx));
        Ok(ClientConnection {
            writer: stream,
            responses: rx,
        })
    }

    /// Sends one command line to the router.
    pub fn send(&mut self, line: &str) -> DocshardResult<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Waits for the next reply line. `None` when no reply arrived within the
    /// timeout or the connection closed.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<String> {
        match self.responses.recv_timeout(timeout) {
            Ok(line) => Some(line),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Shuts the connection down. The reader thread sees end of stream and
    /// terminates; the router sees the hangup and deregisters this peer.
    pub fn close(&self) {
        let _ = self.writer.shutdown(std::net::Shutdown::Both);
    }

    /// Splits the connection into its write half and the reply channel, for
    /// callers that pump the two from different threads.
    pub fn into_split(self) -> (CommandSender, Receiver<String>) {
        (CommandSender { writer: self.writer }, self.responses)
    }
}

/// The write half of a split [ClientConnection].
pub struct CommandSender {
    writer: TcpStream,
}

impl CommandSender {
    pub fn send(&mut self, line: &str) -> DocshardResult<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads lines until the socket closes. `IDENTIFY` challenges are answered
/// inline; everything else goes to the reply channel.
fn read_loop(stream: TcpStream, replies: Sender<String>) {
    let mut writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(err) => {
            log::warn!("failed to clone client socket: {err}");
            return;
        }
    };
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::warn!("read from router failed: {err}");
                break;
            }
        };
        if line.trim() == IDENTIFY {
            let reply = format!("{ROLE_CLIENT}\n");
            if let Err(err) = writer.write_all(reply.as_bytes()).and_then(|()| writer.flush()) {
                log::warn!("failed to answer identification: {err}");
                break;
            }
            continue;
        }
        if replies.send(line).is_err() {
            break;
        }
    }
}
