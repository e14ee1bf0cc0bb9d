//! The central router every client and shard connects to.
//!
//! The router holds no documents and interprets no commands. It accepts
//! connections, asks each one to identify itself, and from then on relays
//! lines between the two populations according to the configured
//! [RoutingStrategy].

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use crate::common::{DEFAULT_MAX_CONNECTIONS, IDENTIFY, KEY_PORT};
use crate::config::Config;
use crate::errors::{DocshardError, DocshardResult, ErrorKind};
use crate::net::registry::{ConnectionRegistry, Role};
use crate::net::routing::{BroadcastRouting, RoutingStrategy};

pub struct Router {
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    routing: Arc<dyn RoutingStrategy>,
    max_connections: usize,
}

impl Router {
    /// Builds a router from a properties file: `port` is required,
    /// `maxConnections` is optional.
    pub fn from_config(config: &Config) -> DocshardResult<Router> {
        let port = config.port()?;
        let max_connections = config.max_connections()?;
        Router::bind(port, max_connections)
    }

    /// Binds the listening socket. Port `0` asks the OS for a free port.
    pub fn bind(port: u16, max_connections: usize) -> DocshardResult<Router> {
        let listener = TcpListener::bind(("0.0.0.0", port)).map_err(|err| {
            if err.kind() == std::io::ErrorKind::AddrInUse {
                DocshardError::new(
                    "Port is already in use, please choose another",
                    ErrorKind::BindError,
                )
            } else {
                err.into()
            }
        })?;
        Ok(Router {
            listener,
            registry: Arc::new(ConnectionRegistry::new()),
            routing: Arc::new(BroadcastRouting),
            max_connections,
        })
    }

    /// Replaces the routing policy. Takes effect for lines relayed after the
    /// call.
    pub fn with_routing(mut self, routing: Arc<dyn RoutingStrategy>) -> Router {
        self.routing = routing;
        self
    }

    pub fn local_addr(&self) -> DocshardResult<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accepts connections until the listener fails, spawning one relay
    /// thread per connection. Connections over the configured bound are
    /// refused by closing them immediately.
    pub fn run(&self) -> DocshardResult<()> {
        log::info!(
            "router listening on {} (max {} connections)",
            self.listener.local_addr()?,
            self.max_connections
        );

        for incoming in self.listener.incoming() {
            let stream = match incoming {
                Ok(stream) => stream,
                Err(err) => {
                    log::warn!("failed to accept connection: {err}");
                    continue;
                }
            };

            if self.registry.total() >= self.max_connections {
                log::warn!(
                    "refusing connection from {:?}: connection bound of {} reached",
                    stream.peer_addr(),
                    self.max_connections
                );
                drop(stream);
                continue;
            }

            let registry = Arc::clone(&self.registry);
            let routing = Arc::clone(&self.routing);
            thread::spawn(move || {
                if let Err(err) = serve_connection(registry, routing, stream) {
                    log::warn!("connection ended with error: {err}");
                }
            });
        }
        Ok(())
    }
}

/// Runs the identification handshake, then relays lines from this connection
/// until the peer hangs up.
fn serve_connection(
    registry: Arc<ConnectionRegistry>,
    routing: Arc<dyn RoutingStrategy>,
    stream: TcpStream,
) -> DocshardResult<()> {
    let addr = stream.peer_addr()?;
    let mut reader = BufReader::new(stream.try_clone()?);

    let role = identify(&mut reader, &stream)?;
    let peer = registry.register(role, addr, stream.try_clone()?);

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let line = line.trim_end_matches(['\r', '\n']);
                if line.is_empty() {
                    continue;
                }
                match role {
                    Role::Client => routing.on_client_line(&registry, line),
                    Role::Shard => routing.on_shard_line(&registry, line),
                }
            }
            Err(err) => {
                registry.deregister(&peer);
                return Err(err.into());
            }
        }
    }

    registry.deregister(&peer);
    Ok(())
}

/// Sends the `IDENTIFY` challenge and reads reply lines until the peer names
/// a known role. Unrecognized replies re-issue the challenge; closing the
/// socket without identifying is a protocol error.
fn identify(reader: &mut BufReader<TcpStream>, stream: &TcpStream) -> DocshardResult<Role> {
    let mut writer = stream.try_clone()?;
    let mut reply = String::new();
    loop {
        writer.write_all(IDENTIFY.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        reply.clear();
        let read = reader.read_line(&mut reply)?;
        if read == 0 {
            return Err(DocshardError::new(
                "connection closed before identification",
                ErrorKind::ProtocolError,
            ));
        }
        if let Some(role) = Role::from_reply(&reply) {
            return Ok(role);
        }
        log::debug!("unrecognized identification reply: {}", reply.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_same_port_twice_is_bind_error() {
        let first = Router::bind(0, DEFAULT_MAX_CONNECTIONS).unwrap();
        let port = first.local_addr().unwrap().port();
        let err = Router::bind(port, DEFAULT_MAX_CONNECTIONS).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::BindError);
        assert_eq!(
            err.to_string(),
            "Port is already in use, please choose another"
        );
    }

    #[test]
    fn test_from_config_requires_port() {
        let config = Config::parse("maxConnections=10");
        let err = Router::from_config(&config).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::MissingRequiredField);
        assert!(err.to_string().contains(KEY_PORT));
    }
}
