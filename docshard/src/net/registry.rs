//! Connection bookkeeping for the router.
//!
//! Every accepted connection identifies itself as either a client or a shard
//! and is tracked per role. Broadcasts fan a line out to every live peer of a
//! role; a peer whose socket fails mid-broadcast is skipped and logged, and
//! gets dropped from the registry when its reader loop ends.

use std::fmt::{Display, Formatter};
use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::common::{ROLE_CLIENT, ROLE_SHARD};

/// The role a connection declared in the identification handshake.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Client,
    Shard,
}

impl Role {
    /// Maps a handshake reply line to a role, case-insensitively.
    pub fn from_reply(reply: &str) -> Option<Role> {
        let reply = reply.trim();
        if reply.eq_ignore_ascii_case(ROLE_CLIENT) {
            Some(Role::Client)
        } else if reply.eq_ignore_ascii_case(ROLE_SHARD) {
            Some(Role::Shard)
        } else {
            None
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => f.write_str(ROLE_CLIENT),
            Role::Shard => f.write_str(ROLE_SHARD),
        }
    }
}

/// One registered connection. The write half is mutex-guarded so broadcasts
/// from different relay threads never interleave within a line.
pub struct Peer {
    id: u64,
    role: Role,
    addr: SocketAddr,
    writer: Mutex<TcpStream>,
}

impl Peer {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Writes one protocol line followed by a newline and flushes.
    pub fn send_line(&self, line: &str) -> std::io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

/// Tracks the live peers of each role.
#[derive(Default)]
pub struct ConnectionRegistry {
    clients: RwLock<Vec<Arc<Peer>>>,
    shards: RwLock<Vec<Arc<Peer>>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        ConnectionRegistry::default()
    }

    /// Registers a freshly identified connection and returns its peer handle.
    pub fn register(&self, role: Role, addr: SocketAddr, stream: TcpStream) -> Arc<Peer> {
        let peer = Arc::new(Peer {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            role,
            addr,
            writer: Mutex::new(stream),
        });
        self.bucket(role).write().push(Arc::clone(&peer));
        log::info!("{} connected from {}", role, addr);
        peer
    }

    /// Drops a peer from its role bucket, typically when its socket closes.
    pub fn deregister(&self, peer: &Peer) {
        let mut bucket = self.bucket(peer.role).write();
        bucket.retain(|candidate| candidate.id != peer.id);
        log::info!("{} disconnected from {}", peer.role, peer.addr);
    }

    /// Sends a line to every live peer of the role, returning how many peers
    /// it reached. Write failures are logged and skipped; the failing peer is
    /// cleaned up by its own reader loop.
    pub fn broadcast(&self, role: Role, line: &str) -> usize {
        let peers: Vec<Arc<Peer>> = self.bucket(role).read().clone();
        let mut delivered = 0;
        for peer in peers {
            match peer.send_line(line) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    log::warn!("dropping line to {} at {}: {}", role, peer.addr, err);
                }
            }
        }
        delivered
    }

    /// The number of live peers of one role.
    pub fn count(&self, role: Role) -> usize {
        self.bucket(role).read().len()
    }

    /// The number of live peers across both roles.
    pub fn total(&self) -> usize {
        self.count(Role::Client) + self.count(Role::Shard)
    }

    fn bucket(&self, role: Role) -> &RwLock<Vec<Arc<Peer>>> {
        match role {
            Role::Client => &self.clients,
            Role::Shard => &self.shards,
        }
    }
}
