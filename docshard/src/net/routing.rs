//! Line routing policy between clients and shards.

use crate::common::COMMAND_PREFIX;
use crate::net::registry::{ConnectionRegistry, Role};

/// Decides where a line received from one side of the router goes.
///
/// The policy is split out from connection handling so the relay loop stays a
/// dumb pipe; alternative strategies (targeted routing, sharding by key)
/// would slot in here without touching the accept or handshake code.
pub trait RoutingStrategy: Send + Sync {
    /// Handles one line read from a client connection.
    fn on_client_line(&self, registry: &ConnectionRegistry, line: &str);

    /// Handles one line read from a shard connection.
    fn on_shard_line(&self, registry: &ConnectionRegistry, line: &str);
}

/// The default policy: database commands from clients fan out to every shard,
/// everything a shard says fans out to every client. Client lines without the
/// database prefix are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct BroadcastRouting;

impl RoutingStrategy for BroadcastRouting {
    fn on_client_line(&self, registry: &ConnectionRegistry, line: &str) {
        if !line.trim_start().to_lowercase().starts_with(COMMAND_PREFIX) {
            log::debug!("dropping non-command client line: {line}");
            return;
        }
        let delivered = registry.broadcast(Role::Shard, line);
        log::debug!("forwarded client command to {delivered} shard(s)");
    }

    fn on_shard_line(&self, registry: &ConnectionRegistry, line: &str) {
        let delivered = registry.broadcast(Role::Client, line);
        log::debug!("forwarded shard reply to {delivered} client(s)");
    }
}
