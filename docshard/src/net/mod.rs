//! The networked topology: a central router relaying command lines between
//! client nodes and storage shard nodes.

mod client;
mod registry;
mod router;
mod routing;
mod shard;

pub use client::{ClientConnection, ClientNode, CommandSender};
pub use registry::{ConnectionRegistry, Peer, Role};
pub use router::Router;
pub use routing::{BroadcastRouting, RoutingStrategy};
pub use shard::ShardNode;
