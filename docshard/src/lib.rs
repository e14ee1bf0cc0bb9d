#![allow(dead_code, unused_imports)]
//! # Docshard - Distributed JSON Document Store
//!
//! Docshard is a small distributed document store. Clients send textual
//! database commands to a central router, which broadcasts them to storage
//! shard nodes; each shard executes the command against its own file-backed
//! JSON collection and sends the reply back through the router.
//!
//! ## Key Pieces
//!
//! - **Documents**: Schemaless, order-preserving JSON objects keyed by a
//!   reserved `_id` field
//! - **Collections**: An in-memory document list persisted to a single JSON
//!   file, with `find`, `insert`, `update` and `remove` operations
//! - **Cursors**: Eagerly evaluated query result snapshots with
//!   exclusion-only projection
//! - **Command Engine**: Parses and executes the `db.collection.*` command
//!   language shared by the shard console and the wire protocol
//! - **Router**: Accepts client and shard connections, runs the `IDENTIFY`
//!   handshake, and relays lines between the two populations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docshard::collection::Collection;
//! use docshard::doc;
//!
//! # fn main() -> docshard::errors::DocshardResult<()> {
//! let mut collection = Collection::new("/var/lib/docshard", "users.json");
//! collection.load()?;
//!
//! collection.insert(doc! { name: "John", "age": 30 })?;
//! let cursor = collection.find(doc! { name: "John" }, doc! {});
//! for document in cursor {
//!     println!("{document}");
//! }
//!
//! collection.save()?;
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod command;
pub mod common;
pub mod config;
pub mod errors;
pub mod net;
