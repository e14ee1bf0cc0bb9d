//! Command parsing and execution for shard nodes.

mod engine;
mod parser;

pub use engine::{CommandEngine, Execution};
pub use parser::{parse, split_outside_groups, Command};
