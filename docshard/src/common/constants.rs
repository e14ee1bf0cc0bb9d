use std::time::Duration;

// doc constants
pub const DOC_ID: &str = "_id";

// collection constants
pub const COLLECTION_EXTENSION: &str = "json";

// protocol constants
pub const IDENTIFY: &str = "IDENTIFY";
pub const ROLE_CLIENT: &str = "CLIENT";
pub const ROLE_SHARD: &str = "SHARD";
pub const COMMAND_PREFIX: &str = "db.";

// node constants
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_CONNECTIONS: usize = 500;

// config constants
pub const KEY_SERVER: &str = "server";
pub const KEY_PORT: &str = "port";
pub const KEY_BASE_PATH: &str = "basePath";
pub const KEY_FILE: &str = "file";
pub const KEY_MAX_CONNECTIONS: &str = "maxConnections";

pub const DOCSHARD_VERSION: &str = env!("CARGO_PKG_VERSION");
