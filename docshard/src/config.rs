//! Java-style `.properties` configuration files.
//!
//! Every node reads its settings from a properties file passed on the command
//! line. The format is deliberately small: one `key=value` pair per line,
//! `#` and `!` start comment lines, blank lines are skipped, keys and values
//! are trimmed. Unknown keys are retained but never interpreted.

use std::collections::HashMap;
use std::path::Path;

use crate::common::DEFAULT_MAX_CONNECTIONS;
use crate::errors::{DocshardError, DocshardResult, ErrorKind};

/// A parsed properties file.
#[derive(Clone, Debug, Default)]
pub struct Config {
    entries: HashMap<String, String>,
}

impl Config {
    /// Reads and parses a properties file from disk.
    pub fn load(path: impl AsRef<Path>) -> DocshardResult<Config> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| {
            DocshardError::new_with_cause(
                &format!("failed to read config file '{}'", path.display()),
                ErrorKind::ConfigError,
                err.into(),
            )
        })?;
        Ok(Config::parse(&contents))
    }

    /// Parses properties from an in-memory string. Later duplicates win.
    pub fn parse(contents: &str) -> Config {
        let mut entries = HashMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                entries.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Config { entries }
    }

    /// Looks up an optional key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Looks up a key that must be present.
    pub fn require(&self, key: &str) -> DocshardResult<&str> {
        self.get(key).ok_or_else(|| {
            DocshardError::new(
                &format!("missing required config key '{key}'"),
                ErrorKind::MissingRequiredField,
            )
        })
    }

    /// The mandatory `port` key, parsed as a TCP port number.
    pub fn port(&self) -> DocshardResult<u16> {
        let raw = self.require(crate::common::KEY_PORT)?;
        raw.parse::<u16>().map_err(|err| {
            DocshardError::new_with_cause(
                &format!("invalid port '{raw}'"),
                ErrorKind::ConfigError,
                err.into(),
            )
        })
    }

    /// The optional `maxConnections` key, falling back to the built-in bound.
    pub fn max_connections(&self) -> DocshardResult<usize> {
        match self.get(crate::common::KEY_MAX_CONNECTIONS) {
            None => Ok(DEFAULT_MAX_CONNECTIONS),
            Some(raw) => raw.parse::<usize>().map_err(|err| {
                DocshardError::new_with_cause(
                    &format!("invalid maxConnections '{raw}'"),
                    ErrorKind::ConfigError,
                    err.into(),
                )
            }),
        }
    }
}

/// Canonicalizes a configured server address for dialing. The loopback
/// aliases `localhost` and `127.0.0.1` collapse to the latter; anything else
/// is passed through untouched.
pub fn normalize_server(addr: &str) -> String {
    let addr = addr.trim();
    if addr.eq_ignore_ascii_case("localhost") || addr == "127.0.0.1" {
        "127.0.0.1".to_string()
    } else {
        addr.to_string()
    }
}
