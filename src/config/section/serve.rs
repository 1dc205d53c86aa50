//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5290                 # HTTP port number
//! root = "public"             # Directory served to non-asset requests
//! threads = 4                 # Request worker threads
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
};

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    pub port: u16,

    /// Static file root, relative to the config file.
    pub root: PathBuf,

    /// Size of the request thread pool.
    pub threads: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5290,
            root: PathBuf::from("public"),
            threads: 4,
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.threads == 0 {
            diag.error(FieldPath::new("serve.threads"), "must be at least 1");
        }
    }
}
