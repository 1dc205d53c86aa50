//! `[fetch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [fetch]
//! timeout = 10                    # Outbound request timeout in seconds
//! max_body = 52428800             # Largest accepted response body in bytes
//! same_origin = ["assets.local"]  # Extra authorities served in-process
//! ```

use crate::{
    config::{ConfigDiagnostics, FieldPath},
    warp::fetch::{DEFAULT_MAX_BODY, DEFAULT_TIMEOUT, FetchOptions},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outbound fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout in seconds.
    pub timeout: u64,

    pub max_body: u64,

    /// `host[:port]` authorities that the wrapped app serves itself.
    pub same_origin: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT.as_secs(),
            max_body: DEFAULT_MAX_BODY,
            same_origin: Vec::new(),
        }
    }
}

impl FetchConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.timeout == 0 {
            diag.error_with_hint(
                FieldPath::new("fetch.timeout"),
                "timeout must be positive",
                "e.g. `timeout = 30` for slow upstreams",
            );
        }
        if self.max_body == 0 {
            diag.error(FieldPath::new("fetch.max_body"), "must be positive");
        }
        for (i, alias) in self.same_origin.iter().enumerate() {
            if alias.is_empty() || alias.contains('/') {
                diag.error_with_hint(
                    FieldPath::new(format!("fetch.same_origin[{i}]")),
                    format!("`{alias}` is not an authority"),
                    "use `host` or `host:port`, without a scheme",
                );
            }
        }
    }

    pub fn options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.timeout),
            max_body: self.max_body,
            same_origin: self.same_origin.clone(),
        }
    }
}
