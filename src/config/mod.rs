//! Server configuration management for `assetwarp.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── engine     # [engine]
//! │   ├── fetch      # [fetch]
//! │   ├── profile    # [profile.<name>]
//! │   ├── serve      # [serve]
//! │   └── source     # [[source]]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # WarpConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section            | Purpose                                       |
//! |--------------------|-----------------------------------------------|
//! | `prefix`           | URL prefix of asset requests (default `a`)    |
//! | `[serve]`          | Address, static root, worker threads          |
//! | `[fetch]`          | Outbound timeout, body limit, same-origin     |
//! | `[engine]`         | ImageMagick or the built-in raster engine     |
//! | `[[source]]`       | Asset categories                              |
//! | `[profile.<name>]` | Transformation profiles                       |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    EngineConfig, EngineKind, FetchConfig, ProfileConfig, ServeConfig, SourceConfig,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, Commands},
    context::{Context, DEFAULT_PREFIX},
    engine::ImageEngine,
    log,
    profile::ORIGINAL,
    warp::FetchOptions,
};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing assetwarp.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarpConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory containing the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub source: Vec<SourceConfig>,

    #[serde(default)]
    pub profile: BTreeMap<String, ProfileConfig>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_owned()
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            prefix: default_prefix(),
            serve: ServeConfig::default(),
            fetch: FetchConfig::default(),
            engine: EngineConfig::default(),
            source: Vec::new(),
            profile: BTreeMap::new(),
        }
    }
}

impl WarpConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file; its parent directory
    /// becomes the root that relative paths resolve against.
    pub fn load(cli: &Cli) -> Result<Self> {
        let Some(config_path) = find_config_file(&cli.config) else {
            bail!(
                "config file '{}' not found in this directory or any parent",
                cli.config.display()
            );
        };

        let mut config = Self::from_path(&config_path)?;
        config.root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.config_path = config_path;
        config.apply_command_options(cli);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli) {
        if let Commands::Serve {
            interface,
            port,
            root,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.root, root.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // accessors
    // ========================================================================

    /// Static file root, resolved against the config directory.
    pub fn serve_root(&self) -> PathBuf {
        self.root.join(&self.serve.root)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        self.fetch.options()
    }

    pub fn build_engine(&self) -> Arc<dyn ImageEngine> {
        self.engine.build()
    }

    /// Names of all profiles available to sources, including `original`.
    fn profile_names(&self) -> Vec<&str> {
        std::iter::once(ORIGINAL)
            .chain(self.profile.keys().map(String::as_str))
            .collect()
    }

    /// Build the routing context from the declared sources and profiles.
    pub fn build_context(&self) -> Result<Context, ConfigError> {
        let mut context = Context::new(&self.prefix);

        for (name, profile) in &self.profile {
            context.insert_profile(profile.build(name)?)?;
        }
        for source in &self.source {
            context.register_source(&source.category, source.target(), source.options()?)?;
        }

        Ok(context)
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the whole configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if self.prefix.contains("//") {
            diag.error(FieldPath::new("prefix"), "must not contain empty segments");
        }

        self.serve.validate(&mut diag);
        self.fetch.validate(&mut diag);
        self.engine.validate(&mut diag);

        for (name, profile) in &self.profile {
            profile.validate(name, &mut diag);
        }

        let profiles = self.profile_names();
        let mut categories: Vec<&str> = Vec::with_capacity(self.source.len());
        for (i, source) in self.source.iter().enumerate() {
            source.validate(i, &profiles, &mut diag);
            if categories.contains(&source.category.as_str()) {
                diag.warn(
                    FieldPath::source(i, "category"),
                    format!("`{}` is declared again and replaces the earlier entry", source.category),
                );
            }
            categories.push(&source.category);
        }

        if self.source.is_empty() {
            diag.warn(FieldPath::new("source"), "no sources declared, every request passes through");
        }

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from a TOML fragment.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> WarpConfig {
    let (parsed, ignored) = WarpConfig::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
