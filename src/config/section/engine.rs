//! `[engine]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! kind = "magick"       # magick (ImageMagick) | raster (built in, no PDF)
//! program = "convert"   # ImageMagick entry point, e.g. "magick" on IM7
//! ```

use crate::{
    config::{ConfigDiagnostics, FieldPath},
    engine::{ImageEngine, MagickEngine, RasterEngine, magick::DEFAULT_PROGRAM},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    #[default]
    Magick,
    Raster,
}

/// Image engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kind: EngineKind,
    pub program: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Magick,
            program: DEFAULT_PROGRAM.to_owned(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.kind == EngineKind::Magick && self.program.trim().is_empty() {
            diag.error(
                FieldPath::new("engine.program"),
                "must name the ImageMagick executable",
            );
        }
    }

    pub fn build(&self) -> Arc<dyn ImageEngine> {
        match self.kind {
            EngineKind::Magick => Arc::new(MagickEngine::new(self.program.clone())),
            EngineKind::Raster => Arc::new(RasterEngine),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_engine_config() {
        let config = test_parse_config("[engine]\nkind = \"raster\"");
        assert_eq!(config.engine.kind, EngineKind::Raster);

        let config = test_parse_config("[engine]\nprogram = \"magick\"");
        assert_eq!(config.engine.kind, EngineKind::Magick);
        assert_eq!(config.engine.program, "magick");
    }

    #[test]
    fn test_engine_config_validation() {
        let mut diag = ConfigDiagnostics::new();
        EngineConfig {
            kind: EngineKind::Magick,
            program: String::new(),
        }
        .validate(&mut diag);
        assert!(diag.has_errors());

        let mut diag = ConfigDiagnostics::new();
        EngineConfig {
            kind: EngineKind::Raster,
            program: String::new(),
        }
        .validate(&mut diag);
        assert!(!diag.has_errors());
    }
}
