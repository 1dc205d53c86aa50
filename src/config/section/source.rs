//! `[[source]]` entries.
//!
//! # Example
//!
//! ```toml
//! [[source]]
//! category = "images"
//! target = "http://cdn.example/:id.jpg"
//! id = "^[0-9]+$"              # regex, "any" or "digits" (default)
//! default_profile = "thumb"
//! only = ["thumb", "large"]
//! except = []
//! ```
//!
//! Targets starting with `/` are fetched from the server itself.

use crate::{
    config::{ConfigDiagnostics, ConfigError, FieldPath},
    context::{IdRule, SourceOptions, Target},
    profile::ORIGINAL,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One asset category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub category: String,

    /// URL or path template; `:id` is replaced by the requested id.
    pub target: String,

    /// Id pattern; defaults to digits only.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default = "default_profile")]
    pub default_profile: String,

    #[serde(default)]
    pub only: Vec<String>,

    #[serde(default)]
    pub except: Vec<String>,
}

fn default_profile() -> String {
    ORIGINAL.to_owned()
}

impl SourceConfig {
    /// Check this entry against the set of declared profile names.
    pub fn validate(&self, index: usize, profiles: &[&str], diag: &mut ConfigDiagnostics) {
        let field = |name: &str| FieldPath::source(index, name);

        if self.category.is_empty() || self.category.contains('/') {
            diag.error(
                field("category"),
                format!("`{}` is not a single path segment", self.category),
            );
        }

        if self.target.trim().is_empty() {
            diag.error_with_hint(
                field("target"),
                "target is empty",
                "use a URL such as `http://cdn.example/:id.jpg` or a path such as `/uploads/:id`",
            );
        } else if !self.target.contains(":id") {
            diag.warn(field("target"), "target has no `:id`, every id maps to the same asset");
        }

        if let Err(ConfigError::InvalidIdPattern(pattern, err)) = self.id_rule() {
            diag.error(field("id"), format!("invalid regex `{pattern}`: {err}"));
        }

        if !profiles.contains(&self.default_profile.as_str()) {
            diag.error(
                field("default_profile"),
                format!("profile `{}` is not declared", self.default_profile),
            );
        }

        for (list, names) in [("only", &self.only), ("except", &self.except)] {
            for name in names {
                if !profiles.contains(&name.as_str()) {
                    diag.warn(field(list), format!("profile `{name}` is not declared"));
                }
            }
        }
    }

    pub fn id_rule(&self) -> Result<IdRule, ConfigError> {
        match self.id.as_deref() {
            None | Some("digits") => Ok(IdRule::Digits),
            Some("any") => Ok(IdRule::Any),
            Some(pattern) => Regex::new(pattern)
                .map(IdRule::Pattern)
                .map_err(|err| ConfigError::InvalidIdPattern(pattern.to_owned(), err)),
        }
    }

    pub fn options(&self) -> Result<SourceOptions, ConfigError> {
        Ok(SourceOptions::default()
            .id(self.id_rule()?)
            .default_profile(self.default_profile.clone())
            .only(self.only.iter().cloned())
            .except(self.except.iter().cloned()))
    }

    pub fn target(&self) -> Target {
        Target::template(self.target.clone())
    }
}
