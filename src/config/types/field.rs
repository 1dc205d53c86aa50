//! Config field path used in diagnostics.

use owo_colors::OwoColorize;
use std::fmt;

/// Dotted path of a config field, e.g. `source[2].target` or `profile.thumb.steps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Path of the `index`th `[[source]]` entry's `field`.
    pub fn source(index: usize, field: &str) -> Self {
        Self(format!("source[{index}].{field}"))
    }

    /// Path of `field` in `[profile.<name>]`.
    pub fn profile(name: &str, field: &str) -> Self {
        Self(format!("profile.{name}.{field}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
