//! Asset sources: how a `<category>/<id>` pair maps onto a retrieval target.

use crate::http::Request;
use regex::Regex;
use rustc_hash::FxHashSet;
use std::{
    fmt,
    sync::{Arc, LazyLock},
};

/// Computes a target from an id and the inbound request.
pub type TargetFn = Arc<dyn Fn(&str, &Request) -> String + Send + Sync>;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));
static ANY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^/]+$").expect("valid regex"));

/// Where a source's assets live.
#[derive(Clone)]
pub enum Target {
    /// URL or path template; every `:id` is replaced with the id.
    Template(String),
    /// Computed per request.
    Function(TargetFn),
}

impl Target {
    pub fn template(template: impl Into<String>) -> Self {
        Self::Template(template.into())
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&str, &Request) -> String + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    pub(crate) fn is_valid(&self) -> bool {
        match self {
            Self::Template(template) => !template.trim().is_empty(),
            Self::Function(_) => true,
        }
    }

    fn compute(&self, id: &str, request: &Request) -> String {
        match self {
            Self::Template(template) => template.replace(":id", id),
            Self::Function(f) => f(id, request),
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Which ids a source accepts.
#[derive(Debug, Clone, Default)]
pub enum IdRule {
    /// Decimal digits only.
    #[default]
    Digits,
    /// Any single non-empty path segment.
    Any,
    Pattern(Regex),
}

impl IdRule {
    pub fn regex(&self) -> &Regex {
        match self {
            Self::Digits => &DIGITS,
            Self::Any => &ANY,
            Self::Pattern(re) => re,
        }
    }

    pub fn matches(&self, id: &str) -> bool {
        self.regex().is_match(id)
    }
}

impl fmt::Display for IdRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            rule => f.write_str(rule.regex().as_str()),
        }
    }
}

/// Options for [`Context::register_source`](super::Context::register_source).
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub id: IdRule,
    pub default_profile: String,
    /// Profiles allowed for this source; empty allows all.
    pub only: Vec<String>,
    /// Profiles refused for this source.
    pub except: Vec<String>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            id: IdRule::Digits,
            default_profile: crate::profile::ORIGINAL.to_owned(),
            only: Vec::new(),
            except: Vec::new(),
        }
    }
}

impl SourceOptions {
    pub fn id(mut self, id: IdRule) -> Self {
        self.id = id;
        self
    }

    pub fn default_profile(mut self, profile: impl Into<String>) -> Self {
        self.default_profile = profile.into();
        self
    }

    pub fn only<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = profiles.into_iter().map(Into::into).collect();
        self
    }

    pub fn except<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.except = profiles.into_iter().map(Into::into).collect();
        self
    }
}

/// A registered asset category.
#[derive(Debug, Clone)]
pub struct Source {
    category: String,
    id: IdRule,
    default_profile: String,
    target: Target,
    only: FxHashSet<String>,
    except: FxHashSet<String>,
}

impl Source {
    pub(crate) fn new(category: String, target: Target, options: SourceOptions) -> Self {
        Self {
            category,
            id: options.id,
            default_profile: options.default_profile,
            target,
            only: options.only.into_iter().collect(),
            except: options.except.into_iter().collect(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn id_rule(&self) -> &IdRule {
        &self.id
    }

    pub fn default_profile(&self) -> &str {
        &self.default_profile
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn matches_id(&self, id: &str) -> bool {
        self.id.matches(id)
    }

    /// Whether the allow/deny lists let `profile` through.
    pub fn permits(&self, profile: &str) -> bool {
        (self.only.is_empty() || self.only.contains(profile)) && !self.except.contains(profile)
    }

    pub fn target_for(&self, id: &str, request: &Request) -> String {
        self.target.compute(id, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_rules() {
        assert!(IdRule::Digits.matches("1234"));
        assert!(!IdRule::Digits.matches("12a"));
        assert!(!IdRule::Digits.matches(""));

        assert!(IdRule::Any.matches("logo.png"));
        assert!(!IdRule::Any.matches(""));

        let rule = IdRule::Pattern(Regex::new("^[a-f0-9]{4}$").unwrap());
        assert!(rule.matches("beef"));
        assert!(!rule.matches("beefy"));
        assert_eq!(rule.to_string(), "^[a-f0-9]{4}$");
        assert_eq!(IdRule::Any.to_string(), "any");
    }

    #[test]
    fn test_template_replaces_every_id() {
        let source = Source::new(
            "images".into(),
            Target::template("http://cdn/:id/:id.jpg"),
            SourceOptions::default(),
        );
        assert_eq!(
            source.target_for("42", &Request::get("/")),
            "http://cdn/42/42.jpg"
        );
    }

    #[test]
    fn test_target_function_sees_request() {
        let source = Source::new(
            "users".into(),
            Target::function(|id, req| format!("http://{}/avatars/{id}", req.host())),
            SourceOptions::default(),
        );
        let req = Request::get("/a/users/7").with_host("example.com");
        assert_eq!(source.target_for("7", &req), "http://example.com/avatars/7");
    }

    #[test]
    fn test_permits() {
        let options = SourceOptions::default().only(["thumb", "original"]).except(["original"]);
        let source = Source::new("x".into(), Target::template("/:id"), options);
        assert!(source.permits("thumb"));
        assert!(!source.permits("original"));
        assert!(!source.permits("large"));

        let source = Source::new("x".into(), Target::template("/:id"), SourceOptions::default());
        assert!(source.permits("anything"));
    }

    #[test]
    fn test_target_validity() {
        assert!(Target::template("/:id").is_valid());
        assert!(!Target::template("").is_valid());
        assert!(!Target::template("  ").is_valid());
        assert!(Target::function(|id, _| id.to_owned()).is_valid());
    }
}
