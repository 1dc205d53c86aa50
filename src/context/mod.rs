//! Asset resolution.
//!
//! A [`Context`] holds the URL prefix, the registered sources and the
//! registered profiles. It maps request paths of the form
//!
//! ```text
//! <prefix><category>/<id>[/<profile>]
//! ```
//!
//! onto a retrieval target and a profile name. Anything that does not fit is
//! not an asset request, and [`Context::resolve`] returns `None`.
//!
//! # Example
//!
//! ```ignore
//! let mut ctx = Context::default();
//! ctx.register_source("images", Target::template("http://cdn.example/:id.jpg"), SourceOptions::default())?;
//! ctx.register_image_profile("thumb", |blob| blob.crop_resize(100, 100, Gravity::Center))?;
//!
//! // GET /a/images/42/thumb -> ("http://cdn.example/42.jpg", "thumb")
//! ```

mod source;

pub use source::{IdRule, Source, SourceOptions, Target, TargetFn};

use crate::{
    blob::Blob,
    config::ConfigError,
    error::Result,
    http::Request,
    mime::ContentClass,
    profile::{self, Profile, Restriction},
};
use rustc_hash::FxHashMap;

/// Default URL prefix.
pub const DEFAULT_PREFIX: &str = "a";

/// Target and profile of an asset request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub target: String,
    pub profile: String,
}

/// Registry of sources and profiles plus the resolver.
///
/// Built once at startup, then shared read-only between request threads.
#[derive(Debug)]
pub struct Context {
    prefix: String,
    sources: FxHashMap<String, Source>,
    profiles: FxHashMap<String, Profile>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Context {
    /// Create a context with the `original` profile registered.
    pub fn new(prefix: &str) -> Self {
        let mut profiles = FxHashMap::default();
        profiles.insert(
            profile::ORIGINAL.to_owned(),
            Profile::identity(profile::ORIGINAL),
        );
        Self {
            prefix: normalize_prefix(prefix),
            sources: FxHashMap::default(),
            profiles,
        }
    }

    /// Prefix with exactly one leading and one trailing slash.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: &str) {
        self.prefix = normalize_prefix(prefix);
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register (or replace) the source for `category`.
    pub fn register_source(
        &mut self,
        category: impl Into<String>,
        target: Target,
        options: SourceOptions,
    ) -> Result<(), ConfigError> {
        let category = category.into();
        if !target.is_valid() {
            return Err(ConfigError::InvalidTarget(category));
        }
        let source = Source::new(category.clone(), target, options);
        self.sources.insert(category, source);
        Ok(())
    }

    /// Register a profile accepting the given restrictions.
    pub fn register_profile<F>(
        &mut self,
        name: impl Into<String>,
        restrictions: &[Restriction],
        mutation: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&mut Blob) -> Result<()> + Send + Sync + 'static,
    {
        self.insert_profile(Profile::new(name, restrictions, mutation))
    }

    /// Register a profile restricted to web-safe images.
    pub fn register_image_profile<F>(
        &mut self,
        name: impl Into<String>,
        mutation: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&mut Blob) -> Result<()> + Send + Sync + 'static,
    {
        self.register_profile(
            name,
            &[Restriction::Class(ContentClass::WebSafeImage)],
            mutation,
        )
    }

    /// Register an already built profile.
    pub fn insert_profile(&mut self, profile: Profile) -> Result<(), ConfigError> {
        if self.profiles.contains_key(profile.name()) {
            return Err(ConfigError::DuplicateProfile(profile.name().to_owned()));
        }
        self.profiles.insert(profile.name().to_owned(), profile);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn source(&self, category: &str) -> Option<&Source> {
        self.sources.get(category)
    }

    /// Registered sources, sorted by category.
    pub fn sources(&self) -> Vec<&Source> {
        let mut sources: Vec<_> = self.sources.values().collect();
        sources.sort_by(|a, b| a.category().cmp(b.category()));
        sources
    }

    /// Registered profile names, sorted.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Map `request` onto a target and profile, or `None` if it is not an
    /// asset request this context can serve.
    pub fn resolve(&self, request: &Request) -> Option<ResolvedAsset> {
        let rest = request.path.strip_prefix(self.prefix.as_str())?;

        let mut segments: Vec<&str> = rest.split('/').collect();
        while segments.last().is_some_and(|s| s.is_empty()) {
            segments.pop();
        }

        let (category, id, profile) = match segments.as_slice() {
            [category, id] => (*category, *id, None),
            [category, id, profile] => (*category, *id, Some(*profile)),
            _ => return None,
        };

        let source = self.sources.get(category)?;
        if !source.matches_id(id) {
            return None;
        }

        let profile = profile
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| source.default_profile());
        if !self.profiles.contains_key(profile) || !source.permits(profile) {
            return None;
        }

        let mut target = source.target_for(id, request);
        if target.starts_with('/') {
            target = format!("http://{}{target}", request.host());
        }

        Some(ResolvedAsset {
            target,
            profile: profile.to_owned(),
        })
    }
}

/// `a`, `/a`, `a/` and `/a/` all become `/a/`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}/")
    }
}
