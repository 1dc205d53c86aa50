//! Named transformation recipes.
//!
//! A [`Profile`] couples a mutation over a [`Blob`] with the set of content
//! types it accepts. An empty set accepts anything.
//!
//! ```ignore
//! let thumb = Profile::new(
//!     "thumb",
//!     &[Restriction::Class(ContentClass::WebSafeImage)],
//!     |blob: &mut Blob| blob.crop_resize(100, 100, Gravity::Center),
//! );
//! ```

pub mod step;

pub use step::Step;

use crate::{blob::Blob, error::Result, mime::ContentClass};
use rustc_hash::FxHashSet;
use std::{fmt, sync::Arc};

/// Name of the profile every context registers.
pub const ORIGINAL: &str = "original";

/// A transformation applied to a blob in place.
pub type Mutation = Arc<dyn Fn(&mut Blob) -> Result<()> + Send + Sync>;

/// Content types a profile accepts, as written at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    /// A literal content type such as `image/png`.
    ContentType(String),
    /// Every content type in a named class.
    Class(ContentClass),
}

impl Restriction {
    /// Parse a config value: a class name, else a literal content type.
    ///
    /// Returns `None` for bare words that are neither.
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(class) = ContentClass::from_name(value) {
            return Some(Self::Class(class));
        }
        value
            .contains('/')
            .then(|| Self::ContentType(crate::mime::essence(value)))
    }

    fn expand(&self, into: &mut FxHashSet<String>) {
        match self {
            Self::ContentType(ct) => {
                into.insert(ct.clone());
            }
            Self::Class(class) => into.extend(class.content_types().into_iter().map(String::from)),
        }
    }
}

impl From<ContentClass> for Restriction {
    fn from(class: ContentClass) -> Self {
        Self::Class(class)
    }
}

/// A named recipe of blob mutations.
#[derive(Clone)]
pub struct Profile {
    name: String,
    restrictions: FxHashSet<String>,
    mutation: Option<Mutation>,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("restrictions", &self.restrictions)
            .field("mutation", &self.mutation.is_some())
            .finish()
    }
}

impl Profile {
    /// Build a profile, expanding content classes into their content types.
    pub fn new<F>(name: impl Into<String>, restrictions: &[Restriction], mutation: F) -> Self
    where
        F: Fn(&mut Blob) -> Result<()> + Send + Sync + 'static,
    {
        Self::with_mutation(name, restrictions, Some(Arc::new(mutation)))
    }

    /// A profile that accepts anything and changes nothing.
    pub fn identity(name: impl Into<String>) -> Self {
        Self::with_mutation(name, &[], None)
    }

    /// A profile applying `steps` in order.
    pub fn from_steps(name: impl Into<String>, restrictions: &[Restriction], steps: Vec<Step>) -> Self {
        if steps.is_empty() {
            return Self::with_mutation(name, restrictions, None);
        }
        Self::new(name, restrictions, move |blob: &mut Blob| {
            steps.iter().try_for_each(|step| step.apply(blob))
        })
    }

    pub(crate) fn with_mutation(
        name: impl Into<String>,
        restrictions: &[Restriction],
        mutation: Option<Mutation>,
    ) -> Self {
        let mut expanded = FxHashSet::default();
        for restriction in restrictions {
            restriction.expand(&mut expanded);
        }
        Self {
            name: name.into(),
            restrictions: expanded,
            mutation,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expanded content types; empty means unrestricted.
    pub fn restrictions(&self) -> &FxHashSet<String> {
        &self.restrictions
    }

    /// Whether this profile accepts `content_type`.
    pub fn applicable(&self, content_type: &str) -> bool {
        self.restrictions.is_empty() || self.restrictions.contains(content_type)
    }

    /// Run the mutation on `blob`.
    ///
    /// Returns `Ok(false)` without touching the blob when the profile does not
    /// accept its content type.
    pub fn apply(&self, blob: &mut Blob) -> Result<bool> {
        if !self.applicable(blob.content_type()) {
            return Ok(false);
        }
        if let Some(mutation) = &self.mutation {
            mutation(blob)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::tests::{RecordingEngine, png, raster};
    use crate::engine::Operation;
    use crate::error::Error;

    fn image_profile() -> Profile {
        Profile::new(
            "thumb",
            &[Restriction::Class(ContentClass::WebSafeImage)],
            |blob: &mut Blob| blob.reduce(10, 10),
        )
    }

    #[test]
    fn test_restrictions_expand_classes() {
        let profile = image_profile();
        assert_eq!(profile.restrictions().len(), 4);
        assert!(profile.applicable("image/pjpeg"));
        assert!(profile.applicable("image/png"));
        assert!(!profile.applicable("application/pdf"));
    }

    #[test]
    fn test_mixed_restrictions() {
        let profile = Profile::identity("x");
        assert!(profile.applicable("anything/at-all"));

        let profile = Profile::with_mutation(
            "docs",
            &[
                Restriction::Class(ContentClass::Pdf),
                Restriction::ContentType("image/png".into()),
            ],
            None,
        );
        assert!(profile.applicable("application/pdf"));
        assert!(profile.applicable("image/png"));
        assert!(!profile.applicable("image/gif"));
    }

    #[test]
    fn test_restriction_parse() {
        assert_eq!(
            Restriction::parse("web_safe_image"),
            Some(Restriction::Class(ContentClass::WebSafeImage))
        );
        assert_eq!(
            Restriction::parse("Image/PNG"),
            Some(Restriction::ContentType("image/png".into()))
        );
        assert_eq!(Restriction::parse("video"), None);
    }

    #[test]
    fn test_apply_rejects_without_side_effects() {
        let engine = std::sync::Arc::new(RecordingEngine::default());
        let mut blob = Blob::new(b"%PDF".to_vec(), "application/pdf", engine.clone());

        assert!(!image_profile().apply(&mut blob).unwrap());
        assert!(!blob.is_decoded());
        assert!(engine.decoded.lock().unwrap().is_empty());
        assert_eq!(blob.data().unwrap().as_ref(), b"%PDF");
    }

    #[test]
    fn test_identity_keeps_bytes() {
        let bytes = png(8, 8);
        let mut blob = Blob::new(bytes.clone(), "image/png", raster());
        assert!(Profile::identity(ORIGINAL).apply(&mut blob).unwrap());
        assert_eq!(blob.into_data().unwrap(), bytes);
    }

    #[test]
    fn test_mutation_error_propagates() {
        let profile = Profile::new("broken", &[], |blob: &mut Blob| blob.set_format("bmp"));
        let mut blob = Blob::new(png(2, 2), "image/png", raster());
        assert!(matches!(profile.apply(&mut blob), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_from_steps_runs_in_order() {
        let engine = std::sync::Arc::new(RecordingEngine::default());
        let profile = Profile::from_steps(
            "steps",
            &[],
            vec![
                Step::Format {
                    format: "png".into(),
                },
                Step::Negate,
            ],
        );
        let mut blob = Blob::new(b"gif".to_vec(), "image/gif", engine.clone());
        assert!(profile.apply(&mut blob).unwrap());
        assert_eq!(blob.content_type(), "image/png");
        assert_eq!(
            *engine.ops.lock().unwrap(),
            vec![Operation::Format("png".into()), Operation::Negate]
        );
    }
}
