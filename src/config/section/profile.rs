//! `[profile.<name>]` tables.
//!
//! # Example
//!
//! ```toml
//! [profile.thumb]
//! restrict = ["web_safe_image"]     # class names or content types; empty = any
//! steps = [{ op = "crop_resize", width = 100, height = 100 }]
//! ```

use crate::{
    config::{ConfigDiagnostics, ConfigError, FieldPath},
    mime,
    profile::{ORIGINAL, Profile, Restriction, Step},
};
use serde::{Deserialize, Serialize};

/// A profile declared in config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub restrict: Vec<String>,
    pub steps: Vec<Step>,
}

impl ProfileConfig {
    pub fn validate(&self, name: &str, diag: &mut ConfigDiagnostics) {
        if name == ORIGINAL {
            diag.error(
                FieldPath::new(format!("profile.{name}")),
                "`original` is built in and cannot be redefined",
            );
        }

        for value in &self.restrict {
            if Restriction::parse(value).is_none() {
                diag.error_with_hint(
                    FieldPath::profile(name, "restrict"),
                    format!("unknown content class `{value}`"),
                    "use `web_safe_image`, `pdf` or a content type such as `image/png`",
                );
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            let field = || FieldPath::new(format!("profile.{name}.steps[{i}]"));
            match step {
                Step::Reduce { width: 0, height: 0 }
                | Step::ReduceExact { width: 0, height: 0 }
                | Step::Resize { width: 0, height: 0 }
                | Step::ResizeExact { width: 0, height: 0 } => diag.error_with_hint(
                    field(),
                    "width and height are both zero",
                    "set one side to 0 to derive it from the aspect ratio, not both",
                ),
                Step::Crop { width, height, .. } | Step::CropResize { width, height, .. }
                    if *width == 0 || *height == 0 =>
                {
                    diag.error(field(), "crop width and height must be positive");
                }
                _ => {}
            }

            if let Some(format) = step.target_format()
                && mime::content_type_for_format(format).is_none()
            {
                diag.error_with_hint(
                    FieldPath::new(format!("profile.{name}.steps[{i}].format")),
                    format!("unsupported format `{format}`"),
                    "supported formats: jpg, gif, png, pdf",
                );
            }
        }
    }

    pub fn restrictions(&self) -> Result<Vec<Restriction>, ConfigError> {
        self.restrict
            .iter()
            .map(|value| {
                Restriction::parse(value)
                    .ok_or_else(|| ConfigError::UnknownContentClass(value.clone()))
            })
            .collect()
    }

    pub fn build(&self, name: &str) -> Result<Profile, ConfigError> {
        Ok(Profile::from_steps(
            name,
            &self.restrictions()?,
            self.steps.clone(),
        ))
    }
}
