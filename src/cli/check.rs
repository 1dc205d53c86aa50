//! Check command implementation.

use crate::{
    config::WarpConfig,
    context::{Context, Target},
    log,
};
use anyhow::Result;

/// Build the context from a validated config and list what it serves.
pub fn run_check(config: &WarpConfig) -> Result<()> {
    let context = config.build_context()?;
    for line in summary(&context) {
        log!("check"; "{}", line);
    }
    log!("check"; "{} is valid", config.config_path.display());
    Ok(())
}

fn summary(context: &Context) -> Vec<String> {
    let mut lines = vec![format!("prefix {}", context.prefix())];

    for source in context.sources() {
        let target = match source.target() {
            Target::Template(template) => template.as_str(),
            Target::Function(_) => "<computed>",
        };
        lines.push(format!(
            "source {}{}/:id -> {} (id {}, default {})",
            context.prefix(),
            source.category(),
            target,
            source.id_rule(),
            source.default_profile(),
        ));
    }

    for name in context.profile_names() {
        let restrictions = context
            .profile(name)
            .map(|profile| {
                let mut types: Vec<&str> =
                    profile.restrictions().iter().map(String::as_str).collect();
                types.sort_unstable();
                types.join(", ")
            })
            .unwrap_or_default();

        if restrictions.is_empty() {
            lines.push(format!("profile {name}"));
        } else {
            lines.push(format!("profile {name} [{restrictions}]"));
        }
    }

    lines
}
