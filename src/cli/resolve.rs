//! Resolve command implementation.
//!
//! Runs a request path through the configured context without fetching
//! anything.

use crate::{config::WarpConfig, context::Context, http::Request};
use anyhow::Result;

/// Print the resolved target and profile, or `no match`.
pub fn run_resolve(path: &str, host: &str, config: &WarpConfig) -> Result<()> {
    let context = config.build_context()?;
    println!("{}", describe(&context, path, host));
    Ok(())
}

fn describe(context: &Context, path: &str, host: &str) -> String {
    let request = Request::get(path).with_host(host);
    match context.resolve(&request) {
        Some(asset) => format!("{} ({})", asset.target, asset.profile),
        None => "no match".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_describe() {
        let config = test_parse_config(
            r#"
[[source]]
category = "media"
target = "/files/:id"
id = "any"
"#,
        );
        let context = config.build_context().unwrap();

        assert_eq!(
            describe(&context, "/a/media/cat.png", "example.com:8080"),
            "http://example.com:8080/files/cat.png (original)"
        );
        assert_eq!(describe(&context, "/a/other/1", "example.com"), "no match");
        assert_eq!(describe(&context, "/a/media/cat.png/thumb", "example.com"), "no match");
    }
}
