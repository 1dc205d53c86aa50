//! Static file application wrapped by the asset handler.

use crate::{
    http::{App, Request, Response},
    mime,
};
use percent_encoding::percent_decode_str;
use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
};

/// Serves files under a root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl App for StaticFiles {
    fn call(&self, request: &Request) -> Response {
        if !matches!(request.method.as_str(), "GET" | "HEAD") {
            return Response::text(405, "Method Not Allowed");
        }
        let Some(path) = resolve_path(&request.path, &self.root) else {
            return Response::not_found();
        };
        match fs::read(&path) {
            Ok(body) => Response::ok(mime::from_path(&path), body),
            Err(e) => {
                crate::log!("serve"; "failed to read {}: {}", path.display(), e);
                Response::internal_error()
            }
        }
    }
}

/// Resolve URL to filesystem path, handling index.html for directories
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    if clean.contains("..") {
        return None;
    }

    // Canonicalize so symlinks cannot escape serve_root
    let canonical = serve_root.join(&clean).canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Decode, strip the query string, trim slashes.
fn normalize_url(url: &str) -> String {
    let decoded = percent_decode_str(url)
        .decode_utf8()
        .map(Cow::into_owned)
        .unwrap_or_default();

    let path = decoded.split('?').next().unwrap_or(&decoded);
    path.trim_matches('/').to_string()
}
