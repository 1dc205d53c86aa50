//! Runtime error types.
//!
//! Resolution never fails: an unrecognised request is simply not an asset
//! request. Everything below is raised while serving a resolved asset and is
//! turned into `500 Internal Server Error` by the request handler.

use crate::engine::EngineError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching or transforming an asset.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported content type `{0}`")]
    UnsupportedContentType(String),

    #[error("unsupported output format `{0}`")]
    UnsupportedFormat(String),

    #[error("unsupported target scheme `{0}`, expected http, https or file")]
    UnsupportedScheme(String),

    #[error("invalid asset target `{0}`")]
    InvalidTarget(String),

    #[error("profile `{0}` is not registered")]
    UnknownProfile(String),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
