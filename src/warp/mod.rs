//! Request handler.
//!
//! [`AssetWarp`] wraps an application. Requests its [`Context`] resolves are
//! served as transformed assets; everything else goes straight to the wrapped
//! application.
//!
//! # Response mapping
//!
//! | Outcome                          | Response                         |
//! |----------------------------------|----------------------------------|
//! | not an asset request             | whatever the wrapped app returns |
//! | same-origin fetch not `200`      | that response, unchanged         |
//! | outbound fetch failed            | `502 Bad Gateway`                |
//! | profile rejects the content type | `404 Not Found`                  |
//! | any other error                  | `500 Internal Server Error`      |
//! | success                          | `200` with the transformed bytes |

pub mod fetch;

pub use fetch::{Content, FetchOptions, Fetched, Fetcher};

use crate::{
    blob::Blob,
    context::{Context, ResolvedAsset},
    debug,
    engine::{ImageEngine, MagickEngine},
    error::{Error, Result},
    http::{App, Request, Response},
    log,
};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

/// Asset-serving wrapper around an application.
pub struct AssetWarp<A: App> {
    inner: A,
    context: Arc<Context>,
    engine: Arc<dyn ImageEngine>,
    fetcher: Fetcher,
}

impl<A: App> AssetWarp<A> {
    /// Wrap `inner`, transforming images with ImageMagick.
    pub fn new(inner: A, context: Arc<Context>) -> Self {
        Self {
            inner,
            context,
            engine: Arc::new(MagickEngine::default()),
            fetcher: Fetcher::default(),
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn ImageEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    fn serve_asset(&self, request: &Request, asset: &ResolvedAsset) -> Result<Response> {
        let profile = self
            .context
            .profile(&asset.profile)
            .ok_or_else(|| Error::UnknownProfile(asset.profile.clone()))?;

        let content = match self.fetcher.fetch(&asset.target, request, &self.inner)? {
            Fetched::Content(content) => content,
            Fetched::Respond(response) => return Ok(response),
        };

        let mut blob = Blob::new(content.data, &content.content_type, Arc::clone(&self.engine));
        if !profile.apply(&mut blob)? {
            debug!("warp"; "{} rejects {}", asset.profile, blob.content_type());
            return Ok(Response::not_found());
        }

        let content_type = blob.content_type().to_owned();
        Ok(Response::ok(&content_type, blob.into_data()?))
    }
}

impl<A: App> App for AssetWarp<A> {
    fn call(&self, request: &Request) -> Response {
        let Some(asset) = self.context.resolve(request) else {
            return self.inner.call(request);
        };
        debug!("warp"; "{} -> {} ({})", request.path, asset.target, asset.profile);

        match panic::catch_unwind(AssertUnwindSafe(|| self.serve_asset(request, &asset))) {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                log!("error"; "{}: {:#}", request.path, anyhow::Error::new(err));
                Response::internal_error()
            }
            Err(_) => {
                log!("error"; "{}: panicked while serving {}", request.path, asset.target);
                Response::internal_error()
            }
        }
    }
}
