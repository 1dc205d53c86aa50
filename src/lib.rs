//! AssetWarp - on-the-fly asset resolution and transformation.
//!
//! Requests of the form `/<prefix>/<category>/<id>[/<profile>]` are resolved
//! against registered sources, fetched, run through a profile and served.
//! Every other request goes to the wrapped application.
//!
//! ```ignore
//! let mut context = Context::default();
//! context.register_source("images", Target::template("http://cdn.example/:id.jpg"), SourceOptions::default())?;
//! context.register_image_profile("thumb", |blob| blob.crop_resize(100, 100, Gravity::Center))?;
//!
//! let app = AssetWarp::new(StaticFiles::new("public"), Arc::new(context));
//! serve::bind_server(interface, port)?.run(Arc::new(app), 4)?;
//! ```

pub mod blob;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod http;
pub mod logger;
pub mod mime;
pub mod profile;
pub mod serve;
pub mod utils;
pub mod warp;

pub use blob::Blob;
pub use context::{Context, ResolvedAsset, SourceOptions, Target};
pub use engine::{Gravity, ImageEngine};
pub use error::{Error, Result};
pub use http::{App, Request, Response};
pub use profile::{Profile, Restriction};
pub use warp::AssetWarp;
