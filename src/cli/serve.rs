//! Serve command implementation.

use crate::{
    config::WarpConfig,
    debug, log,
    serve::{self, StaticFiles},
    warp::{AssetWarp, Fetcher},
};
use anyhow::{Context as _, Result};
use std::sync::Arc;

/// Serve the static root wrapped in the asset handler until Ctrl+C.
pub fn serve_site(config: &WarpConfig) -> Result<()> {
    let context = config
        .build_context()
        .context("failed to build asset context")?;

    let root = config.serve_root();
    if !root.is_dir() {
        log!("warning"; "static root {} does not exist", root.display());
    }
    debug!("serve"; "static root: {}", root.display());

    let app = AssetWarp::new(StaticFiles::new(root), Arc::new(context))
        .with_engine(config.build_engine())
        .with_fetcher(Fetcher::new(config.fetch_options()));

    let server = serve::bind_server(config.serve.interface, config.serve.port)?;
    server.run(Arc::new(app), config.serve.threads)?;

    log!("serve"; "stopped");
    Ok(())
}
