//! Content retrieval for resolved targets.
//!
//! | Target                       | Retrieval                                   |
//! |------------------------------|---------------------------------------------|
//! | `http(s)://` same origin     | in-process call to the wrapped app          |
//! | `http(s)://` elsewhere       | outbound GET                                |
//! | `file://`                    | read from disk                              |
//!
//! Any other scheme is an error.

use crate::{
    error::{Error, Result},
    http::{App, Request, Response, split_authority},
    log,
    mime::{self, types},
};
use std::{fmt, fs, time::Duration};
use ureq::{
    Agent,
    tls::{RootCerts, TlsConfig, TlsProvider},
};
use url::Url;

/// Default timeout for outbound requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default response body limit for outbound requests (50 MB).
pub const DEFAULT_MAX_BODY: u64 = 50 * 1024 * 1024;

/// Fetched bytes and their content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Outcome of a fetch.
#[derive(Debug)]
pub enum Fetched {
    Content(Content),
    /// Respond with this instead of transforming anything: a non-200
    /// pass-through response, or `502` after a failed outbound request.
    Respond(Response),
}

/// Outbound request settings.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_body: u64,
    /// Extra `host[:port]` authorities served by the wrapped app.
    pub same_origin: Vec<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_body: DEFAULT_MAX_BODY,
            same_origin: Vec::new(),
        }
    }
}

/// Retrieves asset bytes for a resolved target.
pub struct Fetcher {
    agent: Agent,
    options: FetchOptions,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(FetchOptions::default())
    }
}

impl Fetcher {
    pub fn new(options: FetchOptions) -> Self {
        let tls_config = TlsConfig::builder()
            .provider(TlsProvider::NativeTls)
            .root_certs(RootCerts::PlatformVerifier)
            .build();

        let agent = Agent::config_builder()
            .tls_config(tls_config)
            .timeout_global(Some(options.timeout))
            .max_redirects(0)
            .build()
            .into();

        Self { agent, options }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Retrieve `target` on behalf of `request`.
    ///
    /// `inner` serves same-origin targets without a network round trip.
    pub fn fetch(&self, target: &str, request: &Request, inner: &dyn App) -> Result<Fetched> {
        let url = Url::parse(target).map_err(|_| Error::InvalidTarget(target.to_owned()))?;

        match url.scheme() {
            "http" | "https" if self.is_same_origin(&url, request) => {
                Ok(pass_through(&url, request, inner))
            }
            "http" | "https" => Ok(self.get(&url)),
            "file" => read_file(&url).map(Fetched::Content),
            scheme => Err(Error::UnsupportedScheme(scheme.to_owned())),
        }
    }

    /// Whether `url` points at the server handling `request`.
    pub fn is_same_origin(&self, url: &Url, request: &Request) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let port = url.port_or_known_default().unwrap_or(80);

        if request.authority() == (host.clone(), port) {
            return true;
        }
        self.options
            .same_origin
            .iter()
            .any(|alias| split_authority(alias, port) == (host.clone(), port))
    }

    fn get(&self, url: &Url) -> Fetched {
        let mut response = match self.agent.get(url.as_str()).call() {
            Ok(response) => response,
            Err(err) => {
                log!("fetch"; "GET {url} failed: {err}");
                return Fetched::Respond(Response::bad_gateway());
            }
        };

        // Redirects are not followed; anything but 2xx is an upstream failure
        if !response.status().is_success() {
            log!("fetch"; "GET {url} returned {}", response.status());
            return Fetched::Respond(Response::bad_gateway());
        }

        let content_type = response
            .headers()
            .get(ureq::http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(types::OCTET_STREAM)
            .to_owned();

        match response
            .body_mut()
            .with_config()
            .limit(self.options.max_body)
            .read_to_vec()
        {
            Ok(data) => Fetched::Content(Content { data, content_type }),
            Err(err) => {
                log!("fetch"; "reading {url} failed: {err}");
                Fetched::Respond(Response::bad_gateway())
            }
        }
    }
}

/// Serve a same-origin target through the wrapped app.
fn pass_through(url: &Url, request: &Request, inner: &dyn App) -> Fetched {
    let response = inner.call(&request.with_path_and_query(url.path(), url.query()));
    if response.status != 200 {
        return Fetched::Respond(response);
    }

    let content_type = response
        .content_type()
        .unwrap_or(types::OCTET_STREAM)
        .to_owned();
    Fetched::Content(Content {
        data: response.body,
        content_type,
    })
}

fn read_file(url: &Url) -> Result<Content> {
    let path = url
        .to_file_path()
        .map_err(|()| Error::InvalidTarget(url.to_string()))?;
    let data = fs::read(&path).map_err(|err| Error::Io(path.clone(), err))?;
    Ok(Content {
        data,
        content_type: mime::from_path(&path).to_owned(),
    })
}
