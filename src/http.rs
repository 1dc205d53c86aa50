//! Minimal HTTP request/response model shared by the handler and the server.
//!
//! The server adapts `tiny_http` requests into [`Request`], passes them to an
//! [`App`], and writes the returned [`Response`] back.

use crate::mime::types;

/// An inbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Raw path, without the query string.
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Address the server is listening on.
    pub server_name: String,
    pub server_port: u16,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: "GET".into(),
            path: "/".into(),
            query: None,
            headers: Vec::new(),
            server_name: "localhost".into(),
            server_port: 80,
        }
    }
}

impl Request {
    /// A GET request for `uri` (`/path?query`).
    pub fn get(uri: &str) -> Self {
        let (path, query) = split_uri(uri);
        Self {
            path,
            query,
            ..Self::default()
        }
    }

    /// Set the `Host` header.
    pub fn with_host(mut self, host: &str) -> Self {
        self.headers.retain(|(name, _)| !name.eq_ignore_ascii_case("host"));
        self.headers.push(("Host".into(), host.into()));
        self
    }

    /// Set the address the request arrived on.
    pub fn with_server(mut self, name: &str, port: u16) -> Self {
        self.server_name = name.into();
        self.server_port = port;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `Host` header, falling back to the server address.
    pub fn host(&self) -> String {
        match self.header("host") {
            Some(host) if !host.is_empty() => host.to_owned(),
            _ => format!("{}:{}", self.server_name, self.server_port),
        }
    }

    /// Host name and port this request was addressed to.
    ///
    /// The port defaults to the server port when `Host` carries none.
    pub fn authority(&self) -> (String, u16) {
        split_authority(&self.host(), self.server_port)
    }

    /// Path plus query string.
    pub fn uri(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{query}", self.path),
            None => self.path.clone(),
        }
    }

    /// A copy of this request addressed to another path and query.
    pub fn with_path_and_query(&self, path: &str, query: Option<&str>) -> Self {
        Self {
            path: path.to_owned(),
            query: query.map(str::to_owned),
            ..self.clone()
        }
    }
}

/// Split `host[:port]`, lowercasing the host. IPv6 hosts keep their brackets.
pub(crate) fn split_authority(authority: &str, default_port: u16) -> (String, u16) {
    if let Some((host, port)) = authority.rsplit_once(':')
        && !port.is_empty()
        && port.bytes().all(|b| b.is_ascii_digit())
        && let Ok(port) = port.parse()
    {
        return (host.to_ascii_lowercase(), port);
    }
    (authority.to_ascii_lowercase(), default_port)
}

/// Split `/path?query` into its parts.
pub(crate) fn split_uri(uri: &str) -> (String, Option<String>) {
    match uri.split_once('?') {
        Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
        None => (uri.to_owned(), None),
    }
}

// ============================================================================
// Response
// ============================================================================

/// An HTTP response: status, headers and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// A plain text response.
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".into(), types::PLAIN.into())],
            body: body.as_bytes().to_vec(),
        }
    }

    /// `200 OK` with a body of the given content type.
    pub fn ok(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: vec![
                ("Content-Type".into(), content_type.into()),
                ("Content-Length".into(), body.len().to_string()),
            ],
            body,
        }
    }

    pub fn not_found() -> Self {
        Self::text(404, "Not Found")
    }

    pub fn bad_gateway() -> Self {
        Self::text(502, "Bad Gateway")
    }

    pub fn internal_error() -> Self {
        Self::text(500, "Internal Server Error")
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

// ============================================================================
// App
// ============================================================================

/// Anything that turns a request into a response.
///
/// Implemented for closures, so tests and embedders can wrap plain functions:
///
/// ```ignore
/// let app = |req: &Request| Response::text(200, &req.path);
/// ```
pub trait App: Send + Sync {
    fn call(&self, request: &Request) -> Response;
}

impl<F> App for F
where
    F: Fn(&Request) -> Response + Send + Sync,
{
    fn call(&self, request: &Request) -> Response {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_splits_query() {
        let req = Request::get("/a/images/1?size=2");
        assert_eq!(req.path, "/a/images/1");
        assert_eq!(req.query.as_deref(), Some("size=2"));
        assert_eq!(req.uri(), "/a/images/1?size=2");

        let req = Request::get("/plain");
        assert_eq!(req.query, None);
        assert_eq!(req.uri(), "/plain");
    }

    #[test]
    fn test_host_falls_back_to_server() {
        let req = Request::get("/").with_server("127.0.0.1", 5290);
        assert_eq!(req.host(), "127.0.0.1:5290");

        let req = req.with_host("example.com");
        assert_eq!(req.host(), "example.com");
        assert_eq!(req.header("HOST"), Some("example.com"));
    }

    #[test]
    fn test_authority() {
        let req = Request::get("/").with_server("0.0.0.0", 5290);
        assert_eq!(req.clone().with_host("Example.com:8080").authority(), ("example.com".into(), 8080));
        assert_eq!(req.clone().with_host("example.com").authority(), ("example.com".into(), 5290));
        assert_eq!(req.clone().with_host("[::1]:80").authority(), ("[::1]".into(), 80));
        assert_eq!(req.authority(), ("0.0.0.0".into(), 5290));
    }

    #[test]
    fn test_split_authority() {
        assert_eq!(split_authority("cdn.local:8080", 80), ("cdn.local".into(), 8080));
        assert_eq!(split_authority("CDN.local", 443), ("cdn.local".into(), 443));
        assert_eq!(split_authority("[::1]:5290", 80), ("[::1]".into(), 5290));
        assert_eq!(split_authority("[::1]", 80), ("[::1]".into(), 80));
        assert_eq!(split_authority("host:99999", 80), ("host:99999".into(), 80));
    }

    #[test]
    fn test_with_path_and_query_keeps_headers() {
        let req = Request::get("/a/x/1?q").with_host("h:1");
        let rewritten = req.with_path_and_query("/uploads/1.png", None);
        assert_eq!(rewritten.path, "/uploads/1.png");
        assert_eq!(rewritten.query, None);
        assert_eq!(rewritten.host(), "h:1");
    }

    #[test]
    fn test_response_helpers() {
        let res = Response::ok("image/png", vec![1, 2, 3]);
        assert_eq!(res.status, 200);
        assert_eq!(res.content_type(), Some("image/png"));
        assert_eq!(res.header("content-length"), Some("3"));

        let res = Response::bad_gateway();
        assert_eq!(res.status, 502);
        assert_eq!(res.content_type(), Some("text/plain"));
        assert_eq!(res.body, b"Bad Gateway");
    }

    #[test]
    fn test_closure_is_app() {
        let app = |req: &Request| Response::text(200, &req.path);
        assert_eq!(App::call(&app, &Request::get("/hello")).body, b"/hello");
    }
}
