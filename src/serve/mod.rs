//! HTTP server.
//!
//! Binds a `tiny_http` server and dispatches every request to an [`App`] on a
//! rayon thread pool. The binary serves a [`StaticFiles`] app wrapped in
//! [`AssetWarp`](crate::warp::AssetWarp).

mod files;
pub mod lifecycle;

pub use files::{StaticFiles, resolve_path};

use crate::{
    http::{self, App},
    log,
};
use anyhow::Result;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

/// Bind the HTTP server and register it for Ctrl+C shutdown.
pub fn bind_server(interface: IpAddr, port: u16) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind_with_retry(interface, port)?;
    let server = Arc::new(server);
    lifecycle::register_server(Arc::clone(&server));

    log!("serve"; "http://{}", addr);

    Ok(BoundServer { server, addr })
}

impl BoundServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the request loop (blocking until shutdown).
    pub fn run(self, app: Arc<dyn App>, threads: usize) -> Result<()> {
        run_request_loop(&self.server, app, self.addr, threads)
    }
}

fn run_request_loop(
    server: &Server,
    app: Arc<dyn App>,
    addr: SocketAddr,
    threads: usize,
) -> Result<()> {
    // Slow upstream fetches must not block other requests
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()?;

    for request in server.incoming_requests() {
        let app = Arc::clone(&app);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, app.as_ref(), addr) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, app: &dyn App, addr: SocketAddr) -> Result<()> {
    if lifecycle::is_shutdown() {
        return respond_unavailable(request);
    }

    let response = app.call(&to_request(&request, addr));
    respond(request, response)
}

/// Adapt a `tiny_http` request for the application.
fn to_request(request: &Request, addr: SocketAddr) -> http::Request {
    let (path, query) = http::split_uri(request.url());
    let headers = request
        .headers()
        .iter()
        .map(|h| (h.field.as_str().as_str().to_owned(), h.value.as_str().to_owned()))
        .collect();

    http::Request {
        method: request.method().to_string(),
        path,
        query,
        headers,
        server_name: server_name(addr.ip()),
        server_port: addr.port(),
    }
}

fn server_name(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(ip) => ip.to_string(),
        IpAddr::V6(ip) => format!("[{ip}]"),
    }
}

/// Write an application response back to the client.
///
/// `tiny_http` drops the body of `HEAD` responses itself.
fn respond(request: Request, response: http::Response) -> Result<()> {
    let mut out = Response::from_data(response.body).with_status_code(StatusCode(response.status));
    for (name, value) in &response.headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => out.add_header(header),
            Err(()) => log!("serve"; "dropping invalid header `{}`", name),
        }
    }
    request.respond(out)?;
    Ok(())
}

/// Respond with 503 Service Unavailable (server shutting down).
fn respond_unavailable(request: Request) -> Result<()> {
    respond(request, http::Response::text(503, "Service Unavailable"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Read, Write},
        net::{Ipv4Addr, TcpStream},
        thread,
    };

    #[test]
    fn test_server_name() {
        assert_eq!(server_name(IpAddr::V4(Ipv4Addr::LOCALHOST)), "127.0.0.1");
        assert_eq!(server_name("::1".parse().unwrap()), "[::1]");
    }

    #[test]
    fn test_round_trip_through_server() {
        let (server, addr) =
            lifecycle::bind_with_retry(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();

        let app = |req: &http::Request| {
            let body = format!(
                "{} {} {:?} {}:{} {}",
                req.method,
                req.path,
                req.query,
                req.server_name,
                req.server_port,
                req.header("x-probe").unwrap_or("-"),
            );
            http::Response::text(201, &body)
        };

        let handle = thread::spawn(move || {
            let request = server.recv().unwrap();
            handle_request(request, &app, addr).unwrap();
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        write!(
            stream,
            "GET /a/images/1?size=2 HTTP/1.1\r\nHost: localhost\r\nX-Probe: yes\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).unwrap();
        handle.join().unwrap();

        assert!(raw.starts_with("HTTP/1.1 201"));
        assert!(raw.contains("Content-Type: text/plain"));
        let expected = format!(
            "GET /a/images/1 Some(\"size=2\") 127.0.0.1:{} yes",
            addr.port()
        );
        assert!(raw.ends_with(&expected), "unexpected response: {raw}");
    }
}
