//! HTTP seam beneath the weather client.
//!
//! The client only needs "GET this URL with these query pairs" and a status,
//! reason and body back. Keeping that behind a trait lets tests count and
//! script requests without a network.

use std::{error::Error as StdError, io, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::trace;

/// Raw provider answer, before any status classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures that happen before a complete response is available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    /// DNS lookup failed or the host could not be reached.
    #[error("host unreachable: {0}")]
    NoConnectivity(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key.
        let err = err.without_url();
        let detail = error_chain(&err);
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() && host_unreachable(&err) {
            TransportError::NoConnectivity(detail)
        } else {
            TransportError::Other(detail)
        }
    }
}

/// Only name resolution and refused or unroutable connections count as
/// being offline; TLS and other connect-phase failures do not.
fn host_unreachable(err: &(dyn StdError + 'static)) -> bool {
    let mut cause = Some(err);
    while let Some(e) = cause {
        let offline = e.downcast_ref::<io::Error>().is_some_and(|io_err| {
            matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::HostUnreachable
                    | io::ErrorKind::NetworkUnreachable
                    | io::ErrorKind::AddrNotAvailable
            )
        });
        if offline {
            return true;
        }
        // hyper-util reports resolver failures as a `ConnectError("dns error")`.
        if e.to_string().starts_with("dns error") {
            return true;
        }
        cause = e.source();
    }
    false
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut detail = err.to_string();
    let mut cause = err.source();
    while let Some(e) = cause {
        let msg = e.to_string();
        if !detail.ends_with(&msg) {
            detail.push_str(": ");
            detail.push_str(&msg);
        }
        cause = e.source();
    }
    detail
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("myweather/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http })
    }

    /// Wrap an already configured client.
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<HttpResponse, TransportError> {
        let res = self.http.get(url).query(query).send().await?;

        let status = res.status();
        // hyper only keeps the status line's phrase when it is not the canonical one.
        let reason = res
            .extensions()
            .get::<hyper::ext::ReasonPhrase>()
            .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
            .or_else(|| status.canonical_reason())
            .map(str::to_owned);

        let body = res.text().await?;
        trace!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(HttpResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn local_transport(timeout: Duration) -> ReqwestTransport {
        let http = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .expect("client");
        ReqwestTransport::with_client(http)
    }

    async fn read_request_head(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.expect("read request");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serves one canned response and returns the request line it saw.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let head = read_request_head(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();
            head.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{addr}/data/2.5/weather"), handle)
    }

    #[tokio::test]
    async fn returns_status_and_body() {
        let (url, server) = serve_once("200 OK", r#"{"ok":true}"#).await;
        let transport = local_transport(Duration::from_secs(5));

        let res = transport
            .get(&url, &[("q", "London".into()), ("units", "metric".into())])
            .await
            .unwrap();

        assert_eq!(res.status, 200);
        assert!(res.is_success());
        assert_eq!(res.reason.as_deref(), Some("OK"));
        assert_eq!(res.body, r#"{"ok":true}"#);

        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /data/2.5/weather?q=London&units=metric "));
    }

    #[tokio::test]
    async fn non_success_status_is_not_a_transport_error() {
        let (url, server) = serve_once("404 Not Found", r#"{"cod":"404"}"#).await;
        let transport = local_transport(Duration::from_secs(5));

        let res = transport.get(&url, &[]).await.unwrap();
        assert_eq!(res.status, 404);
        assert!(!res.is_success());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn keeps_server_reason_phrase() {
        let (url, server) = serve_once("503 Down For Maintenance", "{}").await;
        let transport = local_transport(Duration::from_secs(5));

        let res = transport.get(&url, &[]).await.unwrap();
        assert_eq!(res.status, 503);
        assert_eq!(res.reason.as_deref(), Some("Down For Maintenance"));
        server.await.unwrap();

        let kind = crate::ErrorKind::from_status(res.status, res.reason.as_deref());
        assert_eq!(kind.to_string(), "Failed to fetch weather: Down For Maintenance");
    }

    #[tokio::test]
    async fn tls_failure_is_not_no_connectivity() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Answers in plaintext without waiting for the TLS handshake.
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let response = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}";
            socket.write_all(response.as_bytes()).await.ok();
            let mut sink = [0u8; 1024];
            let _ = socket.read(&mut sink).await;
        });

        let url = format!("https://{addr}/weather");
        let transport = local_transport(Duration::from_secs(5));

        let err = transport.get(&url, &[]).await.unwrap_err();
        assert!(matches!(err, TransportError::Other(_)), "got {err:?}");
        server.abort();
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(3)).await;
            drop(socket);
        });

        let transport = local_transport(Duration::from_millis(200));
        let err = transport
            .get(&format!("http://{addr}/weather"), &[])
            .await
            .unwrap_err();

        assert_eq!(err, TransportError::Timeout);
        server.abort();
    }

    #[tokio::test]
    async fn refused_connection_is_no_connectivity() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = local_transport(Duration::from_secs(5));
        let err = transport
            .get(&format!("http://{addr}/weather"), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::NoConnectivity(_)), "got {err:?}");
    }
}
