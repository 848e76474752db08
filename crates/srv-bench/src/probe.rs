//! Layered readiness probe
//!
//! Step 1 is a plain HTTP GET against the candidate's root path. Only a
//! transport-level failure falls through to step 2, a raw TCP connect: a
//! candidate can be slow to bring up HTTP routing while its listener
//! already accepts connections, and the load generator only needs a
//! reachable socket. An unexpected root status is logged but still counts
//! as ready, so a responding server is never discarded over a route
//! mismatch.

use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{Request, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use srv_bench_common::Endpoint;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Verdict of one layered readiness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// HTTP responded; the status is carried for diagnostics
    Ready { status: u16 },
    /// HTTP failed at the transport level but the socket accepts connects
    ReachableNotHttp { error: String },
    /// Neither check succeeded within its budget
    Unreachable { error: String },
}

impl ProbeVerdict {
    /// A reachable candidate proceeds to the benchmark phase.
    pub fn is_reachable(&self) -> bool {
        !matches!(self, Self::Unreachable { .. })
    }
}

/// Run the layered probe against a candidate endpoint.
pub async fn probe(
    endpoint: &Endpoint,
    http_timeout: Duration,
    socket_timeout: Duration,
) -> ProbeVerdict {
    let http_error = match http_get_root(endpoint, http_timeout).await {
        Ok(status) => {
            if (200..400).contains(&status) {
                debug!(endpoint = %endpoint.url(), status, "probe: candidate ready");
            } else {
                warn!(
                    endpoint = %endpoint.url(),
                    status,
                    "probe: unexpected root status, proceeding to benchmark anyway"
                );
            }
            return ProbeVerdict::Ready { status };
        }
        Err(error) => error,
    };

    debug!(
        endpoint = %endpoint.url(),
        error = %http_error,
        "probe: HTTP check failed, falling back to raw socket connect"
    );

    match timeout(socket_timeout, TcpStream::connect(endpoint.addr())).await {
        Ok(Ok(_)) => ProbeVerdict::ReachableNotHttp { error: http_error },
        Ok(Err(e)) => ProbeVerdict::Unreachable {
            error: format!("http: {http_error}; connect: {e}"),
        },
        Err(_) => ProbeVerdict::Unreachable {
            error: format!(
                "http: {http_error}; connect timed out after {}ms",
                socket_timeout.as_millis()
            ),
        },
    }
}

/// Issue a GET against the root path, draining the body fully so the
/// connection is never left dangling mid-read.
async fn http_get_root(endpoint: &Endpoint, http_timeout: Duration) -> Result<u16, String> {
    let uri: Uri = endpoint
        .url()
        .parse()
        .map_err(|e| format!("invalid endpoint url: {e}"))?;

    let client = Client::builder(TokioExecutor::new()).build_http();
    let request = Request::builder()
        .uri(uri)
        .header(hyper::header::USER_AGENT, "srv-bench/0.1")
        .body(Empty::<Bytes>::new())
        .map_err(|e| format!("failed to build request: {e}"))?;

    let response = match timeout(http_timeout, client.request(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return Err(format!("request failed: {e}")),
        Err(_) => {
            return Err(format!(
                "request timed out after {}ms",
                http_timeout.as_millis()
            ));
        }
    };

    let status = response.status().as_u16();
    if let Err(e) = response.into_body().collect().await {
        debug!(endpoint = %endpoint.url(), error = %e, "probe: error draining response body");
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const HTTP_TIMEOUT: Duration = Duration::from_secs(2);
    const SOCKET_TIMEOUT: Duration = Duration::from_secs(1);

    fn endpoint(port: u16) -> Endpoint {
        Endpoint {
            host: "127.0.0.1".to_string(),
            port,
        }
    }

    /// Serve a fixed HTTP status on every connection.
    async fn spawn_http_server(status_line: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf).await;
                    let body = "ok";
                    let response = format!(
                        "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                });
            }
        });
        port
    }

    /// Accept connections but hang up before speaking HTTP.
    async fn spawn_tcp_only_server() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                drop(stream);
            }
        });
        port
    }

    async fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_ready_on_200() {
        let port = spawn_http_server("200 OK").await;
        let verdict = probe(&endpoint(port), HTTP_TIMEOUT, SOCKET_TIMEOUT).await;
        assert_eq!(verdict, ProbeVerdict::Ready { status: 200 });
        assert!(verdict.is_reachable());
    }

    #[tokio::test]
    async fn test_unexpected_status_still_ready() {
        let port = spawn_http_server("500 Internal Server Error").await;
        let verdict = probe(&endpoint(port), HTTP_TIMEOUT, SOCKET_TIMEOUT).await;
        assert_eq!(verdict, ProbeVerdict::Ready { status: 500 });
        assert!(verdict.is_reachable());
    }

    #[tokio::test]
    async fn test_fallback_to_socket_connect() {
        let port = spawn_tcp_only_server().await;
        let verdict = probe(&endpoint(port), HTTP_TIMEOUT, SOCKET_TIMEOUT).await;
        match verdict {
            ProbeVerdict::ReachableNotHttp { ref error } => {
                assert!(!error.is_empty());
            }
            other => panic!("expected ReachableNotHttp, got {other:?}"),
        }
        assert!(verdict.is_reachable());
    }

    #[tokio::test]
    async fn test_unreachable_when_nothing_listens() {
        let port = free_port().await;
        let verdict = probe(&endpoint(port), HTTP_TIMEOUT, SOCKET_TIMEOUT).await;
        match verdict {
            ProbeVerdict::Unreachable { ref error } => {
                assert!(error.contains("http:"));
            }
            other => panic!("expected Unreachable, got {other:?}"),
        }
        assert!(!verdict.is_reachable());
    }
}
