//! Single-message HTTP delivery.

use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http_body_util::Full;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use rsvgrid_coord::{Peer, PeerMessage};

use crate::error::NotifyError;

/// Pooled HTTP/1 client shared by all workers.
pub type PeerClient = Client<HttpConnector, Full<Bytes>>;

pub fn peer_client() -> PeerClient {
    Client::builder(TokioExecutor::new()).build_http()
}

/// POST one message to `peer` and wait at most `timeout` for the status.
///
/// Any 2xx counts as delivered (`/request` answers 200 or 202). The
/// response body is not read.
pub async fn deliver(
    client: &PeerClient,
    peer: &Peer,
    message: &PeerMessage,
    timeout: Duration,
) -> Result<http::StatusCode, NotifyError> {
    let uri_str = format!("{}{}", peer.url, message.path());
    let uri: http::Uri = uri_str.parse().map_err(|e: http::uri::InvalidUri| {
        NotifyError::InvalidUri {
            uri: uri_str.clone(),
            reason: e.to_string(),
        }
    })?;

    let req = http::Request::builder()
        .method(http::Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(USER_AGENT, "rsvgrid-notify/0.1")
        .body(Full::new(Bytes::from(message.to_body()?)))?;

    let resp = tokio::time::timeout(timeout, client.request(req))
        .await
        .map_err(|_| NotifyError::Timeout {
            peer: peer.id.clone(),
            after: timeout,
        })?
        .map_err(|e| NotifyError::Unreachable {
            peer: peer.id.clone(),
            reason: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(NotifyError::Status {
            peer: peer.id.clone(),
            status,
        });
    }

    debug!(peer = %peer.id, kind = message.kind(), %status, "peer notified");
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use rsvgrid_coord::PendingRequest;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn request() -> PeerMessage {
        PeerMessage::Request(PendingRequest::new("node-a", 1, "u1"))
    }

    #[tokio::test]
    async fn accepted_counts_as_delivered() {
        let url = serve(Router::new().route("/request", post(|| async { StatusCode::ACCEPTED }))).await;
        let peer = Peer::new("node-b", url);

        let status = deliver(&peer_client(), &peer, &request(), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let url = serve(Router::new().route(
            "/release",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        let peer = Peer::new("node-b", url);

        let err = deliver(&peer_client(), &peer, &PeerMessage::Release, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let peer = Peer::new("node-b", "http://127.0.0.1:1");
        let err = deliver(&peer_client(), &peer, &request(), Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Unreachable { .. }), "got {err}");
    }

    #[tokio::test]
    async fn slow_peer_times_out() {
        let url = serve(Router::new().route(
            "/request",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        ))
        .await;
        let peer = Peer::new("node-b", url);

        let err = deliver(&peer_client(), &peer, &request(), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Timeout { .. }), "got {err}");
    }

    #[tokio::test]
    async fn malformed_peer_url_is_rejected() {
        let peer = Peer::new("node-b", "http://bad host");
        let err = deliver(&peer_client(), &peer, &request(), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::InvalidUri { .. }), "got {err}");
    }
}
