//! Peer protocol handlers.
//!
//! Bodies are decoded by hand rather than through the `Json` extractor so
//! that every undecodable message maps to a 400 with the same envelope and
//! a log line, whatever the content type.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;
use tracing::warn;

use rsvgrid_coord::{NodeSnapshot, PendingRequest, ReplyMessage, RequestDisposition};

use crate::ApiState;
use crate::error::{ApiError, ApiResponse};

fn decode<T: DeserializeOwned>(kind: &'static str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(kind, error = %e, "rejecting malformed peer message");
        ApiError::MalformedPeerMessage {
            kind,
            reason: e.to_string(),
        }
    })
}

/// POST /request
pub async fn handle_request(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let request: PendingRequest = decode("request", &body)?;
    // No clock value can follow u64::MAX.
    if request.timestamp == u64::MAX {
        warn!(from = %request.node_id, "rejecting request with exhausted timestamp");
        return Err(ApiError::MalformedPeerMessage {
            kind: "request",
            reason: format!("timestamp {} leaves no room to advance", request.timestamp),
        });
    }
    let status = match state.coordinator.on_peer_request(request) {
        RequestDisposition::Permitted => StatusCode::OK,
        RequestDisposition::Queued => StatusCode::ACCEPTED,
    };
    Ok(status)
}

/// POST /reply
pub async fn handle_reply(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let reply: ReplyMessage = decode("reply", &body)?;
    state.coordinator.on_peer_reply(&reply);
    Ok(StatusCode::OK)
}

/// POST /release. Any body is ignored.
pub async fn handle_release(State(state): State<ApiState>) -> StatusCode {
    state.coordinator.on_peer_release();
    StatusCode::OK
}

/// GET /status
pub async fn status(State(state): State<ApiState>) -> Json<ApiResponse<NodeSnapshot>> {
    ApiResponse::ok(state.coordinator.snapshot())
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::{json, send, test_state};

    #[tokio::test]
    async fn request_on_idle_node_is_permitted() {
        let (state, _) = test_state();

        let resp = send(&state, "POST", "/request", r#"{"NodeID":"node-b","Timestamp":4,"UserID":"u1"}"#).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let snap = state.coordinator.snapshot();
        assert!(snap.any_cs && !snap.in_cs);
        assert_eq!(snap.clock, 5);
    }

    #[tokio::test]
    async fn request_while_in_section_is_queued() {
        let (state, _) = test_state();
        state.coordinator.acquire("local");

        let resp = send(&state, "POST", "/request", r#"{"NodeID":"node-b","Timestamp":1,"UserID":"u1"}"#).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(state.coordinator.snapshot().queue.len(), 1);
    }

    #[tokio::test]
    async fn malformed_request_is_rejected_without_mutation() {
        let (state, _) = test_state();
        let before = state.coordinator.snapshot();

        for body in ["", "not json", r#"{"NodeID":"node-b"}"#, r#"{"NodeID":1,"Timestamp":"x","UserID":"u"}"#] {
            let (status, value) = json(send(&state, "POST", "/request", body).await).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
            assert_eq!(value["success"], false);
            assert!(value["error"].as_str().unwrap().contains("malformed request"));
        }

        assert_eq!(state.coordinator.snapshot(), before);
    }

    #[tokio::test]
    async fn request_with_exhausted_timestamp_is_rejected() {
        let (state, _) = test_state();
        state.coordinator.acquire("local");
        let before = state.coordinator.snapshot();

        let body = format!(r#"{{"NodeID":"node-b","Timestamp":{},"UserID":"u1"}}"#, u64::MAX);
        let (status, value) = json(send(&state, "POST", "/request", &body).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].as_str().unwrap().contains("malformed request"));
        assert_eq!(state.coordinator.snapshot(), before);

        let body = format!(r#"{{"NodeID":"node-b","Timestamp":{},"UserID":"u1"}}"#, u64::MAX - 1);
        let resp = send(&state, "POST", "/request", &body).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(state.coordinator.snapshot().clock, u64::MAX);
    }

    #[tokio::test]
    async fn reply_addressed_here_grants_section() {
        let (state, _) = test_state();

        let resp = send(&state, "POST", "/reply", r#"{"NodeID":"node-b","RequesterID":"node-a"}"#).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.coordinator.snapshot().in_cs);
    }

    #[tokio::test]
    async fn reply_for_other_node_is_ignored() {
        let (state, _) = test_state();

        let resp = send(&state, "POST", "/reply", r#"{"NodeID":"node-b","RequesterID":"node-c"}"#).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!state.coordinator.snapshot().in_cs);
    }

    #[tokio::test]
    async fn malformed_reply_is_rejected() {
        let (state, _) = test_state();
        let resp = send(&state, "POST", "/reply", r#"{"NodeID":"node-b"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!state.coordinator.snapshot().in_cs);
    }

    #[tokio::test]
    async fn release_with_empty_body_clears_contention() {
        let (state, _) = test_state();
        state
            .coordinator
            .on_peer_request(rsvgrid_coord::PendingRequest::new("node-b", 1, "u1"));

        let resp = send(&state, "POST", "/release", "").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!state.coordinator.snapshot().any_cs);

        // Again, still fine.
        let resp = send(&state, "POST", "/release", "").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!state.coordinator.snapshot().any_cs);
    }

    #[tokio::test]
    async fn status_reports_snapshot() {
        let (state, _) = test_state();
        state.coordinator.acquire("u1");

        let (status, value) = json(send(&state, "GET", "/status", "").await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["data"]["node_id"], "node-a");
        assert_eq!(value["data"]["in_cs"], true);
        assert_eq!(value["data"]["any_cs"], true);
        assert_eq!(value["data"]["clock"], 1);
    }

    #[tokio::test]
    async fn healthz_ok() {
        let (state, _) = test_state();
        let resp = send(&state, "GET", "/healthz", "").await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
