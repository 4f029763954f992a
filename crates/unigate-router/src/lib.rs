//! HTTP surface of the gateway.
//!
//! Thin axum wiring over [`Gateway`]: request binding, error-payload shaping
//! and event-stream response framing. All translation logic lives in
//! `unigate-core`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::StreamExt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use unigate_core::{Gateway, GatewayError};
use unigate_protocol::{ChatRequestBody, ListModelsResponse, ListObjectType};

#[derive(Clone)]
struct GatewayState {
    gateway: Arc<Gateway>,
}

pub fn gateway_router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/v1/models", get(models_list))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/health", get(health))
        .with_state(GatewayState { gateway })
}

async fn models_list(State(state): State<GatewayState>) -> Response {
    Json(ListModelsResponse {
        object: ListObjectType::List,
        data: state.gateway.models(),
    })
    .into_response()
}

async fn chat_completions(
    State(state): State<GatewayState>,
    Json(body): Json<ChatRequestBody>,
) -> Response {
    if body.wants_stream() {
        match state.gateway.chat_completion_stream(&body).await {
            Ok(rx) => sse_response(rx),
            Err(err) => error_response(&err),
        }
    } else {
        match state.gateway.chat_completion(&body).await {
            Ok(response) => Json(response).into_response(),
            Err(err) => error_response(&err),
        }
    }
}

async fn health() -> Response {
    let now = OffsetDateTime::now_utc();
    let timestamp = now
        .format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    Json(serde_json::json!({"status": "ok", "timestamp": timestamp})).into_response()
}

fn sse_response(rx: mpsc::Receiver<Bytes>) -> Response {
    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    let mut resp = Response::new(Body::from_stream(stream));
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    // Hint common reverse proxies to avoid buffering SSE responses.
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    resp
}

fn error_response(err: &GatewayError) -> Response {
    let status =
        StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
        "error": {"message": err.to_string(), "type": err.kind()}
    });
    (status, Json(body)).into_response()
}
