// src/server.rs

//! Live submission endpoint.
//!
//! A thin HTTP front door that accepts ad-hoc sample submissions and
//! hands them to the queue workers. Accepting is decoupled from
//! processing: the response only acknowledges that the sample was
//! enqueued.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::collector::SampleSender;
use crate::error::Result;
use crate::models::{Sample, ServerConfig};

/// Feed name assigned to samples submitted through this endpoint.
const DEFAULT_FEED: &str = "server";

#[derive(Clone)]
struct ServerState {
    queue: SampleSender,
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    url: Option<String>,
    id: Option<String>,
    feed: Option<String>,
}

/// Build the submission router around a queue sender.
pub fn router(queue: SampleSender) -> Router {
    Router::new()
        .route("/", post(submit))
        .with_state(ServerState { queue })
}

/// Bind and serve the submission endpoint forever.
pub async fn serve(config: &ServerConfig, queue: SampleSender) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Submission endpoint listening on {}", addr);
    axum::serve(listener, router(queue)).await?;
    Ok(())
}

/// Enqueue a submitted sample.
///
/// `url` is required; `id` defaults to a fresh UUID and `feed` to the
/// fixed server feed name.
async fn submit(State(state): State<ServerState>, Form(request): Form<SubmitRequest>) -> Response {
    let Some(url) = request.url.filter(|u| !u.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing url parameter" })),
        )
            .into_response();
    };

    let id = request
        .id
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let feed = request
        .feed
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FEED.to_string());

    let sample = Sample::new(id, url, feed);
    log::info!("Accepted submission {} ({})", sample.url, sample.id);

    if state.queue.send(sample).is_err() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "collector workers are not running" })),
        )
            .into_response();
    }

    Json(json!({ "processing": true })).into_response()
}
