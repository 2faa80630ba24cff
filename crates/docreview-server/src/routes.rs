use std::convert::Infallible;
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
    routing::{get, post},
    Router,
};
use docreview_core::{report::ARTIFACT_PREFIX, RunUpdate, NO_DOCUMENT_STATUS};
use futures_util::stream::{self, BoxStream, StreamExt};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::AppState;

type EventStream = BoxStream<'static, Result<Event, Infallible>>;

pub(crate) fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/profiles", get(list_profiles))
        .route("/api/analyze", post(analyze))
        .route("/api/artifacts/:name", get(download_artifact))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn bad_request(e: impl std::fmt::Display) -> StatusCode {
    warn!("bad request: {e}");
    StatusCode::BAD_REQUEST
}

fn internal(e: impl std::fmt::Display) -> StatusCode {
    tracing::error!("internal error: {e}");
    StatusCode::INTERNAL_SERVER_ERROR
}

fn keep_alive() -> KeepAlive {
    KeepAlive::new()
        .interval(Duration::from_secs(15))
        .text("ping")
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub(crate) async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "profile": state.pipeline.profile().name,
        "uptime_s": state.start_time.elapsed().as_secs(),
    }))
}

pub(crate) async fn list_profiles() -> Json<Value> {
    let profiles: Vec<Value> = docreview_domains::all_profiles()
        .into_iter()
        .map(|p| {
            json!({
                "name": p.name,
                "label": p.label,
                "jurisdiction": p.jurisdiction,
                "checklists": p.checklists.checklists,
            })
        })
        .collect();
    Json(json!(profiles))
}

/// SSE payload for one update; finished runs also get a download link.
fn update_event(update: &RunUpdate) -> Event {
    let mut payload = update.to_json();
    if let Some(name) = update.artifact_path().and_then(FsPath::file_name) {
        payload["download"] = json!(format!("/api/artifacts/{}", name.to_string_lossy()));
    }
    Event::default().data(payload.to_string())
}

/// Accept a multipart upload (field `file`) and stream the review run as SSE.
pub(crate) async fn analyze(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Sse<EventStream>, StatusCode> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .and_then(|n| FsPath::new(n).file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = field.bytes().await.map_err(bad_request)?;
        if !file_name.is_empty() {
            upload = Some((file_name, bytes.to_vec()));
        }
    }

    let Some((file_name, bytes)) = upload else {
        let update = RunUpdate::Failed {
            error: NO_DOCUMENT_STATUS.into(),
        };
        let stream: EventStream = stream::once(async move { Ok(update_event(&update)) }).boxed();
        return Ok(Sse::new(stream).keep_alive(keep_alive()));
    };

    let upload_dir = tempfile::tempdir().map_err(internal)?;
    let path = upload_dir.path().join(&file_name);
    tokio::fs::write(&path, &bytes).await.map_err(internal)?;
    info!(file = %file_name, bytes = bytes.len(), "upload received");

    // The upload directory lives until the run stream is dropped.
    let stream: EventStream = state
        .pipeline
        .analyze(path)
        .map(move |update| {
            let _keep = &upload_dir;
            Ok(update_event(&update))
        })
        .boxed();
    Ok(Sse::new(stream).keep_alive(keep_alive()))
}

/// Only `Reviewed_*.txt` basenames are served.
pub(crate) fn is_artifact_name(name: &str) -> bool {
    name.starts_with(ARTIFACT_PREFIX)
        && name.ends_with(".txt")
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

pub(crate) async fn download_artifact(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    if !is_artifact_name(&name) {
        return Err(bad_request(format!("refusing artifact name {name:?}")));
    }
    let path = state.pipeline.settings().output_dir.join(&name);
    let body = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(StatusCode::NOT_FOUND),
        Err(e) => return Err(internal(e)),
    };
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\"")),
        ],
        body,
    ))
}

// SSE logs: replays ring buffer history then streams live events

pub(crate) async fn sse_logs(State(state): State<Arc<AppState>>) -> Sse<EventStream> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    // Subscribe before snapshotting ring to avoid race
    let mut live_rx = state.log_tx.subscribe();
    let history: Vec<String> = state
        .log_ring
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .cloned()
        .collect();
    tokio::spawn(async move {
        for line in history {
            if tx.send(line).is_err() {
                return;
            }
        }
        loop {
            match live_rx.recv().await {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    });
    let stream: EventStream = UnboundedReceiverStream::new(rx)
        .map(|data| Ok(Event::default().data(data)))
        .boxed();
    Sse::new(stream).keep_alive(keep_alive())
}
