use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use std::{
    collections::HashMap,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::sync::{broadcast, Mutex};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower_http::services::{ServeDir, ServeFile};

use crate::api::{ApiAnalyzeRequest, ApiOptimizeRequest, ApiOptimizeResponse, ApiSaveDraftRequest};
use crate::llm::GenerationClient;
use post_optimizer::config::AppConfig;
use post_optimizer::drafts::{DraftStore, JsonFileBackend, PostDraft};
use post_optimizer::optimizer::{OptimizeError, Optimizer};
use post_optimizer::{analyze, Analytics};

#[derive(Clone)]
struct AppState {
    optimizer: Arc<Optimizer<GenerationClient>>,
    drafts: Arc<DraftStore<JsonFileBackend>>,
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<StreamEvent>>>>,
}

#[derive(Clone, Serialize)]
struct StreamEvent {
    event: String,
    message: String,
    timestamp_ms: u128,
}

#[derive(serde::Deserialize)]
struct StreamQuery {
    request_id: String,
}

static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub async fn serve(args: crate::ServeArgs) -> Result<(), String> {
    let (config, _) = AppConfig::load(args.config)?;
    let client = GenerationClient::from_config(&config)?;
    let drafts = DraftStore::open(JsonFileBackend::new(PathBuf::from(&config.drafts.path))).await?;

    let state = AppState {
        optimizer: Arc::new(Optimizer::new(client)),
        drafts: Arc::new(drafts),
        channels: Arc::new(Mutex::new(HashMap::new())),
    };

    let web_root = args.web_root;
    let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
    let static_service = ServeDir::new(web_root).not_found_service(ServeFile::new(index_path));

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/optimize", post(optimize_handler))
        .route("/api/optimize/stream", get(stream_handler))
        .route("/api/drafts", get(list_drafts_handler).post(save_draft_handler))
        .route("/api/drafts/:id", delete(delete_draft_handler))
        .nest_service("/", static_service)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    tracing::info!(%addr, "serving post optimizer API");
    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| format!("failed to bind server: {}", err))?,
        app,
    )
    .await
    .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

// Runs on every editor change client-side; the endpoint exists for clients
// without the analyzer, so it accepts any text including empty.
async fn analyze_handler(Json(request): Json<ApiAnalyzeRequest>) -> Json<Analytics> {
    let text = request.text.unwrap_or_default();
    Json(analyze(&text))
}

async fn optimize_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiOptimizeRequest>,
) -> Result<Json<ApiOptimizeResponse>, (StatusCode, String)> {
    let request_id = request
        .request_id
        .clone()
        .unwrap_or_else(generate_request_id);
    let opt_request = request
        .into_request()
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?;

    let sender = get_or_create_channel(&state, &request_id).await;
    send_event(&sender, "start", "Building optimization prompt");
    send_event(&sender, "calling", "Calling generation endpoint");

    let outcome = state.optimizer.optimize(&opt_request).await;
    schedule_cleanup(state.channels.clone(), request_id.clone());

    match outcome {
        Ok(content) => {
            send_event(&sender, "received", "Parsing generation reply");
            send_event(&sender, "done", "Optimization complete");
            Ok(Json(ApiOptimizeResponse::from_content(content, request_id)))
        }
        Err(err) => {
            send_event(&sender, "error", "Optimization failed");
            tracing::warn!(error = %err, %request_id, "optimization failed");
            let status = match err {
                OptimizeError::EmptyInput => StatusCode::BAD_REQUEST,
                OptimizeError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            };
            Err((status, err.to_string()))
        }
    }
}

async fn stream_handler(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>, StatusCode>
{
    let sender = get_or_create_channel(&state, &query.request_id).await;
    let receiver = sender.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|event| match event {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(data)))
        }
        Err(_) => None,
    });

    send_event(&sender, "connected", "Streaming optimization status");
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(8))))
}

async fn list_drafts_handler(State(state): State<AppState>) -> Json<Vec<PostDraft>> {
    Json(state.drafts.list().await)
}

async fn save_draft_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiSaveDraftRequest>,
) -> Result<(StatusCode, Json<PostDraft>), (StatusCode, String)> {
    let content = request.content.unwrap_or_default();
    if content.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "draft content is empty".to_string()));
    }

    let draft = state
        .drafts
        .save(&content)
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err))?;
    Ok((StatusCode::CREATED, Json(draft)))
}

async fn delete_draft_handler(
    State(state): State<AppState>,
    Path(draft_id): Path<u64>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state
        .drafts
        .delete(draft_id)
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err))?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("no draft with id {}", draft_id)))
    }
}

async fn get_or_create_channel(
    state: &AppState,
    request_id: &str,
) -> broadcast::Sender<StreamEvent> {
    let mut guard = state.channels.lock().await;
    if let Some(sender) = guard.get(request_id) {
        return sender.clone();
    }
    let (sender, _) = broadcast::channel(32);
    guard.insert(request_id.to_string(), sender.clone());
    sender
}

fn send_event(sender: &broadcast::Sender<StreamEvent>, event: &str, message: &str) {
    let _ = sender.send(StreamEvent {
        event: event.to_string(),
        message: message.to_string(),
        timestamp_ms: now_ms(),
    });
}

fn schedule_cleanup(
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<StreamEvent>>>>,
    request_id: String,
) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        let mut guard = channels.lock().await;
        guard.remove(&request_id);
    });
}

fn generate_request_id() -> String {
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("req-{}-{}", now_ms(), counter)
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}
