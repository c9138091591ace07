use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use webpilot_agent::{BrowserAgent, HttpBrowserAgent};
use webpilot_core::{Config, OutputSchema, Paths, TaskDescriptor, TaskType};
use webpilot_relay::{ConnectionRegistry, TaskSession};

// ---------------------------------------------------------------------------
// Shared state passed to HTTP/WS handlers
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct GatewayState {
    agent: Arc<dyn BrowserAgent>,
    registry: Arc<ConnectionRegistry>,
    config: Config,
}

#[derive(Deserialize)]
struct FormTaskRequest {
    task: String,
}

pub async fn run(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let paths = Paths::new();
    let mut config = Config::load_or_default(&paths)?;
    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    let agent: Arc<dyn BrowserAgent> = Arc::new(HttpBrowserAgent::new(&config.agent));
    let registry = Arc::new(ConnectionRegistry::new());
    let bind_addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = GatewayState {
        agent,
        registry,
        config,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Gateway stopped");
    Ok(())
}

fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/scrape", post(handle_scrape))
        .route("/fill-form", post(handle_fill_form))
        .route("/ws", get(handle_ws_upgrade))
        .layer(build_cors_layer(&state.config))
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .gateway
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

// ---------------------------------------------------------------------------
// One-shot endpoints
// ---------------------------------------------------------------------------

async fn handle_root() -> impl IntoResponse {
    Json(json!({
        "message": "Webpilot browser agent API",
        "status": "running",
    }))
}

async fn handle_scrape(
    State(state): State<GatewayState>,
    Json(descriptor): Json<TaskDescriptor>,
) -> Response {
    run_one_shot(&state, descriptor).await
}

/// Same as /scrape but the task type is always form_fill, regardless of what
/// the caller supplied.
async fn handle_fill_form(
    State(state): State<GatewayState>,
    Json(request): Json<FormTaskRequest>,
) -> Response {
    run_one_shot(
        &state,
        TaskDescriptor::new(&request.task, TaskType::FormFill),
    )
    .await
}

async fn run_one_shot(state: &GatewayState, descriptor: TaskDescriptor) -> Response {
    let schema = OutputSchema::for_task(descriptor.task_type);
    match state.agent.execute(&descriptor.enhanced_task(), schema).await {
        Ok(result) => Json(json!({
            "result": result.to_value(),
            "status": "completed",
            "taskType": descriptor.task_type.as_str(),
        }))
        .into_response(),
        Err(e) => {
            warn!(task_type = %descriptor.task_type, error = %e, "One-shot task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": format!("Task failed: {}", e) })),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Streaming endpoint
// ---------------------------------------------------------------------------

async fn handle_ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(socket: WebSocket, state: GatewayState) {
    use futures::{SinkExt, StreamExt};

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let connection_id = state.registry.add(event_tx.clone()).await;
    info!(connection_id = %connection_id, "WebSocket client connected");

    // Task: drain this connection's event queue onto the wire.
    let send_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(p) => p,
                Err(_) => continue,
            };
            if ws_sender.send(WsMessage::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    // One task in flight at a time: each inbound message is processed to
    // completion before the next is read.
    let session = TaskSession::new(state.agent.clone(), event_tx);
    while let Some(msg) = ws_receiver.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "WebSocket receive error");
                break;
            }
        };

        match msg {
            WsMessage::Text(text) => match serde_json::from_str::<TaskDescriptor>(&text) {
                Ok(descriptor) if !descriptor.task.trim().is_empty() => {
                    session.run(&descriptor).await;
                }
                Ok(_) => session.reject("task must not be empty"),
                Err(e) => session.reject(&e.to_string()),
            },
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    state.registry.remove(connection_id).await;
    send_task.abort();
    info!(connection_id = %connection_id, "WebSocket client disconnected");
}
