//! Servidor web Axum com WebSocket para acompanhar a extração de atributos em tempo real

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use title_ner_core::{
    Category, EngineConfig, EntityLabel, EntitySpan, ExtractionEngine, PipelineEvent, RuleSpec,
    SpanSource, SplitFields, TitleRecord, TitleSplitter,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Estado compartilhado da aplicação (somente leitura)
struct AppState {
    engine: ExtractionEngine,
    splitter: TitleSplitter,
}

#[derive(Deserialize)]
struct ExtractRequest {
    category: Category,
    title: String,
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

impl ExtractRequest {
    fn record(&self) -> TitleRecord {
        TitleRecord {
            title: Some(self.title.clone()),
            fields: self.fields.clone(),
        }
    }
}

#[derive(Deserialize)]
struct SplitRequest {
    title: String,
}

/// Entidade com offsets de caractere, prontos para destacar no navegador
#[derive(Serialize)]
struct EntityView {
    text: String,
    label: EntityLabel,
    color: &'static str,
    start: usize,
    end: usize,
    source: SpanSource,
}

impl EntityView {
    fn new(title: &str, span: &EntitySpan) -> Self {
        let (start, end) = span.char_range(title);
        Self {
            text: span.text.clone(),
            label: span.label,
            color: span.label.color(),
            start,
            end,
            source: span.source,
        }
    }
}

#[derive(Serialize)]
struct ExtractResponse {
    entities: Vec<EntityView>,
    processing_us: u64,
    total_entities: usize,
}

#[derive(Serialize)]
struct CategoryInfo {
    category: Category,
    rules: Vec<RuleSpec>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // TITLE_NER_CONFIG aponta para um JSON de marcas/schemas; sem ela, usa os embutidos
    let config = match std::env::var("TITLE_NER_CONFIG") {
        Ok(path) => EngineConfig::from_json_file(&path)?,
        Err(_) => EngineConfig::default(),
    };
    let state = Arc::new(AppState {
        engine: ExtractionEngine::new(&config)?,
        splitter: TitleSplitter::new(config.brand_vocabulary()?)?,
    });

    let addr = std::env::var("TITLE_NER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Servidor title-ner iniciado em http://{addr}");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/extract", post(extract_handler))
        .route("/split", post(split_handler))
        .route("/categories", get(categories_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state)
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Extração via HTTP POST (sem streaming)
async fn extract_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractRequest>,
) -> Response {
    if req.title.trim().is_empty() {
        return bad_request("Título vazio");
    }

    let start = Instant::now();
    let entities = state.engine.extract(req.category, &req.record());
    let entities: Vec<EntityView> = entities.iter().map(|span| EntityView::new(&req.title, span)).collect();

    Json(ExtractResponse {
        total_entities: entities.len(),
        entities,
        processing_us: start.elapsed().as_micros() as u64,
    })
    .into_response()
}

/// Separação de campos de um título de tablet
async fn split_handler(State(state): State<Arc<AppState>>, Json(req): Json<SplitRequest>) -> Response {
    if req.title.trim().is_empty() {
        return bad_request("Título vazio");
    }
    let fields: SplitFields = state.splitter.split(Some(&req.title));
    Json(fields).into_response()
}

/// Categorias e suas tabelas de regras efetivas
async fn categories_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let categories: Vec<CategoryInfo> = Category::ALL
        .iter()
        .filter_map(|&category| {
            state.engine.schema(category).map(|schema| CategoryInfo {
                category,
                rules: schema.specs(),
            })
        })
        .collect();
    Json(categories)
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Lógica do WebSocket: recebe `{category, title, fields}`, executa o pipeline e envia cada evento
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let req = match serde_json::from_str::<ExtractRequest>(&text) {
                    Ok(req) if !req.title.trim().is_empty() => req,
                    Ok(_) => continue,
                    Err(err) => {
                        warn!("requisição WebSocket inválida: {err}");
                        let error = serde_json::json!({ "error": err.to_string() }).to_string();
                        if socket.send(Message::Text(error)).await.is_err() {
                            return;
                        }
                        continue;
                    }
                };

                info!("Extraindo via WebSocket [{}]: {} chars", req.category, req.title.len());

                // O pipeline é síncrono; roda fora do runtime
                let (tx, rx) = std::sync::mpsc::channel::<PipelineEvent>();
                let pipeline_state = Arc::clone(&state);
                let handle = tokio::task::spawn_blocking(move || {
                    pipeline_state.engine.extract_streaming(req.category, &req.record(), tx);
                });
                if handle.await.is_err() {
                    warn!("pipeline interrompido");
                    continue;
                }

                // O pipeline já terminou: todos os eventos estão na fila
                let events: Vec<PipelineEvent> = rx.try_iter().collect();
                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json)).await.is_err() {
                            return; // cliente desconectou
                        }
                        // Pequena pausa para a animação passo a passo
                        tokio::time::sleep(tokio::time::Duration::from_millis(35)).await;
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
