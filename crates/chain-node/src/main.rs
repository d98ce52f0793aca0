//! HTTP adapter for the demo chain. All ledger logic lives in
//! `chain-core`; this binary only shapes requests and responses and maps
//! core errors to HTTP statuses.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chain_core::{
    constants::DEFAULT_DIFFICULTY, BlockView, Chain, ChainConfig, TamperError, TamperOutcome,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Leading zero hex characters required of every mined block
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u32,

    /// Proof-of-work attempt cap per block (default: unbounded)
    #[arg(long, default_value_t = u64::MAX)]
    max_attempts: u64,
}

/// One writer lock serializes mine / tamper / snapshot; proof-of-work
/// runs while the lock is held, so requests are strictly one at a time.
#[derive(Clone)]
struct AppState {
    chain: Arc<Mutex<Chain>>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct ChainResponse {
    length: usize,
    chain: Vec<BlockView>,
}

#[derive(Deserialize)]
struct MineRequest {
    data: String,
}

#[derive(Deserialize)]
struct TamperRequest {
    index: usize,
    data: String,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn get_chain(State(state): State<AppState>) -> Json<ChainResponse> {
    let chain = state.chain.lock().expect("chain lock poisoned");
    let snapshot = chain.snapshot();
    Json(ChainResponse {
        length: snapshot.len(),
        chain: snapshot,
    })
}

async fn mine(State(state): State<AppState>, Json(req): Json<MineRequest>) -> Response {
    let mut chain = state.chain.lock().expect("chain lock poisoned");
    match chain.append(req.data) {
        Ok(view) => Json(view).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

async fn update_data(State(state): State<AppState>, Json(req): Json<TamperRequest>) -> Response {
    let mut chain = state.chain.lock().expect("chain lock poisoned");
    match chain.tamper(req.index, req.data) {
        Ok(TamperOutcome::Applied) => Json(json!({
            "success": true,
            "message": "Block and subsequent blocks marked as invalid",
        }))
        .into_response(),
        Ok(TamperOutcome::NoChange) => Json(json!({ "error": "No change in data" })).into_response(),
        Err(err @ TamperError::GenesisProtected) => (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        Err(err @ TamperError::IndexOutOfRange { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let chain = Chain::with_config(ChainConfig {
        difficulty: args.difficulty,
        max_attempts: args.max_attempts,
    })?;
    info!(difficulty = args.difficulty, "chain created, genesis mined");

    let state = AppState {
        chain: Arc::new(Mutex::new(chain)),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/chain", get(get_chain))
        .route("/mine", post(mine))
        .route("/update_data", post(update_data))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = args.listen.parse()?;
    info!("chain-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
