use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opd_core::{
    Actor, CompletionWorkflow, ConsultationRequest, ConsultationResult, MemoryStore, OpdError,
    SeedData, config_from_env_values,
};

/// Application state shared across REST API handlers
///
/// Holds the completion workflow, which owns the entity store.
#[derive(Clone)]
struct AppState {
    workflow: Arc<CompletionWorkflow<MemoryStore>>,
}

/// Main entry point for the OPD application
///
/// Starts the REST server for the outpatient-department encounter system.
///
/// # Environment Variables
/// - `OPD_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `OPD_MAX_RETRIES`: transient-failure retries per consultation (default: 3)
/// - `OPD_RETRY_BACKOFF_MS`: base backoff between retries (default: 50)
/// - `OPD_SEED_FILE`: optional JSON file with master data to load at startup
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("opd_core=info".parse()?)
                .add_directive("opd_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr: SocketAddr = std::env::var("OPD_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()?;

    let cfg = config_from_env_values(
        std::env::var("OPD_MAX_RETRIES").ok(),
        std::env::var("OPD_RETRY_BACKOFF_MS").ok(),
    )?;

    let store = MemoryStore::new();
    if let Ok(path) = std::env::var("OPD_SEED_FILE") {
        let raw = std::fs::read_to_string(&path)?;
        SeedData::from_json(&raw)?.apply(&store)?;
    }

    tracing::info!("++ Starting OPD REST on {}", rest_addr);

    let app = Router::new()
        .route("/health", get(health))
        .route("/consultations", post(complete_consultation))
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            workflow: Arc::new(CompletionWorkflow::new(store, Arc::new(cfg))),
        });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
///
/// # Returns
/// * `Json<serde_json::Value>` - Health status response
async fn health(State(_state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Body for the consultation-completion endpoint: the acting user plus the
/// consultation request itself.
#[derive(serde::Deserialize)]
struct CompleteConsultationBody {
    performed_by: Actor,
    #[serde(flatten)]
    request: ConsultationRequest,
}

/// Complete a consultation
///
/// Reconciles the patient, visit, prescription and bill for one encounter
/// as a single atomic unit and returns the consolidated outcome.
///
/// # Parameters
/// * `body` - The acting user and the consultation request
///
/// # Returns
/// * `Ok(Json<ConsultationResult>)` - The committed encounter
/// * `Err((StatusCode, Json))` - Validation (400), missing reference (404),
///   exhausted retries (503) or internal error (500)
async fn complete_consultation(
    State(state): State<AppState>,
    Json(body): Json<CompleteConsultationBody>,
) -> Result<Json<ConsultationResult>, (StatusCode, Json<serde_json::Value>)> {
    let workflow = Arc::clone(&state.workflow);

    // The workflow blocks on the visit key lock and retry backoff, so it
    // runs off the async runtime's worker threads.
    let outcome = tokio::task::spawn_blocking(move || {
        workflow.complete_consultation(&body.request, &body.performed_by)
    })
    .await
    .map_err(|e| {
        tracing::error!("Consultation task panicked: {e:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "internal error" })),
        )
    })?;

    outcome.map(Json).map_err(error_response)
}

fn error_response(err: OpdError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        OpdError::Validation(_) => StatusCode::BAD_REQUEST,
        OpdError::NotFound { .. } => StatusCode::NOT_FOUND,
        OpdError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        OpdError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Consultation error: {err:?}");
    }
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}
