/// crosswalk API - HTTP host for the conversion and enrichment services
///
/// Each service is mounted at `POST /<service-name>`; query parameters are
/// service options and the optional `Contributor` header carries the
/// base64-encoded provider block for conversions.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use crosswalk::{CrosswalkConfig, Dispatcher, Service, ServiceError, ServiceRequest};

const CONTRIBUTOR_HEADER: &str = "Contributor";

struct AppState {
    dispatcher: Dispatcher,
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = match CrosswalkConfig::load(None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let state = Arc::new(AppState {
        dispatcher: Dispatcher::new(&config.defaults),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/services", get(list_services))
        .route("/:service", post(run_service))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = match format!("{}:{}", config.server.host, config.server.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!(
                "Error: invalid listen address {}:{}: {}",
                config.server.host, config.server.port, e
            );
            process::exit(1);
        }
    };
    tracing::info!("crosswalk API listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: failed to bind {}: {}", addr, e);
            process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Error: server failed: {}", e);
        process::exit(1);
    }
}

/// Run one service over the request body
async fn run_service(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let service: Service = name.parse()?;

    let contributor = headers
        .get(CONTRIBUTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if headers.contains_key(CONTRIBUTOR_HEADER) && contributor.is_none() {
        tracing::warn!("Ignoring non-ASCII {} header", CONTRIBUTOR_HEADER);
    }

    let request = ServiceRequest {
        body,
        params,
        contributor,
    };
    let output = state.dispatcher.run(service, &request)?;

    tracing::debug!("{} handled {} bytes", service, output.len());
    Ok(([(header::CONTENT_TYPE, "application/json")], output))
}

/// Health check endpoint (liveness)
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "crosswalk-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_services() -> Json<serde_json::Value> {
    let services: Vec<serde_json::Value> = Service::ALL
        .iter()
        .map(|s| serde_json::json!({"name": s.name(), "description": s.description()}))
        .collect();
    Json(serde_json::Value::Array(services))
}

// Error handling

#[derive(Debug)]
struct AppError(ServiceError);

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            ServiceError::InvalidBody(_) | ServiceError::InvalidOption { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::UnknownService(_) => StatusCode::NOT_FOUND,
        };
        tracing::debug!("Request failed: {}", self.0);

        (status, [(header::CONTENT_TYPE, "text/plain")], self.0.to_string()).into_response()
    }
}
