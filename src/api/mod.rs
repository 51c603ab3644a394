mod extract;
pub mod guard;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::GuardConfig;
use crate::error::YardworkError;
use crate::marketplace::Marketplace;
use crate::uploads::Presigner;

pub use guard::RateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub marketplace: Marketplace,
    /// `None` when no bucket is configured.
    pub presigner: Option<Arc<Presigner>>,
    pub rate_limiter: Arc<RateLimiter>,
    pub guard: Arc<GuardConfig>,
}

impl ApiState {
    pub fn new(marketplace: Marketplace, guard: GuardConfig, presigner: Option<Presigner>) -> Self {
        Self {
            marketplace,
            presigner: presigner.map(Arc::new),
            rate_limiter: Arc::new(RateLimiter::from_config(&guard)),
            guard: Arc::new(guard),
        }
    }
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub message: String,
    pub errors: Vec<String>,
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        message: message.into(),
        errors: Vec::new(),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for YardworkError {
    fn into_response(self) -> Response {
        let status = match &self {
            YardworkError::Validation(_)
            | YardworkError::InvalidTransition(_)
            | YardworkError::NotAssigned(_)
            | YardworkError::AlreadyCompleted(_)
            | YardworkError::AlreadySubmitted(_) => StatusCode::BAD_REQUEST,
            YardworkError::JobNotFound(_) | YardworkError::ProviderNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            YardworkError::Conflict(_) | YardworkError::DuplicateJob(_) => StatusCode::CONFLICT,
            YardworkError::StoreFull | YardworkError::UploadsDisabled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            YardworkError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
        }

        let body = match self {
            YardworkError::Validation(errors) => ErrorBody {
                message: "Validation failed".to_string(),
                errors,
            },
            other => ErrorBody {
                message: other.to_string(),
                errors: Vec::new(),
            },
        };
        (status, Json(body)).into_response()
    }
}

fn cors_layer(guard: &GuardConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = guard
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn router(state: ApiState) -> Router {
    let guarded = Router::new()
        .route("/jobs/add", post(handlers::add_job))
        .route("/jobs/get", get(handlers::list_jobs))
        .route("/jobs/get/:customer_id", get(handlers::list_customer_jobs))
        .route(
            "/jobs/get-by-provider/:provider_id",
            get(handlers::list_provider_jobs),
        )
        .route("/jobs/available", get(handlers::list_available_jobs))
        .route("/jobs/delete/:job_id", delete(handlers::delete_job))
        .route("/jobs/accept", put(handlers::accept_job))
        .route("/jobs/update/:job_id", put(handlers::advance_status))
        .route("/jobs/cancel/:job_id", put(handlers::cancel_job))
        .route("/jobs/complete", put(handlers::complete_job))
        .route("/jobs/feedback", put(handlers::submit_feedback))
        .route("/providers/register", post(handlers::register_provider))
        .route("/providers/:provider_id", get(handlers::provider_profile))
        .route(
            "/s3/generate-presigned-url",
            post(handlers::presign_upload),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::request_guard,
        ));

    Router::new()
        .route("/", get(handlers::health))
        .merge(guarded)
        .layer(cors_layer(&state.guard))
        .with_state(state)
}

/// Serve the API until `shutdown` is cancelled.
pub async fn run_api(
    addr: SocketAddr,
    state: ApiState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = router(state);

    tracing::info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!(addr = %addr, error = %e, "Failed to bind API server");
        e
    })?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    tracing::info!("API server stopped");
    Ok(())
}
