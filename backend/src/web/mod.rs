use axum::{
    extract::{State, rejection::JsonRejection},
    middleware as axum_middleware,
    http::Method,
    routing::{post, get},
    Json,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;

use crate::db::services::{CredentialStore, InMemoryCredentialStore, InMemoryJobLedger, JobLedger};
use crate::server::config::ServerConfig;
use crate::services::auth_service;
use crate::web::{
    error::AppError,
    models::LoginResponse,
    middleware::auth,
    routes::*,
    validation::{LOGIN_INVALID_MESSAGE, ValidationError},
};

pub mod error;
pub mod models;
pub mod routes;
pub mod middleware;
pub mod validation;


#[derive(Clone)]
pub struct AppState {
    pub credential_store: Arc<dyn CredentialStore>,
    pub job_ledger: Arc<dyn JobLedger>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        credential_store: Arc<dyn CredentialStore>,
        job_ledger: Arc<dyn JobLedger>,
        config: Arc<ServerConfig>,
    ) -> Self {
        AppState {
            credential_store,
            job_ledger,
            config,
        }
    }

    /// Fresh seeded credential store and empty ledger.
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::new(
            Arc::new(InMemoryCredentialStore::seeded()),
            Arc::new(InMemoryJobLedger::new()),
            Arc::new(config),
        )
    }
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        ValidationError::malformed_body(LOGIN_INVALID_MESSAGE, rejection.body_text())
    })?;
    let login_request = validation::validate_login(&payload)?;

    let login_response = auth_service::login_user(
        app_state.credential_store.as_ref(),
        login_request,
        &app_state.config.jwt_secret,
        app_state.config.demo_password_bypass,
    )
    .await?;

    Ok(Json(login_response))
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(app_state: AppState) -> Router {
    let app_state = Arc::new(app_state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/api/login", post(login_handler))
        .route(
            "/api/verify",
            get(auth_service::verify_session)
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .nest(
            "/api",
            batch_job_routes::batch_job_routes()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
