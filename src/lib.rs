pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;
use std::time::Duration;
use actix_web::error::{JsonPayloadError, PathError};
use actix_web::{web, HttpRequest, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthGate, AuthenticatedUser, CredentialStore, TokenService};
pub use db::{DbOperations, InMemoryStore, TodoItem, TodoRepository, User, UserRepository};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Fallback for paths no route matches.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "message": "No such endpoint!" }))
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub credentials: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub todos: Arc<dyn TodoRepository>,
}

impl AppState {
    /// Connects to Postgres, applies migrations and wires every component.
    pub async fn new(config: Settings) -> Result<Self> {
        let db = DbOperations::new_with_options(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(5),
        )
        .await?;
        db.migrate().await?;

        let db = Arc::new(db);
        Ok(Self::with_repositories(config, db.clone(), db))
    }

    pub fn with_repositories(
        config: Settings,
        users: Arc<dyn UserRepository>,
        todos: Arc<dyn TodoRepository>,
    ) -> Self {
        let tokens = TokenService::new(&config.auth);
        Self {
            config: Arc::new(config),
            credentials: Arc::new(CredentialStore::new(users)),
            tokens: Arc::new(tokens),
            todos,
        }
    }

    /// State backed by a fresh `InMemoryStore`.
    pub fn in_memory(config: Settings) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::with_repositories(config, store.clone(), store)
    }
}

/// Turns JSON body failures into the same error envelope as every other 400.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!("Rejected request body: {}", err);
    let message = match err {
        JsonPayloadError::ContentType => "expected a JSON body",
        JsonPayloadError::Deserialize(ref e) if e.is_data() => {
            "request body does not match the expected fields"
        }
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            "request body is too large"
        }
        _ => "request body is not valid JSON",
    };
    AppError::ValidationError(message.to_string()).into()
}

/// Path segments that fail to parse (e.g. a non-numeric id) match nothing.
fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!("Rejected request path: {}", err);
    AppError::DatabaseError(error::DatabaseError::NotFound).into()
}

/// Registers every route. `/api` is wrapped in the `AuthGate`.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .route("/health", web::get().to(health_check))
        .service(web::scope("/auth").configure(auth::handlers::routes))
        .service(
            web::scope("/api")
                .wrap(AuthGate::new(state.tokens.clone()))
                .configure(api::routes),
        );
}
