use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{AppError, AuthError};
use crate::{AppState, Result};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl CredentialsRequest {
    fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(AppError::ValidationError("a valid email is required".into()));
        }
        if self.password.is_empty() {
            return Err(AppError::ValidationError("password must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

pub async fn signup(
    req: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    info!("Received signup request for email: {}", req.email);
    req.validate()?;

    let user_id = match state.credentials.register(&req.email, &req.password).await {
        Ok(user_id) => user_id,
        Err(e @ AppError::AuthError(AuthError::DuplicateEmail)) => {
            warn!("Signup rejected for email: {}: {}", req.email, e);
            return Err(e);
        }
        Err(e) => {
            error!("Signup failed for email: {}: {}", req.email, e);
            return Err(e);
        }
    };

    let token = state.tokens.issue(user_id)?;
    info!("Signup successful for user {}", user_id);
    Ok(HttpResponse::Ok().json(AuthResponse { token }))
}

pub async fn signin(
    req: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    info!("Received signin request for email: {}", req.email);
    req.validate()?;

    let user_id = state
        .credentials
        .verify(&req.email, &req.password)
        .await
        .map_err(|e| {
            warn!("Signin failed for email: {}: {}", req.email, e);
            e
        })?;

    let token = state.tokens.issue(user_id)?;
    info!("Signin successful for user {}", user_id);
    Ok(HttpResponse::Ok().json(AuthResponse { token }))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/signup", web::post().to(signup))
        .route("/signin", web::post().to(signin));
}
