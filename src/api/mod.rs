//! Routes under `/api`. Every handler here runs behind `AuthGate` and takes
//! the caller as an `AuthenticatedUser`.

pub mod todos;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::AuthenticatedUser;

/// Echoes the caller's id back.
pub async fn whoami(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": format!("in this protected route, we get the user's id like so: {}", user.id()),
        "user_id": user.id(),
    }))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/test", web::get().to(whoami));
    todos::routes(cfg);
}
