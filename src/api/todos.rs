use actix_web::{web, HttpResponse};
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::db::models::{NewTodo, TodoItem};
use crate::error::{AppError, DatabaseError};
use crate::{AppState, Result};

fn found(item: Option<TodoItem>) -> Result<HttpResponse> {
    item.map(|item| HttpResponse::Ok().json(item))
        .ok_or(AppError::DatabaseError(DatabaseError::NotFound))
}

fn validated(body: web::Json<NewTodo>) -> Result<NewTodo> {
    let todo = body.into_inner();
    todo.validate().map_err(AppError::ValidationError)?;
    Ok(todo)
}

pub async fn list_todos(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let items = state.todos.list(user.id()).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn get_todo(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    found(state.todos.get(user.id(), path.into_inner()).await?)
}

pub async fn create_todo(
    user: AuthenticatedUser,
    body: web::Json<NewTodo>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let todo = validated(body)?;
    let item = state.todos.create(user.id(), todo).await?;
    info!("User {} created item {}", user.id(), item.id);
    Ok(HttpResponse::Ok().json(item))
}

pub async fn update_todo(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: web::Json<NewTodo>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let todo = validated(body)?;
    found(state.todos.update(user.id(), path.into_inner(), todo).await?)
}

pub async fn delete_todo(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let removed = state.todos.delete(user.id(), id).await?;
    if removed.is_some() {
        info!("User {} deleted item {}", user.id(), id);
    }
    found(removed)
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/toDoList")
            .route(web::get().to(list_todos))
            .route(web::post().to(create_todo)),
    )
    .service(
        web::resource("/toDoList/{id}")
            .route(web::get().to(get_todo))
            .route(web::put().to(update_todo))
            .route(web::delete().to(delete_todo)),
    );
}
