use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    db::Database,
    error::ApiError,
    model::{Todo, User},
    schema::{CreateTodoSchema, SessionSchema, UpdateTodoSchema},
    AppState,
};

pub const DELETED_MESSAGE: &str = "Todo deleted successfully";

// Malformed or mistyped bodies are a validation failure, not a framework rejection
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

// Handler for the health checker route
pub async fn health_checker_handler() -> impl IntoResponse {
    const MESSAGE: &str = "Todo session API with Rust, SQLX, SQLite, and Axum";

    tracing::debug!("health check");
    let json_response = serde_json::json!({
        "status": "success",
        "message": MESSAGE
    });

    Json(json_response)
}

// Handler for finding or creating the user behind a session
pub async fn open_session(
    State(data): State<Arc<AppState>>,
    payload: Result<Json<SessionSchema>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let body = json_body(payload)?;

    let (user, created) = data.db.find_or_create_user(&body.username).await?;
    if created {
        tracing::info!(user_id = %user.id, username = %user.username, "created user");
    }

    Ok(Json(user))
}

// Handler for creating a new Todo
pub async fn create_todo(
    Path(user_id): Path<String>,
    State(data): State<Arc<AppState>>,
    payload: Result<Json<CreateTodoSchema>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let body = json_body(payload)?;

    let todo = data
        .db
        .create_todo(&user_id, &body.description, body.done)
        .await?;
    tracing::debug!(%user_id, todo_id = %todo.id, "created todo");

    Ok(Json(todo))
}

// Handler for listing every Todo of a user
pub async fn get_todos(
    Path(user_id): Path<String>,
    State(data): State<Arc<AppState>>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = data.db.list_todos(&user_id).await?;
    Ok(Json(todos))
}

// Refuse unless `user_id` owns this exact todo
async fn ensure_owned(data: &AppState, user_id: &str, todo_id: &str) -> Result<(), ApiError> {
    match data.db.find_owned_todo(user_id, todo_id).await? {
        Some(_) => Ok(()),
        None => {
            tracing::warn!(%user_id, %todo_id, "ownership check failed");
            Err(ApiError::Denied)
        }
    }
}

// An empty PATCH body means no changes. Anything else must be a JSON object.
fn patch_body(bytes: &[u8]) -> Result<UpdateTodoSchema, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(UpdateTodoSchema::default());
    }
    serde_json::from_slice(bytes).map_err(|err| ApiError::Validation(err.to_string()))
}

fn vanished(todo_id: &str) -> ApiError {
    ApiError::NotFound(format!("Todo with ID: {} not found", todo_id))
}

// The todo may have been deleted since the ownership check
async fn apply_update(
    db: &Database,
    todo_id: &str,
    changes: &UpdateTodoSchema,
) -> Result<Todo, ApiError> {
    db.update_todo(todo_id, changes)
        .await?
        .ok_or_else(|| vanished(todo_id))
}

async fn remove_todo(db: &Database, todo_id: &str) -> Result<Todo, ApiError> {
    db.delete_todo(todo_id)
        .await?
        .ok_or_else(|| vanished(todo_id))
}

// Handler for updating a Todo owned by the user
pub async fn update_todo(
    Path((user_id, todo_id)): Path<(String, String)>,
    State(data): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Todo>, ApiError> {
    let changes = patch_body(&body)?;
    ensure_owned(&data, &user_id, &todo_id).await?;

    let todo = apply_update(&data.db, &todo_id, &changes).await?;
    Ok(Json(todo))
}

// Handler for deleting a Todo owned by the user
pub async fn delete_todo(
    Path((user_id, todo_id)): Path<(String, String)>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_owned(&data, &user_id, &todo_id).await?;

    let deleted = remove_todo(&data.db, &todo_id).await?;
    tracing::info!(%user_id, %todo_id, "deleted todo");

    let json_response = json!({
        "message": DELETED_MESSAGE,
        "deletedTodo": deleted,
    });
    Ok((StatusCode::OK, Json(json_response)))
}
