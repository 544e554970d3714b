use std::sync::Arc;

use axum::{
    http::{
        header::{InvalidHeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handler::*, AppState};

// Restrict to one origin when configured, otherwise allow any
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, InvalidHeaderValue> {
    let Some(origin) = origin else {
        return Ok(CorsLayer::permissive());
    };

    Ok(CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]))
}

pub fn create_router(app_state: Arc<AppState>, cors: CorsLayer) -> Router {
    let app = Router::new()
        .route("/", get(health_checker_handler))
        .route("/session", post(open_session))
        .route("/todo/:user_id", get(get_todos).post(create_todo))
        .route(
            "/todo/:user_id/:todo_id",
            patch(update_todo).delete(delete_todo),
        )
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    app
}
