//! 路由模块

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook-intake", post(handlers::webhook_intake))
        .route("/delete/{instance}", post(handlers::delete_instance))
        .route("/api/health", get(handlers::health_check))
}
