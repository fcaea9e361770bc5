pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::resume::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/resumes",
            get(handlers::handle_list_resumes).post(handlers::handle_create_resume),
        )
        .route("/api/v1/resumes/:id", get(handlers::handle_get_resume))
        .route(
            "/api/v1/resumes/:id/history",
            get(handlers::handle_resume_history),
        )
        .route(
            "/api/v1/resumes/:id/update-smart",
            post(handlers::handle_smart_update),
        )
        .route(
            "/api/v1/resumes/:id/analyze",
            post(handlers::handle_analyze_resume),
        )
        .with_state(state)
}
