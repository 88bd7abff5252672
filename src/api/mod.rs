//! HTTP API over the core services.

mod error;
mod handlers;
mod identity;

use std::sync::Arc;

use axum::routing::{delete, get, patch, put};
use axum::Router;
use missionlog_core::{
    Clock, CompletionLedger, Database, FocusList, RangeAggregator, StatsConfig, TaskTree,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use identity::{CurrentUser, USER_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskTree,
    pub ledger: CompletionLedger,
    pub stats: RangeAggregator,
    pub focus: FocusList,
}

impl AppState {
    pub fn new(db: Database, clock: Arc<dyn Clock>, stats: StatsConfig) -> Self {
        Self {
            tasks: TaskTree::new(db.clone(), clock.clone()),
            ledger: CompletionLedger::new(db.clone(), clock.clone()),
            stats: RangeAggregator::new(db.clone(), clock.clone(), stats),
            focus: FocusList::new(db, clock),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/api/tasks/order", patch(handlers::reorder_tasks))
        .route(
            "/api/tasks/{id}",
            put(handlers::update_task).delete(handlers::delete_task),
        )
        .route(
            "/api/tasks/{id}/state",
            get(handlers::get_task_state).patch(handlers::set_task_state),
        )
        .route("/api/stats", get(handlers::range_stats))
        .route("/api/categories", get(handlers::list_categories))
        .route(
            "/api/focus",
            get(handlers::list_focus).post(handlers::add_focus),
        )
        .route("/api/focus/{task_id}", delete(handlers::remove_focus))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
