use axum::Router;
use storage::Database;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod cookies;
pub mod error;
pub mod features;
pub mod templates;

use templates::Templates;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub templates: Templates,
}

impl AppState {
    pub fn new(db: Database, templates: Templates) -> Self {
        Self { db, templates }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(features::catches::routes::routes())
        .fallback(features::catches::handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
