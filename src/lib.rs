pub mod auth;
pub mod availability;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod notifier;
pub mod request_id;
pub mod reservation_engine;
pub mod runtime_params;
pub mod sweeper;
pub mod validation;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::notifier::ChangeNotifier;
use crate::runtime_params::RuntimeParams;

/// Shared application state handed to every handler via axum's `State`
/// extractor. Cheap to clone: the connection pool and notifier are
/// internally reference-counted, and config/runtime params are wrapped in
/// `Arc` explicitly.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub runtime_params: Arc<RuntimeParams>,
    pub notifier: Arc<ChangeNotifier>,
}
