use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::sandbox::CodeExecutor;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub executor: Arc<dyn CodeExecutor>,
    pub config: AppConfig,
}
