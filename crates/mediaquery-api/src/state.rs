//! Application state shared by HTTP handlers

use mediaquery_core::Config;
use mediaquery_db::CatalogStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogStore>, config: Config) -> Self {
        Self {
            catalog,
            config: Arc::new(config),
        }
    }
}
