use crate::config::Config;
use crate::csrf::CsrfToken;
use crate::db::DbPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub csrf_token: CsrfToken,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            csrf_token: CsrfToken::generate(),
        }
    }
}
