//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::insights::InsightsClient;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    insights: InsightsClient,
}

impl AppState {
    /// Build the state. The insights client is created from the config.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let insights = InsightsClient::new(&config.gemini);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                insights,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn insights(&self) -> &InsightsClient {
        &self.inner.insights
    }
}
