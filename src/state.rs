use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::agents::advisor::Advisor;
use crate::config::{AppConfig, SessionBackend, APP_NAME};
use crate::error::AppError;
use crate::llm::openai_compatible::OpenAICompatibleProvider;
use crate::llm::provider::LLMProvider;
use crate::models::llm::ProviderKind;
use crate::seed;
use crate::session::memory::InMemorySessionStore;
use crate::session::sqlite::SqliteSessionStore;
use crate::session::{SessionLocks, SessionStore};
use crate::store::sqlite::{default_sqlite_path, resolve_path, SqliteCatalog};
use crate::store::CatalogStore;
use crate::tools::executor::ToolExecutor;
use crate::tools::registry::ToolRegistry;

#[derive(Clone)]
pub struct AppState {
    pub advisor: Advisor,
    pub locks: Arc<SessionLocks>,
    /// Cancelled on shutdown; every turn runs under a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(advisor: Advisor) -> Self {
        Self {
            advisor,
            locks: Arc::new(SessionLocks::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Opens the catalog (seeding it when empty), picks the session backing and builds
    /// the model client.
    pub fn init(config: &AppConfig) -> Result<Self, AppError> {
        let db_path = match config.store.sqlite_path.as_deref() {
            Some(raw) => resolve_path(raw)?,
            None => default_sqlite_path(APP_NAME)?,
        };
        let catalog = SqliteCatalog::new(db_path.clone())?;
        if config.store.seed_on_start {
            seed::seed_if_empty(&catalog)?;
        }
        info!(
            event_name = "system.bootstrap.catalog_ready",
            path = %db_path.display(),
            "course catalog ready"
        );

        let sessions: Arc<dyn SessionStore> = match config.session.backend {
            SessionBackend::Memory => Arc::new(InMemorySessionStore::new(config.session.capacity)),
            SessionBackend::Sqlite => {
                Arc::new(SqliteSessionStore::new(db_path, config.session.capacity)?)
            }
        };

        let registry = Arc::new(ToolRegistry::builtin()?);
        let store: Arc<dyn CatalogStore> = Arc::new(catalog);
        let executor = ToolExecutor::new(registry, store);

        let model = &config.model;
        let llm: Arc<dyn LLMProvider> = match model.provider {
            ProviderKind::OpenaiCompatible => Arc::new(OpenAICompatibleProvider::new(
                model.api_key.clone(),
                model.model_id.clone(),
                model.base_url.clone(),
                Duration::from_secs(model.timeout_secs),
            )?),
        };

        let advisor = Advisor::new(llm, executor, sessions)
            .with_system_prompt(model.system_prompt.as_deref())
            .with_sampling(model.sampling());
        Ok(Self::new(advisor))
    }
}
