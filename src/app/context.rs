use std::path::PathBuf;
use std::sync::Arc;

use crate::app::admission::{self, AdmissionReport};
use crate::app::error::{PagemetaError, Result};
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::store::SqliteStore;
use crate::worker::{Worker, WorkerConfig};

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match &config.database.path {
            Some(p) => p.clone(),
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(config.fetch.clone())?);

        Ok(Self {
            config,
            store,
            fetcher,
        })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(config.fetch.clone())?);

        Ok(Self {
            config,
            store,
            fetcher,
        })
    }

    /// Validate and enqueue URLs for `owner_id`.
    pub fn admit<I, C>(&self, owner_id: &str, candidates: I) -> Result<AdmissionReport>
    where
        I: IntoIterator<Item = C>,
        C: AsRef<str>,
    {
        admission::admit(self.store.as_ref(), owner_id, candidates)
    }

    /// Build a worker sharing this context's store and fetcher.
    pub fn worker(&self, config: WorkerConfig) -> Worker<SqliteStore> {
        Worker::new(self.store.clone(), self.fetcher.clone(), config)
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| PagemetaError::Config("Could not find data directory".into()))?;
        let pagemeta_dir = data_dir.join("pagemeta");
        std::fs::create_dir_all(&pagemeta_dir)?;
        Ok(pagemeta_dir.join("pagemeta.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;
    use crate::store::Store;

    #[test]
    fn test_context_uses_configured_database_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");
        let mut config = Config::default();
        config.database.path = Some(path.clone());

        let ctx = AppContext::new(config.clone()).unwrap();
        ctx.admit("owner", ["https://example.com"]).unwrap();
        drop(ctx);

        assert!(path.exists());
        let reopened = AppContext::new(config).unwrap();
        let tasks = reopened.store.get_tasks_by_owner("owner", None).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Pending);
    }

    #[test]
    fn test_worker_inherits_context_store() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        let worker = ctx.worker(WorkerConfig {
            batch_size: 3,
            ..Default::default()
        });
        assert_eq!(worker.config().batch_size, 3);
    }
}
