use std::sync::Arc;

use records::{Store, StoreError};
use tokio::sync::{Mutex, MutexGuard};

use super::config::Config;

pub struct AppState {
    pub config: Config,
    store: Mutex<Store>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>, StoreError> {
        let store = Store::open(&config.data_dir, config.backup_on_write)?;

        Ok(Arc::new(Self {
            config,
            store: Mutex::new(store),
        }))
    }

    /// One writer at a time across every collection, so cross-collection
    /// checks (owner exists, username is free) see a stable snapshot.
    pub async fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().await
    }
}
