use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::domain::ReferenceId;
use crate::storage::IdentityResolver;

use super::loader::{Directory, DirectoryError, DirectoryLoader};

/// Watch the directory file and broadcast updated snapshots.
pub struct DirectoryWatcher {
    loader: DirectoryLoader,
    check_interval: Duration,
    current: Arc<Directory>,
}

impl DirectoryWatcher {
    pub fn new(loader: DirectoryLoader, check_interval: Duration) -> Self {
        DirectoryWatcher {
            loader,
            check_interval,
            current: Arc::new(Directory::empty()),
        }
    }

    /// Start watching for directory changes.
    ///
    /// A directory that fails to load initially is replaced by an empty
    /// one, so every name falls back to a placeholder until it loads.
    pub fn start(mut self) -> (watch::Receiver<Arc<Directory>>, tokio::task::JoinHandle<()>) {
        match self.loader.load() {
            Ok(directory) => {
                info!(entries = directory.len(), "Loaded identity directory");
                self.current = Arc::new(directory);
            }
            Err(e) => {
                error!(path = %self.loader.path().display(), "Failed to load identity directory: {}", e);
            }
        }

        let (tx, rx) = watch::channel(self.current.clone());

        let handle = tokio::spawn(async move {
            let mut interval = interval(self.check_interval);

            loop {
                interval.tick().await;

                match self.check_for_updates(&tx) {
                    Ok(true) => info!("Identity directory reloaded"),
                    Ok(false) => {}
                    Err(e) => warn!("Error checking for directory updates: {}", e),
                }
            }
        });

        (rx, handle)
    }

    /// Reload the directory and broadcast it if its contents changed.
    fn check_for_updates(
        &mut self,
        tx: &watch::Sender<Arc<Directory>>,
    ) -> Result<bool, DirectoryError> {
        let directory = self.loader.load()?;

        if *self.current == directory {
            return Ok(false);
        }

        info!(
            previous = self.current.len(),
            entries = directory.len(),
            "Identity directory changed"
        );

        self.current = Arc::new(directory);
        let _ = tx.send(self.current.clone());

        Ok(true)
    }
}

/// Resolver reading from the latest broadcast directory snapshot.
#[derive(Clone)]
pub struct DirectoryResolver {
    rx: watch::Receiver<Arc<Directory>>,
}

impl DirectoryResolver {
    pub fn new(rx: watch::Receiver<Arc<Directory>>) -> Self {
        DirectoryResolver { rx }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Directory> {
        self.rx.borrow().clone()
    }
}

#[async_trait]
impl IdentityResolver for DirectoryResolver {
    async fn resolve_many(
        &self,
        ids: &HashSet<ReferenceId>,
    ) -> anyhow::Result<HashMap<ReferenceId, String>> {
        Ok(self.snapshot().lookup(ids))
    }
}
