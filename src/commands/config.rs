use anyhow::Result;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::ClientConfig,
    http::ApiClient,
    notify::{ConsoleNotifier, Notifier, SilentNotifier},
    runtime::Runtime,
    storage::{FileStorage, Storage},
};

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub download_dir: Option<PathBuf>,
    pub storage_path: Option<PathBuf>,
    pub quiet: bool,
}

/// Everything a command needs, wired once per invocation.
pub struct Config<R: Runtime + Clone + 'static> {
    pub runtime: R,
    pub storage: Arc<dyn Storage>,
    pub client: ApiClient,
}

impl<R: Runtime + Clone + 'static> Config<R> {
    #[tracing::instrument(skip(runtime))]
    pub fn new(runtime: R, overrides: Overrides) -> Result<Self> {
        let storage: Arc<dyn Storage> = match overrides.storage_path {
            Some(path) => Arc::new(FileStorage::new(runtime.clone(), path)),
            None => Arc::new(FileStorage::in_config_dir(runtime.clone())?),
        };

        let notifier: Arc<dyn Notifier> = if overrides.quiet {
            Arc::new(SilentNotifier)
        } else {
            // Errors are reported once, by `main`, when the command fails.
            Arc::new(ConsoleNotifier::default().without_errors())
        };

        let mut client_config = ClientConfig::from_env(&runtime);
        if let Some(base_url) = overrides.base_url {
            client_config = client_config.with_base_url(base_url);
        }
        if let Some(ms) = overrides.timeout_ms {
            client_config = client_config.with_timeout(Duration::from_millis(ms));
        }
        if let Some(dir) = overrides.download_dir {
            client_config = client_config.with_download_dir(dir);
        }
        debug!("Client configuration: {:?}", client_config);

        let client = ApiClient::new(
            client_config,
            Arc::new(runtime.clone()),
            Arc::clone(&storage),
            notifier,
        )?;

        Ok(Self {
            runtime,
            storage,
            client,
        })
    }
}
