use log::warn;
use std::path::PathBuf;
use std::time::Duration;

use crate::runtime::Runtime;

/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "API_BASE_URL";
/// Environment variable holding the request timeout in milliseconds.
pub const TIMEOUT_ENV: &str = "API_TIMEOUT_MS";
/// Environment variable holding the directory downloads are saved into.
pub const DOWNLOAD_DIR_ENV: &str = "API_DOWNLOAD_DIR";

/// Timeout used when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
/// Timeout of the application-wide client built by [`ClientConfig::from_env`].
pub const APP_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Construction options for [`crate::ApiClient`]. Unset fields fall back to
/// the environment, then to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub download_dir: Option<PathBuf>,
}

/// A [`ClientConfig`] with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub download_dir: PathBuf,
}

impl ClientConfig {
    /// The application instance: base URL and timeout from the environment,
    /// falling back to [`APP_TIMEOUT`].
    pub fn from_env<R: Runtime + ?Sized>(runtime: &R) -> Self {
        let timeout = match runtime.env_var(TIMEOUT_ENV) {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    warn!("Ignoring invalid {}={:?}", TIMEOUT_ENV, raw);
                    APP_TIMEOUT
                }
            },
            Err(_) => APP_TIMEOUT,
        };

        Self {
            base_url: runtime.env_var(BASE_URL_ENV).ok(),
            timeout: Some(timeout),
            download_dir: runtime.env_var(DOWNLOAD_DIR_ENV).ok().map(PathBuf::from),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    #[tracing::instrument(skip(self, runtime))]
    pub fn resolve<R: Runtime + ?Sized>(self, runtime: &R) -> ResolvedConfig {
        let base_url = self
            .base_url
            .filter(|url| !url.is_empty())
            .or_else(|| runtime.env_var(BASE_URL_ENV).ok())
            .unwrap_or_default();

        // A zero timeout fails every request; treat it as unset.
        let timeout = self
            .timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(DEFAULT_TIMEOUT);

        let download_dir = self
            .download_dir
            .or_else(|| runtime.env_var(DOWNLOAD_DIR_ENV).ok().map(PathBuf::from))
            .or_else(|| runtime.current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        ResolvedConfig {
            base_url,
            timeout,
            download_dir,
        }
    }
}
