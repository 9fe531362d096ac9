// Application state module
// Shared state handed to every connection; the config is fixed after startup

use tokio_util::sync::CancellationToken;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,

    /// Cancelled on shutdown; every in-flight file copy holds a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            shutdown: CancellationToken::new(),
        }
    }

    pub const fn access_log(&self) -> bool {
        self.config.logging.access_log
    }

    /// Token for one file copy, cancelled together with the server
    pub fn copy_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
