//! Startup helpers for the `PharmaBot` console.
//!
//! Single-threaded mode: every request runs on one cooperative runtime.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use crate::chat::ChatOrchestrator;
use crate::client::{ApiClient, ApiResult, ClientConfig, PharmaApi};
use crate::search::SearchExecutor;

/// Everything a front-end needs to drive one conversation and run searches.
pub struct Services {
    /// Raw backend client, for diagnostics endpoints.
    pub client: Arc<ApiClient>,
    /// Orchestrator of the single active conversation.
    pub chat: ChatOrchestrator,
    /// Stateless search executor.
    pub search: SearchExecutor,
}

impl Services {
    /// Wire the orchestrator and executor to one backend client.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let search_limit = config.search_limit;
        let client = Arc::new(ApiClient::new(config)?);
        let api: Arc<dyn PharmaApi> = client.clone();

        Ok(Self {
            chat: ChatOrchestrator::new(Arc::clone(&api)),
            search: SearchExecutor::with_default_limit(api, search_limit),
            client,
        })
    }
}

/// Install the global `tracing` subscriber, logging to stderr.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Build services and run a front-end on a single-threaded runtime.
///
/// # Returns
/// `ExitCode::SUCCESS` when the front-end returns normally, `1` on failure.
#[must_use]
pub fn run<F, Fut>(config: ClientConfig, front_end: F) -> ExitCode
where
    F: FnOnce(Services) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    tracing::info!("Starting PharmaBot client v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Backend endpoint: {}", config.base_url);

    let services = match Services::new(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create client: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(front_end(services)) {
        tracing::error!("Console error: {e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_services_share_one_client() {
        let services = Services::new(ClientConfig::default().with_search_limit(20));
        assert!(services.is_ok());
        if let Ok(services) = services {
            assert!(services.chat.snapshot().is_empty());
            assert_eq!(services.client.config().search_limit, 20);
            let params = services
                .search
                .params(&crate::search::SearchQuery::new("aspirine"));
            assert_eq!(params.limit, 20);
        }
    }

    #[test]
    fn test_run_rejects_invalid_config() {
        let code = run(ClientConfig::new().with_base_url("nope"), |_| async { Ok(()) });
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::from(1)));
    }

    #[test]
    fn test_run_drives_front_end() {
        let code = run(ClientConfig::default(), |services| async move {
            anyhow::ensure!(services.chat.snapshot().is_empty());
            Ok(())
        });
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::SUCCESS));
    }
}
