use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{run_api, ApiState};
use crate::config::ServerConfig;
use crate::jobs::JobStore;
use crate::marketplace::Marketplace;
use crate::providers::{InMemoryProviderDirectory, ProviderDirectory};
use crate::uploads::Presigner;

/// Wires the job store, provider directory and upload signer behind the API.
pub struct Server {
    pub config: ServerConfig,
    state: ApiState,
}

impl Server {
    /// A server backed by an in-process provider directory.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_provider_directory(config, Arc::new(InMemoryProviderDirectory::new()))
    }

    pub fn with_provider_directory(
        config: ServerConfig,
        providers: Arc<dyn ProviderDirectory>,
    ) -> Self {
        let marketplace = Marketplace::new(JobStore::with_capacity(config.max_jobs), providers);
        let presigner = config.uploads.clone().map(Presigner::new);
        let state = ApiState::new(marketplace, config.guard.clone(), presigner);
        Self { config, state }
    }

    pub fn state(&self) -> &ApiState {
        &self.state
    }

    /// Serve until `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server fails.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), Box<dyn std::error::Error>> {
        if !self.config.guard.origin_check_enabled() {
            tracing::warn!(
                "No allowed origins configured; origin restriction is off and CORS accepts any origin"
            );
        }
        match &self.config.uploads {
            Some(uploads) => tracing::info!(
                bucket = %uploads.bucket,
                region = %uploads.region,
                "Presigned photo uploads enabled"
            ),
            None => tracing::warn!("No S3 bucket configured; presigned uploads are disabled"),
        }

        run_api(self.config.listen_addr, self.state, shutdown).await?;
        Ok(())
    }
}
