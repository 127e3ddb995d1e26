use std::sync::Arc;

use anyhow::Result;
use shared::{
    error::RequestError,
    protocol::{HealthResponse, ServiceRequest},
};
use tracing::info;

pub mod config;
pub mod normalizer;
pub mod options;
pub mod orchestrator;
pub mod transport;

pub use config::ClientConfig;
pub use options::OptionProvider;
pub use orchestrator::{Completion, Orchestrator, RequestState, StateChanged};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};

/// One application session against the analysis service: a single transport
/// shared by the request orchestrator and the option provider.
pub struct AnalysisClient {
    transport: Arc<dyn Transport>,
    orchestrator: Arc<Orchestrator>,
    options: OptionProvider,
}

impl AnalysisClient {
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        info!(
            base_url = %config.base_url(),
            timeout_secs = config.request_timeout().as_secs(),
            "configuring analysis service client"
        );
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config)?);
        Ok(Self::with_transport(transport))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            orchestrator: Orchestrator::new(transport.clone()),
            options: OptionProvider::new(transport.clone()),
            transport,
        }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn options(&self) -> &OptionProvider {
        &self.options
    }

    /// Liveness probe; not used by the analysis flow.
    pub async fn health(&self) -> Result<HealthResponse, RequestError> {
        let raw = self.transport.send(ServiceRequest::Health).await?;
        Ok(raw.decode()?)
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
