use async_trait::async_trait;
use panbridge_core::{ConnectivityConfig, ConnectivityProbe, PanBridgeError, Result};
use std::time::Duration;
use tracing::debug;

/// Reachability check by HTTP request to a well-known host.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
    attempts: u32,
}

impl HttpProbe {
    pub fn new(settings: &ConnectivityConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| PanBridgeError::network("build connectivity probe", e))?;

        Ok(Self {
            client,
            url: settings.url.clone(),
            attempts: settings.attempts.max(1),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn is_internet_reachable(&self) -> bool {
        for attempt in 1..=self.attempts {
            match self.client.get(&self.url).send().await {
                Ok(response) if response.status().is_success() => return true,
                Ok(response) => {
                    debug!("Probe {} attempt {}: {}", self.url, attempt, response.status())
                }
                Err(e) => debug!("Probe {} attempt {} failed: {}", self.url, attempt, e),
            }
        }
        false
    }
}
