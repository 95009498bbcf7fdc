//! Protocol client for the external sandbox compiler service.

use std::time::Duration;

use async_trait::async_trait;
use common::{ExecuteRequest, ExecuteResponse};
use tracing::{instrument, warn};

use crate::config::SandboxConfig;

/// Executes one `(code, input, timeout)` triple in the sandbox.
///
/// Implementations never fail: transport trouble is folded into the
/// `CANT_CONNECT_TO_COMPILER` sentinel so each caller can decide whether that
/// is fatal (verification) or just a failed test case (judging).
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, request: ExecuteRequest) -> ExecuteResponse;
}

/// HTTP client to the sandbox service.
pub struct SandboxClient {
    client: reqwest::Client,
    config: SandboxConfig,
}

impl SandboxClient {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn execute_url(&self) -> String {
        format!("{}/execute", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CodeExecutor for SandboxClient {
    #[instrument(skip(self, request), fields(timeout = request.timeout))]
    async fn execute(&self, request: ExecuteRequest) -> ExecuteResponse {
        // Round trip is bounded by the run's own budget plus a fixed
        // transport margin; past that the sandbox counts as unreachable.
        let deadline =
            Duration::from_millis(request.timeout + self.config.transport_margin_ms);

        let response = match self
            .client
            .post(self.execute_url())
            .timeout(deadline)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Sandbox request failed");
                return ExecuteResponse::cant_connect();
            }
        };

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Sandbox returned an error status");
                return ExecuteResponse::cant_connect();
            }
        };

        match response.json::<ExecuteResponse>().await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Sandbox response was malformed");
                ExecuteResponse::cant_connect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_sandbox_yields_sentinel() {
        // Port 1 is never listening; the client must degrade to the
        // sentinel instead of erroring.
        let client = SandboxClient::new(SandboxConfig {
            url: "http://127.0.0.1:1".into(),
            transport_margin_ms: 200,
            max_concurrency: 4,
        });

        let response = client
            .execute(ExecuteRequest {
                input: String::new(),
                code: "int main() { return 0; }".into(),
                timeout: 100,
            })
            .await;

        assert!(response.is_infra_failure());
        assert_eq!(response.used_time, -1);
    }

    #[test]
    fn test_execute_url_normalizes_trailing_slash() {
        let client = SandboxClient::new(SandboxConfig {
            url: "http://sandbox:9000/".into(),
            transport_margin_ms: 0,
            max_concurrency: 1,
        });
        assert_eq!(client.execute_url(), "http://sandbox:9000/execute");
    }
}
