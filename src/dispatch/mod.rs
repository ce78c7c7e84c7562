//! Work dispatch over the worker HTTP protocol
//!
//! Workers accept `POST /` with a JSON body `{"data": "<text>"}` and
//! answer `{"data": {"<word>": <count>, ...}}`. Anything else, a non-2xx
//! status, an undecodable body, a dead endpoint, counts as a dispatch
//! failure for that input.

use crate::aggregate::PartialResult;
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::provision::Endpoint;
use serde::{Deserialize, Serialize};

/// Request body sent to a worker
#[derive(Debug, Serialize)]
struct WorkRequest<'a> {
    data: &'a str,
}

/// Response body returned by a worker
#[derive(Debug, Deserialize)]
struct WorkResponse {
    data: PartialResult,
}

/// Sends input text to workers and decodes their counts
pub struct Dispatcher {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl Dispatcher {
    /// Build a dispatcher with the configured per-request timeout
    pub fn new(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(DispatchError::Client)?;

        Ok(Self {
            client,
            timeout_ms: config.timeout_ms,
        })
    }

    /// Send `text` to the worker at `endpoint` and return its counts
    pub async fn dispatch(
        &self,
        endpoint: &Endpoint,
        text: &str,
    ) -> Result<PartialResult, DispatchError> {
        let request = WorkRequest { data: text };

        let response = self
            .client
            .post(endpoint.url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_send_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status {
                endpoint: endpoint.to_string(),
                status,
            });
        }

        let decoded: WorkResponse =
            response
                .json()
                .await
                .map_err(|source| DispatchError::Decode {
                    endpoint: endpoint.to_string(),
                    source,
                })?;

        Ok(decoded.data)
    }

    fn classify_send_error(&self, endpoint: &Endpoint, error: reqwest::Error) -> DispatchError {
        if error.is_timeout() {
            DispatchError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else {
            DispatchError::Unreachable {
                endpoint: endpoint.to_string(),
                source: error,
            }
        }
    }
}
