// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use async_trait::async_trait;
use reqwest::Client;

use super::{parse_retry_after, CallbackClient, CallbackOutcome, CallbackRequest};

/// Posts trigger-completion callbacks via `reqwest`, per SPEC_FULL.md §4.7.
#[derive(Clone)]
pub struct ReqwestCallbackClient {
    client: Client,
}

impl Default for ReqwestCallbackClient {
    fn default() -> Self {
        Self { client: Client::new() }
    }
}

impl ReqwestCallbackClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CallbackClient for ReqwestCallbackClient {
    async fn post(&self, request: CallbackRequest) -> CallbackOutcome {
        let url = request.url();
        let timeout = request.timeout;
        let body = request.body();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&request.token)
            .header("content-type", "application/json")
            .timeout(timeout)
            .json(&body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return CallbackOutcome::Retry {
                    error_code: "CALLBACK_REQUEST_TIMEOUT".to_string(),
                    retry_after_ms: None,
                }
            }
            Err(_) => {
                return CallbackOutcome::Retry {
                    error_code: "CALLBACK_NETWORK_ERROR".to_string(),
                    retry_after_ms: None,
                }
            }
        };

        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        if status.is_success() {
            return CallbackOutcome::Delivered;
        }

        let code = status.as_u16();
        if code == 408 || code == 409 || code == 429 || status.is_server_error() {
            CallbackOutcome::Retry {
                error_code: "CALLBACK_HTTP_RETRYABLE".to_string(),
                retry_after_ms,
            }
        } else {
            CallbackOutcome::Failed {
                error_code: "CALLBACK_HTTP_FATAL".to_string(),
            }
        }
    }
}
