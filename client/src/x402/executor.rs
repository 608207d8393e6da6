use http::StatusCode;
use log::{info, warn};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

use crate::request::RequestSpec;

/// Classified response of one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 2xx. The body is parsed JSON, or `{ "data": <text> }` when it is not JSON.
    Success(Value),
    /// 402 with the raw, still unparsed payment requirements body.
    PaymentRequired(String),
    /// Any other non-2xx status.
    HttpError { status: StatusCode, body: String },
}

/// Performs a single HTTP call and classifies the response. Holds no state between calls.
#[derive(Clone, Debug)]
pub struct RequestExecutor {
    client: Client,
    timeout: Option<Duration>,
}

impl RequestExecutor {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut this = self.clone();
        this.timeout = Some(timeout);
        this
    }

    /// Transport failures are returned as-is; the caller decides which phase they belong to.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<Outcome, reqwest::Error> {
        let mut req = self
            .client
            .request(spec.method().into(), spec.url().clone())
            .headers(spec.headers().clone());
        if let Some(body) = spec.body() {
            req = req.body(body.to_string());
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        info!("Making {} request to: {}", spec.method(), spec.url());
        let response = req.send().await?;
        let status = response.status();
        info!("Response status: {}", status);

        let text = response.text().await?;
        if status == StatusCode::PAYMENT_REQUIRED {
            return Ok(Outcome::PaymentRequired(text));
        }
        if !status.is_success() {
            return Ok(Outcome::HttpError { status, body: text });
        }

        let body = match serde_json::from_str::<Value>(&text) {
            Ok(body) => body,
            Err(_) => {
                warn!("Response is not JSON: {}", text);
                json!({ "data": text })
            }
        };
        Ok(Outcome::Success(body))
    }
}
