use std::fmt;

use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Request,
    Signing,
    PaidRequest,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Request => "request",
            Phase::Signing => "payment signing",
            Phase::PaidRequest => "paid request",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum X402RequestError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {context}: {source}")]
    InvalidConfiguration {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("Network error during {phase}: {source}")]
    Network {
        phase: Phase,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request failed ({status}): {body}")]
    Http { status: StatusCode, body: String },

    #[error("Failed to parse payment requirements: {source}. Response: {body}")]
    MalformedPaymentRequirements {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Payment signing failed ({status}): {body}")]
    PaymentSigningFailed { status: StatusCode, body: String },

    #[error("Malformed signing response: {reason}. Response: {body}")]
    MalformedSigningResponse { body: String, reason: String },

    #[error("Request failed after payment ({status}): {body}")]
    PostPaymentRequestFailed { status: StatusCode, body: String },
}

#[derive(Error, Debug)]
#[error("Item {item_index}: {source}")]
pub struct BatchError {
    pub item_index: usize,
    #[source]
    pub source: X402RequestError,
}

impl X402RequestError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            X402RequestError::Http { status, .. }
            | X402RequestError::PaymentSigningFailed { status, .. }
            | X402RequestError::PostPaymentRequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `None` for errors raised before any network activity.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            X402RequestError::InvalidRequest(_) | X402RequestError::InvalidConfiguration { .. } => {
                None
            }
            X402RequestError::Network { phase, .. } => Some(*phase),
            X402RequestError::Http { .. } => Some(Phase::Request),
            X402RequestError::MalformedPaymentRequirements { .. }
            | X402RequestError::PaymentSigningFailed { .. }
            | X402RequestError::MalformedSigningResponse { .. } => Some(Phase::Signing),
            X402RequestError::PostPaymentRequestFailed { .. } => Some(Phase::PaidRequest),
        }
    }
}
