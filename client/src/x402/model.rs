use base64::{Engine, prelude::BASE64_STANDARD};
use chrono::{DateTime, SecondsFormat, Utc};
use http::HeaderValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use url::Url;

use crate::request::{Method, RequestSpec};

/// Body of `POST /api/sign-payment`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignPaymentParams<'a> {
    pub payment_requirements: &'a Value,
    pub request_data: RequestData<'a>,
}

/// The original request's target and payload, so the signature is bound to exactly that call.
#[derive(Debug, Clone, Serialize)]
pub struct RequestData<'a> {
    pub url: &'a Url,
    pub method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a Value>,
}

impl<'a> From<&'a RequestSpec> for RequestData<'a> {
    fn from(spec: &'a RequestSpec) -> Self {
        Self {
            url: spec.url(),
            method: spec.method(),
            body: spec.body(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignPaymentResponse {
    pub payment_header: String,
    #[serde(default)]
    pub payment_proof: Option<Value>,
    pub amount_paid: f64,
}

/// A signed payment, ready to be attached to the retried request.
#[derive(Debug, Clone)]
pub struct PaymentAuthorization {
    pub payment_header: HeaderValue,
    pub amount_paid: f64,
    pub proof: Option<Value>,
    pub obtained_at: DateTime<Utc>,
}

impl PaymentAuthorization {
    /// Best-effort decode of the x402 envelope inside the payment header, for diagnostics only.
    pub fn decoded_envelope(&self) -> Option<Value> {
        let bytes = BASE64_STANDARD.decode(self.payment_header.as_bytes()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub amount_paid: f64,
    pub timestamp: DateTime<Utc>,
}

/// Final outcome of one payment-aware request. `payment` is `None` when the endpoint was free.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestResult {
    pub body: Value,
    pub payment: Option<PaymentReceipt>,
}

impl RequestResult {
    pub fn free(body: Value) -> Self {
        Self {
            body,
            payment: None,
        }
    }

    pub fn paid(body: Value, authorization: &PaymentAuthorization) -> Self {
        Self {
            body,
            payment: Some(PaymentReceipt {
                amount_paid: authorization.amount_paid,
                timestamp: authorization.obtained_at,
            }),
        }
    }

    pub fn payment_made(&self) -> bool {
        self.payment.is_some()
    }

    /// Workflow item output: the body as-is for free calls, or the body's fields merged with an
    /// `_agnicWallet` payment summary for paid ones.
    pub fn into_item_json(self) -> Value {
        let Some(payment) = self.payment else {
            return self.body;
        };
        let mut fields = match self.body {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        fields.insert(
            "_agnicWallet".to_string(),
            json!({
                "paymentMade": true,
                "amountPaid": payment.amount_paid,
                "timestamp": payment.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
        );
        Value::Object(fields)
    }
}
