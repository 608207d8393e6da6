//! Client for the AgnicWallet signing service.
use chrono::Utc;
use http::HeaderValue;
use log::{debug, error, info};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::{
    error::{Phase, X402RequestError},
    request::{Identity, RequestSpec},
    x402::model::{PaymentAuthorization, RequestData, SignPaymentParams, SignPaymentResponse},
};

/// Converts 402 payment requirements into a signed payment authorization.
///
/// Makes exactly one `POST /api/sign-payment` call per negotiation and keeps no state between
/// negotiations.
#[derive(Clone, Debug)]
pub struct WalletSigningClient {
    /// Base URL of the wallet service (e.g. `https://api.agnicpay.xyz/`)
    base_url: Url,
    /// Full URL to `POST /api/sign-payment` requests
    sign_payment_url: Url,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Optional request timeout
    timeout: Option<Duration>,
}

impl WalletSigningClient {
    /// Constructs a new [`WalletSigningClient`] from a base URL.
    ///
    /// The endpoint is `{base}/api/sign-payment`, keeping any path the base already has.
    pub fn try_new(base_url: Url, client: Client) -> Result<Self, X402RequestError> {
        let mut directory = base_url.clone();
        if !directory.path().ends_with('/') {
            let path = format!("{}/", directory.path());
            directory.set_path(&path);
        }
        let sign_payment_url = directory.join("api/sign-payment").map_err(|e| {
            X402RequestError::InvalidConfiguration {
                context: "Failed to construct /api/sign-payment URL",
                source: e,
            }
        })?;
        Ok(Self {
            client,
            base_url,
            sign_payment_url,
            timeout: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sets a timeout for all future requests.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut this = self.clone();
        this.timeout = Some(timeout);
        this
    }

    /// Parses the 402 body and asks the wallet service to sign a payment for `original`.
    pub async fn negotiate(
        &self,
        raw_requirements: &str,
        identity: &Identity,
        original: &RequestSpec,
    ) -> Result<PaymentAuthorization, X402RequestError> {
        debug!("Payment requirements response: {}", raw_requirements);
        let payment_requirements: Value = serde_json::from_str(raw_requirements).map_err(|e| {
            X402RequestError::MalformedPaymentRequirements {
                body: raw_requirements.to_string(),
                source: e,
            }
        })?;

        info!("Calling AgnicWallet API at: {}", self.sign_payment_url);
        let params = SignPaymentParams {
            payment_requirements: &payment_requirements,
            request_data: RequestData::from(original),
        };
        let response = self.post_json(&params, identity).await?;

        let authorization = Self::parse_authorization(response)?;
        info!("Payment signed successfully: ${}", authorization.amount_paid);
        if let Some(envelope) = authorization.decoded_envelope() {
            debug!(
                "Payment header envelope: version={:?} scheme={:?} network={:?}",
                envelope.get("x402Version"),
                envelope.get("scheme"),
                envelope.get("network")
            );
        }
        if let Some(proof) = &authorization.proof {
            debug!("Payment proof: {}", proof);
        }

        Ok(authorization)
    }

    fn parse_authorization(body: String) -> Result<PaymentAuthorization, X402RequestError> {
        let malformed = |reason: String| X402RequestError::MalformedSigningResponse {
            body: body.clone(),
            reason,
        };

        let response: SignPaymentResponse =
            serde_json::from_str(&body).map_err(|e| malformed(e.to_string()))?;
        if !response.amount_paid.is_finite() || response.amount_paid < 0.0 {
            return Err(malformed(format!(
                "amountPaid must be a non-negative number, got {}",
                response.amount_paid
            )));
        }
        let payment_header = HeaderValue::from_str(&response.payment_header)
            .map_err(|_| malformed("paymentHeader is not a valid header value".to_string()))?;

        Ok(PaymentAuthorization {
            payment_header,
            amount_paid: response.amount_paid,
            proof: response.payment_proof.filter(|proof| !proof.is_null()),
            obtained_at: Utc::now(),
        })
    }

    /// POSTs `payload` with the identity's auth header and returns the raw 2xx body.
    async fn post_json<T>(
        &self,
        payload: &T,
        identity: &Identity,
    ) -> Result<String, X402RequestError>
    where
        T: serde::Serialize + ?Sized,
    {
        let (auth_name, auth_value) = identity.auth_header()?;
        let mut req = self
            .client
            .post(self.sign_payment_url.clone())
            .json(payload)
            .header(auth_name, auth_value);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let network = |source| X402RequestError::Network {
            phase: Phase::Signing,
            source,
        };
        let http_response = req.send().await.map_err(network)?;
        let status = http_response.status();
        let body = http_response.text().await.map_err(network)?;

        if !status.is_success() {
            error!("AgnicWallet signing failed: {}", body);
            return Err(X402RequestError::PaymentSigningFailed { status, body });
        }
        Ok(body)
    }
}
