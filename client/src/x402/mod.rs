use log::info;
use reqwest::Client;
use std::time::Duration;

mod config;
mod executor;
mod model;
mod signer;

pub use config::X402Config;
pub use executor::{Outcome, RequestExecutor};
pub use model::{PaymentAuthorization, PaymentReceipt, RequestResult};
pub use signer::WalletSigningClient;

use crate::{
    error::{Phase, X402RequestError},
    request::{Identity, RequestSpec},
};

/// Payment-aware HTTP client: one request, at most one payment, at most one retry.
#[derive(Clone, Debug)]
pub struct X402Client {
    executor: RequestExecutor,
    signer: WalletSigningClient,
}

impl X402Client {
    pub fn new(executor: RequestExecutor, signer: WalletSigningClient) -> Self {
        Self { executor, signer }
    }

    pub fn from_config(config: &X402Config) -> Result<Self, X402RequestError> {
        let client = Client::new();
        let mut executor = RequestExecutor::new(client.clone());
        let mut signer = WalletSigningClient::try_new(config.wallet_api_url.clone(), client)?;
        if let Some(secs) = config.request_timeout_secs {
            let timeout = Duration::from_secs(secs);
            executor = executor.with_timeout(timeout);
            signer = signer.with_timeout(timeout);
        }
        Ok(Self::new(executor, signer))
    }

    /// Runs the request, paying for it once through the wallet service if the endpoint answers 402.
    ///
    /// A second 402 after paying is treated as a failure; the protocol never negotiates twice.
    pub async fn perform_payment_aware_request(
        &self,
        spec: &RequestSpec,
        identity: &Identity,
    ) -> Result<RequestResult, X402RequestError> {
        identity.auth_header()?;

        let outcome = self
            .executor
            .execute(spec)
            .await
            .map_err(|source| X402RequestError::Network {
                phase: Phase::Request,
                source,
            })?;

        let raw_requirements = match outcome {
            Outcome::Success(body) => return Ok(RequestResult::free(body)),
            Outcome::HttpError { status, body } => {
                return Err(X402RequestError::Http { status, body });
            }
            Outcome::PaymentRequired(raw_requirements) => raw_requirements,
        };

        info!("402 Payment Required detected, parsing payment requirements...");
        let authorization = self
            .signer
            .negotiate(&raw_requirements, identity, spec)
            .await?;

        info!("Retrying request with X402 payment header...");
        let retry = spec.with_payment_header(authorization.payment_header.clone());
        let retry_outcome =
            self.executor
                .execute(&retry)
                .await
                .map_err(|source| X402RequestError::Network {
                    phase: Phase::PaidRequest,
                    source,
                })?;

        match retry_outcome {
            Outcome::Success(body) => Ok(RequestResult::paid(body, &authorization)),
            Outcome::PaymentRequired(body) => Err(X402RequestError::PostPaymentRequestFailed {
                status: http::StatusCode::PAYMENT_REQUIRED,
                body,
            }),
            Outcome::HttpError { status, body } => {
                Err(X402RequestError::PostPaymentRequestFailed { status, body })
            }
        }
    }
}
