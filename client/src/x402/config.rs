use envconfig::Envconfig;
use url::Url;

#[derive(Envconfig, Debug, Clone)]
pub struct X402Config {
    #[envconfig(from = "X402_WALLET_API_URL", default = "https://api.agnicpay.xyz/")]
    pub wallet_api_url: Url,

    /// Per-request transport timeout. Unset means the transport default.
    #[envconfig(from = "X402_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,
}
