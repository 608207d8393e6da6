use envconfig::Envconfig;
use x402_request::{IdentityScheme, x402::X402Config};

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: log::Level,

    #[envconfig(from = "AGNIC_AUTH_SCHEME", default = "oauth2")]
    pub auth_scheme: IdentityScheme,

    #[envconfig(from = "AGNIC_CREDENTIAL")]
    pub credential: String,

    #[envconfig(from = "X402_REQUEST_FILE")]
    pub request_file: String,

    #[envconfig(from = "CONTINUE_ON_FAIL", default = "false")]
    pub continue_on_fail: bool,

    #[envconfig(nested)]
    pub x402: X402Config,
}

impl Config {
    pub fn from_env() -> Result<Self, envconfig::Error> {
        Config::init_from_env()
    }
}
