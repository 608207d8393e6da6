pub mod batch;
pub mod error;
pub mod request;
pub mod x402;

pub use error::{BatchError, Phase, X402RequestError};
pub use request::{Identity, IdentityScheme, Method, RequestSpec};
