use std::{fmt, str::FromStr};

use http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::Serialize;
use serde_json::{Value, json};
use url::Url;

use crate::error::X402RequestError;

/// Header carrying the payment authorization on the retried request.
pub const X_PAYMENT: HeaderName = HeaderName::from_static("x-payment");

/// Header used by the wallet signing service for API-key authentication.
pub const X_AGNIC_TOKEN: HeaderName = HeaderName::from_static("x-agnic-token");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// POST and PUT carry a JSON body, GET and DELETE never do.
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = X402RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(X402RequestError::InvalidRequest(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

/// An immutable description of one outbound call.
///
/// Construction enforces the request invariants: the URL is an absolute `http(s)` URL, and a body
/// is present exactly when the method is POST or PUT (defaulting to `{}`). `Content-Type:
/// application/json` is sent unless the caller overrides it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Value>,
}

impl RequestSpec {
    pub fn new(method: Method, url: &str) -> Result<Self, X402RequestError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(X402RequestError::InvalidRequest("URL is required".into()));
        }
        let url = Url::parse(url)
            .map_err(|e| X402RequestError::InvalidRequest(format!("invalid URL {url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(X402RequestError::InvalidRequest(format!(
                "unsupported URL scheme: {}",
                url.scheme()
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            method,
            url,
            headers,
            body: method.carries_body().then(|| json!({})),
        })
    }

    /// Adds or replaces a header. Caller values override the protocol defaults.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, X402RequestError> {
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|e| {
            X402RequestError::InvalidRequest(format!("invalid header name {name:?}: {e}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            X402RequestError::InvalidRequest(format!("invalid value for header {name}: {e}"))
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn with_body(mut self, body: Value) -> Result<Self, X402RequestError> {
        if !self.method.carries_body() {
            return Err(X402RequestError::InvalidRequest(format!(
                "{} requests cannot carry a body",
                self.method
            )));
        }
        self.body = Some(body);
        Ok(self)
    }

    /// Derived copy for the paid retry. `X-PAYMENT` always wins over a caller-supplied value.
    pub fn with_payment_header(&self, payment_header: HeaderValue) -> Self {
        let mut retry = self.clone();
        retry.headers.insert(X_PAYMENT, payment_header);
        retry
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityScheme {
    OAuth2,
    ApiKey,
}

impl FromStr for IdentityScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oauth2" => Ok(IdentityScheme::OAuth2),
            "apikey" => Ok(IdentityScheme::ApiKey),
            other => Err(format!(
                "unknown authentication scheme {other:?}, expected oauth2 or apiKey"
            )),
        }
    }
}

/// Credential used to authenticate against the wallet signing service.
#[derive(Clone, PartialEq, Eq)]
pub enum Identity {
    /// OAuth2 access token, sent as `Authorization: Bearer <token>`.
    OAuth2(String),
    /// API token, sent as `X-Agnic-Token: <token>`.
    ApiKey(String),
}

impl Identity {
    /// Fails when the credential cannot be sent as a header value.
    pub fn new(
        scheme: IdentityScheme,
        credential: impl Into<String>,
    ) -> Result<Self, X402RequestError> {
        let identity = match scheme {
            IdentityScheme::OAuth2 => Identity::OAuth2(credential.into()),
            IdentityScheme::ApiKey => Identity::ApiKey(credential.into()),
        };
        identity.auth_header()?;
        Ok(identity)
    }

    pub fn scheme(&self) -> IdentityScheme {
        match self {
            Identity::OAuth2(_) => IdentityScheme::OAuth2,
            Identity::ApiKey(_) => IdentityScheme::ApiKey,
        }
    }

    pub(crate) fn auth_header(&self) -> Result<(HeaderName, HeaderValue), X402RequestError> {
        let (name, raw) = match self {
            Identity::OAuth2(token) => (AUTHORIZATION, format!("Bearer {token}")),
            Identity::ApiKey(token) => (X_AGNIC_TOKEN, token.clone()),
        };
        let mut value = HeaderValue::from_str(&raw).map_err(|_| {
            X402RequestError::InvalidRequest("credential is not a valid header value".into())
        })?;
        value.set_sensitive(true);
        Ok((name, value))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::OAuth2(_) => f.write_str("Identity::OAuth2(***)"),
            Identity::ApiKey(_) => f.write_str("Identity::ApiKey(***)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_defaults_to_empty_object_body() {
        let spec = RequestSpec::new(Method::Post, "https://api.example.com/data").unwrap();
        assert_eq!(spec.body(), Some(&json!({})));

        let spec = RequestSpec::new(Method::Get, "https://api.example.com/data").unwrap();
        assert_eq!(spec.body(), None);
    }

    #[test]
    fn get_and_delete_reject_a_body() {
        let err = RequestSpec::new(Method::Delete, "https://api.example.com/data")
            .unwrap()
            .with_body(json!({"q": "x"}))
            .unwrap_err();
        assert!(matches!(err, X402RequestError::InvalidRequest(_)));
    }

    #[test]
    fn url_must_be_absolute_http() {
        assert!(RequestSpec::new(Method::Get, "").is_err());
        assert!(RequestSpec::new(Method::Get, "/relative/path").is_err());
        assert!(RequestSpec::new(Method::Get, "ftp://example.com/file").is_err());
    }

    #[test]
    fn caller_headers_override_content_type() {
        let spec = RequestSpec::new(Method::Put, "https://api.example.com/data")
            .unwrap()
            .with_header("Content-Type", "text/plain")
            .unwrap();
        assert_eq!(spec.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(spec.headers().len(), 1);
    }

    #[test]
    fn payment_header_overrides_caller_value_on_derived_copy() {
        let spec = RequestSpec::new(Method::Get, "https://api.example.com/data")
            .unwrap()
            .with_header("X-PAYMENT", "forged")
            .unwrap();
        let retry = spec.with_payment_header(HeaderValue::from_static("b64token"));

        assert_eq!(retry.headers()[X_PAYMENT], "b64token");
        assert_eq!(spec.headers()[X_PAYMENT], "forged");
        assert_eq!(retry.headers().len(), spec.headers().len());
    }

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert!("PATCH".parse::<Method>().is_err());
        assert_eq!(serde_json::to_value(Method::Delete).unwrap(), json!("DELETE"));
    }

    #[test]
    fn identity_selects_auth_header_by_scheme() {
        let (name, value) = Identity::new(IdentityScheme::OAuth2, "tok").unwrap()
            .auth_header()
            .unwrap();
        assert_eq!(name, AUTHORIZATION);
        assert_eq!(value, "Bearer tok");
        assert!(value.is_sensitive());

        let (name, value) = Identity::new(IdentityScheme::ApiKey, "agnic_tok_sk").unwrap()
            .auth_header()
            .unwrap();
        assert_eq!(name, X_AGNIC_TOKEN);
        assert_eq!(value, "agnic_tok_sk");
    }

    #[test]
    fn identity_rejects_credential_that_is_not_a_header_value() {
        let err = Identity::new(IdentityScheme::ApiKey, "tok\nen").unwrap_err();
        assert!(matches!(err, X402RequestError::InvalidRequest(_)));
        assert!(Identity::new(IdentityScheme::OAuth2, "tok\u{7f}").is_err());
    }

    #[test]
    fn identity_scheme_accepts_both_spellings() {
        assert_eq!("oAuth2".parse::<IdentityScheme>().unwrap(), IdentityScheme::OAuth2);
        assert_eq!("apiKey".parse::<IdentityScheme>().unwrap(), IdentityScheme::ApiKey);
        assert!("basic".parse::<IdentityScheme>().is_err());
    }

    #[test]
    fn identity_debug_redacts_credential() {
        let identity = Identity::ApiKey("secret".to_string());
        assert!(!format!("{identity:?}").contains("secret"));
    }
}
