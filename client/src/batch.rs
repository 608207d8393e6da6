use std::collections::BTreeMap;

use log::{error, info};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    error::{BatchError, X402RequestError},
    request::{Identity, Method, RequestSpec},
    x402::X402Client,
};

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

/// Headers as either a `{ name: value }` object or a `[{ name, value }]` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Headers {
    Map(BTreeMap<String, String>),
    List(Vec<HeaderEntry>),
}

impl Default for Headers {
    fn default() -> Self {
        Headers::Map(BTreeMap::new())
    }
}

/// One request of a batch, as read from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestItem {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub body: Option<Value>,
}

fn default_method() -> String {
    Method::Get.to_string()
}

impl RequestItem {
    /// The body is only used for POST and PUT. A string body is parsed as JSON text.
    pub fn into_spec(self) -> Result<RequestSpec, X402RequestError> {
        let method: Method = self.method.parse()?;
        let mut spec = RequestSpec::new(method, &self.url)?;

        let headers: Vec<(String, String)> = match self.headers {
            Headers::Map(map) => map.into_iter().collect(),
            Headers::List(list) => list.into_iter().map(|h| (h.name, h.value)).collect(),
        };
        for (name, value) in headers {
            spec = spec.with_header(&name, &value)?;
        }

        if method.carries_body()
            && let Some(body) = self.body
        {
            let body = match body {
                Value::String(text) => serde_json::from_str(&text).map_err(|e| {
                    X402RequestError::InvalidRequest(format!("body is not valid JSON: {e}"))
                })?,
                other => other,
            };
            spec = spec.with_body(body)?;
        }

        Ok(spec)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(RequestItem),
    Many(Vec<RequestItem>),
}

/// Parses a single request object or an array of them.
pub fn parse_items(text: &str) -> Result<Vec<RequestItem>, serde_json::Error> {
    Ok(match serde_json::from_str(text)? {
        OneOrMany::One(item) => vec![item],
        OneOrMany::Many(items) => items,
    })
}

/// Runs each item as an independent payment-aware request, in order.
///
/// With `continue_on_fail` a failed item yields `{ "error": <message> }` and the batch goes on;
/// otherwise the first failure stops the batch.
pub async fn run_batch(
    client: &X402Client,
    identity: &Identity,
    items: Vec<RequestItem>,
    continue_on_fail: bool,
) -> Result<Vec<Value>, BatchError> {
    let mut outputs = Vec::with_capacity(items.len());
    for (item_index, item) in items.into_iter().enumerate() {
        let result = match item.into_spec() {
            Ok(spec) => client.perform_payment_aware_request(&spec, identity).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(result) => {
                if let Some(payment) = &result.payment {
                    info!("Item {} paid {}", item_index, payment.amount_paid);
                }
                outputs.push(result.into_item_json());
            }
            Err(e) => {
                error!("Error in item {}: {}", item_index, e);
                if !continue_on_fail {
                    return Err(BatchError {
                        item_index,
                        source: e,
                    });
                }
                outputs.push(json!({ "error": e.to_string() }));
            }
        }
    }
    Ok(outputs)
}
