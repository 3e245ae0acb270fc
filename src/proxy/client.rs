//! Control4 proxy command client
//!
//! The proxy exposes device state as numbered variables behind a single
//! GET endpoint:
//!
//! `<base_url>?command={get|set}&proxyID=<id>&variableID=<var>[&newValue=<v>]`
//!
//! `get` answers with a JSON object keyed by variable id. `set` answers are
//! not validated unless strict validation is enabled.

use reqwest::{Client, StatusCode};

use crate::error::ProxyError;
use crate::models::ProxyCoordinates;

/// Issues `get`/`set` commands against a device's proxy coordinates
#[derive(Clone)]
pub struct ProxyCommandClient {
    http_client: Client,
    strict_response_validation: bool,
}

impl ProxyCommandClient {
    pub fn new(strict_response_validation: bool) -> Self {
        Self::with_client(
            Client::builder().build().unwrap_or_default(),
            strict_response_validation,
        )
    }

    pub fn with_client(http_client: Client, strict_response_validation: bool) -> Self {
        Self {
            http_client,
            strict_response_validation,
        }
    }

    /// Read the current value of a proxy variable
    pub async fn fetch_variable(
        &self,
        coords: &ProxyCoordinates,
        variable_id: u32,
    ) -> Result<i64, ProxyError> {
        let variable = variable_id.to_string();
        let response = self
            .http_client
            .get(coords.base_url.clone())
            .query(&[
                ("command", "get"),
                ("proxyID", coords.proxy_id.as_str()),
                ("variableID", variable.as_str()),
            ])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(ProxyError::EmptyResult {
                variable_id,
                reason: format!("HTTP {}", response.status().as_u16()),
            });
        }

        let body = response.text().await?;
        let data: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| ProxyError::EmptyResult {
                variable_id,
                reason: format!("invalid JSON: {}", e),
            })?;

        decode_variable(&data, &variable).ok_or_else(|| ProxyError::EmptyResult {
            variable_id,
            reason: format!("no integer value at key {:?}", variable),
        })
    }

    /// Write a new value to a proxy variable
    ///
    /// Any completed round trip counts as success unless strict response
    /// validation is on, in which case a non-2xx status is `Rejected`.
    pub async fn set_variable(
        &self,
        coords: &ProxyCoordinates,
        variable_id: u32,
        new_value: i64,
    ) -> Result<(), ProxyError> {
        let variable = variable_id.to_string();
        let value = new_value.to_string();
        let response = self
            .http_client
            .get(coords.base_url.clone())
            .query(&[
                ("command", "set"),
                ("proxyID", coords.proxy_id.as_str()),
                ("variableID", variable.as_str()),
                ("newValue", value.as_str()),
            ])
            .send()
            .await?;

        tracing::debug!(
            "[Proxy] set proxyID={} variableID={} newValue={} -> HTTP {}",
            coords.proxy_id,
            variable_id,
            new_value,
            response.status().as_u16()
        );

        if self.strict_response_validation && !response.status().is_success() {
            return Err(ProxyError::Rejected {
                variable_id,
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

/// Extract an integer at `key`, accepting numbers and numeric strings
fn decode_variable(data: &serde_json::Value, key: &str) -> Option<i64> {
    match data.get(key)? {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
