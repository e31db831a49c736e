//! Typed client for the sales report gateway
//!
//! Agents call the report endpoints through an API gateway that expects a
//! subscription key in the `api-key` header. Every request also carries a
//! fresh `Request-Id` so gateway and server logs can be correlated.
//!
//! ```rust,no_run
//! # async fn run() -> salesgate_client::Result<()> {
//! use salesgate_client::GatewayClient;
//!
//! let client = GatewayClient::from_env()?;
//! let north = client.sales_by_region(Some("North")).await?;
//! let top = client.top_customers(Some(5)).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use error::{ClientError, Result};

use salesgate_db::{Catalog, Dialect, Period, ResultRow};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;
use uuid::Uuid;

pub const GATEWAY_URL_ENV: &str = "APIM_GATEWAY_URL";
pub const SUBSCRIPTION_KEY_ENV: &str = "APIM_SUBSCRIPTION_KEY";

const API_KEY_HEADER: &str = "api-key";
const REQUEST_ID_HEADER: &str = "Request-Id";

#[derive(Deserialize)]
struct ResultsEnvelope {
    results: Vec<ResultRow>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
    #[serde(default)]
    details: Value,
}

pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
    subscription_key: SecretString,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    pub fn new(base_url: &str, subscription_key: impl Into<String>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            subscription_key: SecretString::from(subscription_key.into()),
        })
    }

    /// Build from `APIM_GATEWAY_URL` and `APIM_SUBSCRIPTION_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ClientError::MissingConfig(format!("{name} is not set")))
        };
        Self::new(&required(GATEWAY_URL_ENV)?, required(SUBSCRIPTION_KEY_ENV)?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn sales_by_region(&self, region_name: Option<&str>) -> Result<Vec<ResultRow>> {
        self.post_report("sql/sales/regions", optional("region_name", region_name))
            .await
    }

    pub async fn sales_by_category(&self) -> Result<Vec<ResultRow>> {
        self.post_report("sql/sales/by-category", json!({})).await
    }

    pub async fn sales_by_channel(&self) -> Result<Vec<ResultRow>> {
        self.post_report("sql/sales/by-channel", json!({})).await
    }

    /// Customers ranked by spend; the gateway returns 10 when `limit` is `None`.
    pub async fn top_customers(&self, limit: Option<u32>) -> Result<Vec<ResultRow>> {
        let payload = match limit {
            Some(limit) => json!({ "limit": limit }),
            None => json!({}),
        };
        self.post_report("sql/customers/top", payload).await
    }

    pub async fn product_performance(&self) -> Result<Vec<ResultRow>> {
        self.post_report("sql/products/performance", json!({})).await
    }

    pub async fn product_sales(&self, product_category: Option<&str>) -> Result<Vec<ResultRow>> {
        self.post_report("sql/sales/products", optional("product_category", product_category))
            .await
    }

    pub async fn customer_sales(&self, customer_type: Option<&str>) -> Result<Vec<ResultRow>> {
        self.post_report("sql/sales/customers", optional("customer_type", customer_type))
            .await
    }

    pub async fn sales_over_time(&self, period: Period) -> Result<Vec<ResultRow>> {
        self.post_report("sql/sales/time-series", json!({ "period_type": period }))
            .await
    }

    /// Schema and report summary, as JSON text, for an agent's instructions.
    pub fn database_info(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(
            &Catalog::new(Dialect::SqlServer).describe(),
        )?)
    }

    async fn post_report(&self, path: &str, payload: Value) -> Result<Vec<ResultRow>> {
        let url = self.base_url.join(path)?;
        let request_id = Uuid::new_v4().to_string();
        tracing::debug!(%url, %request_id, "Calling report endpoint");

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, self.subscription_key.expose_secret())
            .header(REQUEST_ID_HEADER, &request_id)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let envelope: ResultsEnvelope = serde_json::from_str(&body)?;
            tracing::debug!(%request_id, rows = envelope.results.len(), "Report received");
            return Ok(envelope.results);
        }

        tracing::warn!(%request_id, status = status.as_u16(), "Report request failed");
        Err(decode_error(status.as_u16(), body))
    }
}

fn optional(key: &str, value: Option<&str>) -> Value {
    let mut payload = Map::new();
    if let Some(value) = value {
        payload.insert(key.to_string(), Value::String(value.to_string()));
    }
    Value::Object(payload)
}

fn decode_error(status: u16, body: String) -> ClientError {
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => ClientError::Gateway {
            status,
            error: envelope.error,
            details: match envelope.details {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            },
        },
        Err(_) => ClientError::UnexpectedStatus { status, body },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let client = GatewayClient::new("https://gateway.example.net/sales", "key").unwrap();
        assert_eq!(
            client.base_url.join("sql/sales/regions").unwrap().as_str(),
            "https://gateway.example.net/sales/sql/sales/regions"
        );
    }

    #[test]
    fn test_from_lookup_requires_both_values() {
        let err = GatewayClient::from_lookup(|key| match key {
            GATEWAY_URL_ENV => Some("https://gateway.example.net".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, ClientError::MissingConfig(msg) if msg.contains(SUBSCRIPTION_KEY_ENV)));
    }

    #[test]
    fn test_debug_hides_key() {
        let client = GatewayClient::new("https://gateway.example.net", "very-secret").unwrap();
        assert!(!format!("{client:?}").contains("very-secret"));
    }

    #[test]
    fn test_decode_error_envelope() {
        let err = decode_error(
            500,
            r#"{"error": "Error getting top customers", "details": "timeout"}"#.to_string(),
        );
        assert!(matches!(
            err,
            ClientError::Gateway { status: 500, ref error, ref details }
                if error == "Error getting top customers" && details == "timeout"
        ));

        let err = decode_error(502, "Bad Gateway".to_string());
        assert!(matches!(err, ClientError::UnexpectedStatus { status: 502, .. }));
    }

    #[test]
    fn test_database_info_lists_schema() {
        let client = GatewayClient::new("https://gateway.example.net", "key").unwrap();
        let info: Value = serde_json::from_str(&client.database_info().unwrap()).unwrap();
        assert_eq!(info["Tables"][3]["Name"], "SalesData");
        assert_eq!(info["Functions"][3]["Name"], "get_top_customers");
    }

    #[tokio::test]
    async fn test_sends_gateway_headers() {
        let seen: Arc<Mutex<Vec<(HeaderMap, Value)>>> = Arc::default();
        let captured = seen.clone();
        let app = Router::new().route(
            "/sql/sales/regions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    captured.lock().unwrap().push((headers, body));
                    Json(json!({"results": [{"RegionName": "North", "TotalSales": 10.5}]}))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = GatewayClient::new(&format!("http://{addr}"), "sub-key").unwrap();
        let rows = client.sales_by_region(Some("North")).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("TotalSales"), Some(&json!(10.5)));

        let seen = seen.lock().unwrap();
        let (headers, body) = &seen[0];
        assert_eq!(headers["api-key"], "sub-key");
        assert!(Uuid::parse_str(headers["request-id"].to_str().unwrap()).is_ok());
        assert_eq!(body, &json!({"region_name": "North"}));
    }
}
