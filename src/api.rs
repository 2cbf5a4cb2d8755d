//! Catalog API
//!
//! Fetches the provider record list through the site's proxy endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::models::{deserialize_records, RemoteRecord};

/// Transport-level failure of a catalog fetch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("catalog request failed with status {status}{}", message_suffix(.message))]
    Status { status: u16, message: Option<String> },
    #[error("malformed catalog response: {0}")]
    Decode(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default()
}

/// Anything that can produce the provider record list
#[async_trait(?Send)]
pub trait CatalogSource {
    async fn fetch(&self) -> Result<Vec<RemoteRecord>, FetchError>;
}

#[derive(Deserialize)]
struct GamesBody {
    #[serde(deserialize_with = "deserialize_records")]
    games: Vec<RemoteRecord>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Interpret a proxy response. Any non-2xx status is a failure.
pub fn decode_response(status: u16, body: &str) -> Result<Vec<RemoteRecord>, FetchError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error);
        return Err(FetchError::Status { status, message });
    }
    serde_json::from_str::<GamesBody>(body)
        .map(|b| b.games)
        .map_err(|e| FetchError::Decode(e.to_string()))
}

fn js_error(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// `fetch()` against the catalog proxy. Cross-origin endpoints need CORS on
/// the proxy side.
#[derive(Debug, Clone)]
pub struct HttpSource {
    endpoint: String,
}

impl HttpSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }
}

#[async_trait(?Send)]
impl CatalogSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<RemoteRecord>, FetchError> {
        let window = web_sys::window().ok_or_else(|| FetchError::Network("no window".to_string()))?;

        let opts = RequestInit::new();
        opts.set_method("GET");

        let request = Request::new_with_str_and_init(&self.endpoint, &opts)
            .map_err(|e| FetchError::Network(js_error(e)))?;
        request
            .headers()
            .set("Accept", "application/json")
            .map_err(|e| FetchError::Network(js_error(e)))?;

        log::debug!("[API] GET {}", self.endpoint);
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| FetchError::Network(js_error(e)))?
            .dyn_into()
            .map_err(|e| FetchError::Network(js_error(e)))?;

        let status = response.status();
        let text = response.text().map_err(|e| FetchError::Network(js_error(e)))?;
        let body = JsFuture::from(text)
            .await
            .map_err(|e| FetchError::Network(js_error(e)))?
            .as_string()
            .unwrap_or_default();

        decode_response(status, &body)
    }
}
