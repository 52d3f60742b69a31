//! API client shared by every call site in the application.
//!
//! This module provides the `ApiClient` struct: one preconfigured
//! `reqwest::Client` plus the token store and connectivity capability the
//! request/response interception steps need.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, OfflinePolicy};
use crate::connectivity::{AlwaysOnline, Connectivity};
use crate::storage::{KeyValueStore, MemoryStore, TOKEN_KEY};

use super::{ApiError, ErrorResponse};

/// Content type every request body is encoded as
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling,
/// and the config, store and connectivity are shared the same way.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Arc<ClientConfig>,
    store: Arc<dyn KeyValueStore>,
    connectivity: Arc<dyn Connectivity>,
}

pub struct ApiClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    connectivity: Option<Arc<dyn Connectivity>>,
}

impl ApiClientBuilder {
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Missing pieces default to an in-memory store and an always-online host.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let connectivity = self
            .connectivity
            .unwrap_or_else(|| Arc::new(AlwaysOnline));
        ApiClient::new(self.config, store, connectivity)
    }
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(FORM_CONTENT_TYPE),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(config.with_credentials)
            .build()
            .map_err(ApiError::Build)?;

        debug!(
            base_url = %config.base_url,
            timeout_ms = config.timeout.as_millis() as u64,
            "API client configured"
        );

        Ok(Self {
            client,
            config: Arc::new(config),
            store,
            connectivity,
        })
    }

    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            store: None,
            connectivity: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Resolve `path` against the base URL. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }

    // ===== Verbs =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(body)).await
    }

    /// Send a request and return only the decoded payload.
    ///
    /// `Ok(None)` means the request failed without a response while the host
    /// was offline and the offline policy is `Resolve`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let builder = self.prepare(self.client.request(method.clone(), &url), body)?;

        debug!(method = %method, url = %url, "Sending request");

        match builder.send().await {
            Ok(response) => self.handle_response(response).await,
            Err(e) => self.handle_failure(e),
        }
    }

    // ===== Interception =====

    /// Attach the stored token and encode the body.
    fn prepare<B>(
        &self,
        mut builder: RequestBuilder,
        body: Option<&B>,
    ) -> Result<RequestBuilder, ApiError>
    where
        B: Serialize + ?Sized,
    {
        if let Some(token) = self.store.get_item(TOKEN_KEY)? {
            if !token.is_empty() {
                let mut value = HeaderValue::from_str(&token)?;
                value.set_sensitive(true);
                builder = builder.header(header::AUTHORIZATION, value);
            }
        }

        if let Some(body) = body {
            // Arrays and nested maps use bracket keys: tags[0]=x, outer[inner]=1
            builder = builder.body(serde_qs::to_string(&body)?);
        }

        Ok(builder)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<Option<T>, ApiError> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => return self.handle_failure(e),
            };
            debug!(status = status.as_u16(), url = %url, "Response received");
            return decode_payload(&text).map(Some);
        }

        let headers = response.headers().clone();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    status = status.as_u16(),
                    url = %url,
                    error = %e,
                    "Failed to read error response body"
                );
                String::new()
            }
        };
        debug!(status = status.as_u16(), url = %url, "Error response received");

        if status == reqwest::StatusCode::FORBIDDEN {
            self.clear_token();
        }

        Err(ApiError::from_response(ErrorResponse {
            status,
            url,
            headers,
            body,
        }))
    }

    fn handle_failure<T>(&self, error: reqwest::Error) -> Result<Option<T>, ApiError> {
        if self.connectivity.is_online() {
            return Err(ApiError::Network(error));
        }
        match self.config.offline_policy {
            OfflinePolicy::Resolve => {
                info!(error = %error, "Request failed while offline, resolving without payload");
                Ok(None)
            }
            OfflinePolicy::Reject => Err(ApiError::Offline(error)),
        }
    }

    fn clear_token(&self) {
        match self.store.remove_item(TOKEN_KEY) {
            Ok(()) => warn!("Server refused the stored token, removed it"),
            Err(e) => warn!(error = %e, "Failed to remove refused token"),
        }
    }
}

/// Decode a 2xx body. Empty bodies decode as `null`, non-JSON bodies as a string.
fn decode_payload<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    if text.trim().is_empty() {
        return serde_json::from_value(Value::Null)
            .map_err(|e| ApiError::InvalidResponse(format!("empty body: {}", e)));
    }
    match serde_json::from_str(text) {
        Ok(payload) => Ok(payload),
        Err(json_err) => serde_json::from_value(Value::String(text.to_string()))
            .map_err(|_| ApiError::InvalidResponse(json_err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;

    fn client_with_base(base_url: &str) -> ApiClient {
        let config =
            ClientConfig::for_environment(Environment::Development).with_base_url(base_url);
        ApiClient::builder(config)
            .build()
            .expect("client builds")
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let client = client_with_base("http://127.0.0.1:3000");
        assert_eq!(client.url("/users"), "http://127.0.0.1:3000/users");
        assert_eq!(client.url("users/1"), "http://127.0.0.1:3000/users/1");
        assert_eq!(client.url(""), "http://127.0.0.1:3000");

        let trailing = client_with_base("http://127.0.0.1:3000/api/");
        assert_eq!(trailing.url("//users"), "http://127.0.0.1:3000/api/users");
    }

    #[test]
    fn test_absolute_urls_pass_through() {
        let client = client_with_base("http://127.0.0.1:3000");
        assert_eq!(
            client.url("https://example.com/health"),
            "https://example.com/health"
        );
    }

    #[test]
    fn test_default_base_url_follows_environment() {
        let client = ApiClient::builder(ClientConfig::for_environment(Environment::Production))
            .build()
            .expect("client builds");
        assert_eq!(client.base_url(), "http://api.zhufengpeixun.cn");
    }

    #[test]
    fn test_decode_payload() {
        let value: Value = decode_payload(r#"{"a":1}"#).expect("json");
        assert_eq!(value, serde_json::json!({"a": 1}));

        let empty: Value = decode_payload("").expect("empty");
        assert_eq!(empty, Value::Null);

        let text: String = decode_payload("plain text").expect("text");
        assert_eq!(text, "plain text");

        let err = decode_payload::<Vec<u32>>("not a list").unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_prepare_rejects_unencodable_token() {
        let store = Arc::new(MemoryStore::with_item(TOKEN_KEY, "bad\ntoken"));
        let client = ApiClient::builder(ClientConfig::default())
            .store(store)
            .build()
            .expect("client builds");
        let builder = client.client.get(client.url("/x"));
        let result = client.prepare::<()>(builder, None);
        assert!(matches!(result, Err(ApiError::InvalidToken(_))));
    }
}
