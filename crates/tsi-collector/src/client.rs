//! HTTP client for the tweet advanced-search endpoint.
//!
//! Wraps `reqwest` with the API-key header, query construction, and typed
//! page deserialization. Non-2xx responses surface as
//! [`CollectorError::Status`] carrying the response body for logging.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::CollectorError;
use crate::types::SearchPage;

const API_KEY_HEADER: &str = "X-API-Key";
const DEFAULT_QUERY_TYPE: &str = "Top";

/// Client for one search endpoint.
///
/// Construct with [`SearchClient::new`]; tests point `base_url` at a
/// wiremock server.
pub struct SearchClient {
    client: Client,
    api_key: String,
    base_url: Url,
    query_type: String,
}

impl SearchClient {
    /// Creates a client for the search endpoint at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`CollectorError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(api_key: &str, timeout_secs: u64, base_url: &str) -> Result<Self, CollectorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("tsi/0.1 (tariff-sentiment-research)")
            .build()?;

        let base_url = Url::parse(base_url.trim()).map_err(|e| CollectorError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            query_type: DEFAULT_QUERY_TYPE.to_owned(),
        })
    }

    /// Overrides the `queryType` parameter (`Top` or `Latest`).
    #[must_use]
    pub fn with_query_type(mut self, query_type: &str) -> Self {
        self.query_type = query_type.to_owned();
        self
    }

    /// Fetches one page of results for `query`, continuing from `cursor`.
    ///
    /// # Errors
    ///
    /// - [`CollectorError::Http`] on network failure.
    /// - [`CollectorError::Status`] on a non-2xx status.
    /// - [`CollectorError::Deserialize`] if the body is not a search page.
    pub async fn search_page(
        &self,
        query: &str,
        cursor: Option<&str>,
    ) -> Result<SearchPage, CollectorError> {
        let url = self.build_url(query, cursor);
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollectorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CollectorError::Deserialize {
            context: format!("search page (cursor={})", cursor.unwrap_or("<first>")),
            source: e,
        })
    }

    /// Builds the request URL with percent-encoded `query`, `queryType` and,
    /// when continuing, `cursor` parameters.
    fn build_url(&self, query: &str, cursor: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", query);
            pairs.append_pair("queryType", &self.query_type);
            if let Some(cursor) = cursor {
                pairs.append_pair("cursor", cursor);
            }
        }
        url
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
