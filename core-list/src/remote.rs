//! Remote list endpoint client
//!
//! All observed list endpoints share one envelope shape:
//!
//! ```json
//! {
//!   "success": true,
//!   "message": "ok",
//!   "data": {
//!     "images": [ ... ],
//!     "pagination": { "page": 1, "limit": 20, "total": 57, "totalPages": 3 }
//!   }
//! }
//! ```
//!
//! The item-array field name varies by resource (`images`, `audios`,
//! `pages`, or plain `items`); [`DataSection`] deserializes whichever is
//! present. Everything that can go wrong on the wire (non-2xx, transport
//! error, `success: false`, malformed body) is classified into a typed
//! [`ListError`] at this boundary so callers never inspect message text.

use crate::error::{ListError, Result};
use crate::key::ResourceKey;
use crate::pagination::{Page, PageRequest};
use bridge_traits::http::{HttpClient, HttpRequest};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Item-array field names observed across resources.
const ITEM_FIELDS: &[&str] = &["items", "images", "audios", "pages"];

/// Standard response envelope for list endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<DataSection>,
}

/// The `data` object: one item array (under a resource-specific name) plus
/// pagination metadata.
#[derive(Debug)]
pub struct DataSection {
    pub items: Vec<Value>,
    pub pagination: PaginationMeta,
}

impl<'de> Deserialize<'de> for DataSection {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut map = serde_json::Map::deserialize(deserializer)?;

        let pagination = map
            .remove("pagination")
            .ok_or_else(|| de::Error::missing_field("pagination"))?;
        let pagination: PaginationMeta =
            serde_json::from_value(pagination).map_err(de::Error::custom)?;

        let items = ITEM_FIELDS
            .iter()
            .find_map(|field| map.remove(*field))
            .ok_or_else(|| {
                de::Error::custom("missing item array (expected items/images/audios/pages)")
            })?;
        let items: Vec<Value> = serde_json::from_value(items).map_err(de::Error::custom)?;

        Ok(DataSection { items, pagination })
    }
}

/// Server-reported pagination metadata.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Typed page fetcher consumed by the list controller.
///
/// The standard implementation is [`RemoteListClient`]; tests substitute
/// their own.
#[async_trait::async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch_page(&self, key: &ResourceKey, request: PageRequest) -> Result<Page<T>>;
}

/// HTTP client for the remote list API.
///
/// Builds `GET {base}/{resource}?page={n}&limit={m}&{filters}` requests over
/// the platform [`HttpClient`] bridge. Filter names and values are
/// percent-encoded, so free-text filters (search queries) are safe.
pub struct RemoteListClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl RemoteListClient {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            timeout,
        }
    }

    fn url_for(&self, key: &ResourceKey, request: PageRequest) -> String {
        let mut url = format!(
            "{}/{}?page={}&limit={}",
            self.base_url,
            key.resource().path(),
            request.page,
            request.page_size
        );
        for (name, value) in key.filters() {
            url.push('&');
            url.push_str(&urlencoding::encode(name));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Fetch one page of raw JSON items.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn fetch_raw(&self, key: &ResourceKey, request: PageRequest) -> Result<Page<Value>> {
        let url = self.url_for(key, request);
        debug!(url = %url, "Fetching list page");

        let response = self
            .http
            .execute(HttpRequest::get(&url).timeout(self.timeout))
            .await?;

        if !response.is_success() {
            warn!(status = response.status, url = %url, "List endpoint returned error status");
            return Err(ListError::NetworkFetch(format!(
                "HTTP {} from {}",
                response.status, url
            )));
        }

        let envelope: ApiEnvelope = response
            .json()
            .map_err(|e| ListError::InvalidResponse(e.to_string()))?;

        if !envelope.success {
            return Err(ListError::NetworkFetch(envelope.message));
        }

        let data = envelope
            .data
            .ok_or_else(|| ListError::InvalidResponse("missing data section".to_string()))?;

        Ok(Page {
            items: data.items,
            page: data.pagination.page,
            page_size: data.pagination.limit,
            total: data.pagination.total,
            total_pages: data.pagination.total_pages,
        })
    }
}

#[async_trait::async_trait]
impl<T> PageFetcher<T> for RemoteListClient
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(&self, key: &ResourceKey, request: PageRequest) -> Result<Page<T>> {
        let raw = self.fetch_raw(key, request).await?;

        let mut items = Vec::with_capacity(raw.items.len());
        for value in raw.items {
            let item = serde_json::from_value(value)
                .map_err(|e| ListError::InvalidResponse(format!("bad item: {}", e)))?;
            items.push(item);
        }

        Ok(Page {
            items,
            page: raw.page,
            page_size: raw.page_size,
            total: raw.total,
            total_pages: raw.total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ResourceType;
    use serde_json::json;

    fn envelope_with(field: &str) -> String {
        json!({
            "success": true,
            "message": "ok",
            "data": {
                field: [{ "id": "a" }, { "id": "b" }],
                "pagination": { "page": 1, "limit": 20, "total": 2, "totalPages": 1 }
            }
        })
        .to_string()
    }

    #[test]
    fn test_envelope_accepts_each_item_field_name() {
        for field in ["items", "images", "audios", "pages"] {
            let envelope: ApiEnvelope = serde_json::from_str(&envelope_with(field)).unwrap();
            let data = envelope.data.unwrap();
            assert_eq!(data.items.len(), 2, "field {}", field);
            assert_eq!(data.pagination.total_pages, 1);
        }
    }

    #[test]
    fn test_envelope_rejects_missing_item_array() {
        let raw = json!({
            "success": true,
            "data": { "pagination": { "page": 1, "limit": 20, "total": 0, "totalPages": 0 } }
        })
        .to_string();
        assert!(serde_json::from_str::<ApiEnvelope>(&raw).is_err());
    }

    #[test]
    fn test_envelope_rejects_missing_pagination() {
        let raw = json!({
            "success": true,
            "data": { "items": [] }
        })
        .to_string();
        assert!(serde_json::from_str::<ApiEnvelope>(&raw).is_err());
    }

    #[test]
    fn test_url_building() {
        struct Unused;

        #[async_trait::async_trait]
        impl HttpClient for Unused {
            async fn execute(
                &self,
                _request: HttpRequest,
            ) -> bridge_traits::error::Result<bridge_traits::http::HttpResponse> {
                unreachable!()
            }
        }

        let client = RemoteListClient::new(
            Arc::new(Unused),
            "https://api.example.com/v1/",
            Duration::from_secs(20),
        );
        let key = ResourceKey::new(ResourceType::Gallery)
            .filter("status", "approved")
            .filter("category", "7");

        let url = client.url_for(&key, PageRequest::new(2, 10));
        assert_eq!(
            url,
            "https://api.example.com/v1/gallery?page=2&limit=10&category=7&status=approved"
        );

        // Free-text filter values are percent-encoded
        let search = ResourceKey::new(ResourceType::Search).filter("q", "rock & roll");
        let url = client.url_for(&search, PageRequest::first(20));
        assert_eq!(
            url,
            "https://api.example.com/v1/search?page=1&limit=20&q=rock%20%26%20roll"
        );
    }
}
