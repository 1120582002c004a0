//! Meilisearch-compatible HTTP adapter.
//!
//! Posts the [`IndexQuery`] JSON body to `{url}/indexes/{uid}/search` and
//! decodes the answer into a [`RawSearchResponse`]. Plain HTTP only; put a
//! TLS-terminating proxy in front of remote indexes.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{header, Method, Request, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use sift_core::config::IndexConfig;
use sift_core::{IndexError, IndexQuery, RawSearchResponse, SearchIndex};
use std::time::Duration;

pub struct MeiliIndex {
    client: Client<HttpConnector, Full<Bytes>>,
    search_uri: Uri,
    api_key: Option<String>,
    timeout: Duration,
}

impl MeiliIndex {
    pub fn new(config: &IndexConfig) -> Result<Self, IndexError> {
        let base = config.url.trim_end_matches('/');
        let search_uri: Uri = format!("{base}/indexes/{}/search", config.uid)
            .parse()
            .map_err(|e| IndexError::Unsupported(format!("invalid index url {base:?}: {e}")))?;
        if search_uri.scheme_str() != Some("http") {
            return Err(IndexError::Unsupported(format!(
                "index url {base:?} must use plain http"
            )));
        }

        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            search_uri,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            timeout: config.request_timeout(),
        })
    }

    pub fn search_uri(&self) -> &Uri {
        &self.search_uri
    }

    async fn post(&self, body: Vec<u8>) -> Result<(u16, Bytes), IndexError> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.search_uri.clone())
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }
        let request = builder
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| IndexError::Unsupported(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| IndexError::Unreachable(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| IndexError::Unreachable(e.to_string()))?
            .to_bytes();
        Ok((status, bytes))
    }
}

#[async_trait::async_trait]
impl SearchIndex for MeiliIndex {
    async fn search(&self, query: &IndexQuery) -> Result<RawSearchResponse, IndexError> {
        let body = serde_json::to_vec(query).map_err(|e| IndexError::Unsupported(e.to_string()))?;

        let (status, bytes) = tokio::time::timeout(self.timeout, self.post(body))
            .await
            .map_err(|_| IndexError::Timeout(self.timeout))??;

        if !(200..300).contains(&status) {
            tracing::debug!(status, uri = %self.search_uri, "meili: non-success status");
            return Err(IndexError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| IndexError::Decode(e.to_string()))
    }
}
