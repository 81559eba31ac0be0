// SPDX-License-Identifier: BUSL-1.1
//! Shared request plumbing for every sub-client.
//!
//! Each request picks up the current bearer token from the session store.
//! A 401 from any endpoint clears the cached auth state before the error
//! is returned. No request is retried.
//!
//! Paths are given as segments and appended with `Url::path_segments_mut`,
//! so an identifier containing `/`, `?` or `#` stays inside its segment.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tribune_core::{clear_auth, SessionStore, KEY_TOKEN};
use url::Url;

use crate::config::{ConfigError, TribuneApiConfig};
use crate::error::ApiError;

#[derive(Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url)
            .field("session", &"[SessionStore]")
            .finish()
    }
}

impl Transport {
    pub(crate) fn new(
        config: &TribuneApiConfig,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| ApiError::Http {
            endpoint: "client_init".into(),
            source: e,
        })?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            session,
        })
    }

    pub(crate) fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub(crate) fn get(&self, segments: &[&str]) -> Result<reqwest::RequestBuilder, ApiError> {
        Ok(self.http.get(self.url(segments)?))
    }

    pub(crate) fn post(&self, segments: &[&str]) -> Result<reqwest::RequestBuilder, ApiError> {
        Ok(self.http.post(self.url(segments)?))
    }

    pub(crate) fn patch(&self, segments: &[&str]) -> Result<reqwest::RequestBuilder, ApiError> {
        Ok(self.http.patch(self.url(segments)?))
    }

    pub(crate) fn delete(&self, segments: &[&str]) -> Result<reqwest::RequestBuilder, ApiError> {
        Ok(self.http.delete(self.url(segments)?))
    }

    /// `base_url` with `segments` appended, each percent-encoded as one
    /// path segment. Empty and dot segments are refused: `Url` would drop
    /// them and the request would land on the parent resource.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(ApiError::InvalidPathSegment((*bad).to_string()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ConfigError::InvalidUrl("base URL".to_string(), "cannot carry a path".to_string())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send with bearer auth and map every non-2xx status to an error.
    pub(crate) async fn send(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let request = match self.session.get(KEY_TOKEN) {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let resp = request.send().await.map_err(|e| ApiError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!(endpoint, "backend rejected bearer token; clearing cached session");
            clear_auth(self.session.as_ref());
            return Err(ApiError::Unauthorized {
                endpoint: endpoint.to_string(),
            });
        }

        if !status.is_success() {
            let status = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                endpoint: endpoint.to_string(),
                status,
                message: server_message(&body, status),
            });
        }

        Ok(resp)
    }

    pub(crate) async fn decode<T: DeserializeOwned>(
        resp: reqwest::Response,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        resp.json().await.map_err(|e| ApiError::Deserialization {
            endpoint: endpoint.to_string(),
            source: e,
        })
    }
}

/// The `message` field of a JSON error body, or a generic description.
fn server_message(body: &str, status: u16) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("request failed with status {status}"))
}
