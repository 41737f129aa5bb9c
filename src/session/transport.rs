//! Production `HttpTransport` (spec §6 "Upstream HTTP contract"): a thin
//! `reqwest`-backed implementation of [`super::pipeline::HttpTransport`].
//! Cookies persist across the GET/POST pair via the session's own jar
//! (spec §6 "Cookies must be maintained across the two calls").

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::pipeline::HttpTransport;
use crate::error::SearchError;
use crate::model::session::SessionState;

fn to_header_map(headers: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            map.append(name, value);
        }
    }
    map
}

/// Builds one `reqwest::Client` per call, scoped to the session's current
/// cookie jar and proxy choice. A session rarely issues more than two
/// requests (form fetch, submit), so the per-call construction cost is
/// negligible next to the network round trip itself.
pub struct ReqwestHttpTransport {
    timeout: Duration,
}

impl ReqwestHttpTransport {
    pub fn new(timeout_seconds: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    fn build_client(&self, session: &SessionState) -> Result<reqwest::Client, SearchError> {
        let mut builder = reqwest::Client::builder()
            .cookie_provider(session.cookie_jar.clone())
            .timeout(self.timeout);
        if let Some(proxy_handle) = &session.proxy {
            let proxy = reqwest::Proxy::all(proxy_handle.endpoint.to_url())
                .map_err(|e| SearchError::internal(format!("invalid proxy endpoint: {e}")))?;
            builder = builder.proxy(proxy);
        }
        builder
            .build()
            .map_err(|e| SearchError::internal(format!("failed to build HTTP client: {e}")))
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn get(&self, url: &str, headers: &[(String, String)], session: &SessionState) -> Result<(u16, String), SearchError> {
        let client = self.build_client(session)?;
        let response = client
            .get(url)
            .headers(to_header_map(headers))
            .send()
            .await
            .map_err(|e| SearchError::upstream_timeout(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| SearchError::parse_failure(e.to_string()))?;
        Ok((status, body))
    }

    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        form_fields: &[(String, String)],
        session: &SessionState,
    ) -> Result<(u16, String), SearchError> {
        let client = self.build_client(session)?;
        let response = client
            .post(url)
            .headers(to_header_map(headers))
            .form(form_fields)
            .send()
            .await
            .map_err(|e| SearchError::upstream_timeout(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| SearchError::parse_failure(e.to_string()))?;
        Ok((status, body))
    }
}
