use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::config::{PortalConfig, RequestHeaders};
use crate::error::StatError;

/// Transport used by the catalog, lister and fetcher.
pub trait PortalClient: Send + Sync {
    fn get_text(&self, url: &str) -> Result<String, StatError>;
    fn post_form(
        &self,
        url: &str,
        headers: &RequestHeaders,
        form: &[(String, String)],
    ) -> Result<String, StatError>;
}

#[derive(Clone)]
pub struct StatHttpClient {
    client: Client,
}

impl StatHttpClient {
    pub fn new(config: &PortalConfig) -> Result<Self, StatError> {
        let client = Client::builder()
            .default_headers(config.headers.to_header_map()?)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| StatError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn read_body(response: Response) -> Result<String, StatError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "portal request failed".to_string());
            return Err(StatError::Status { status, message });
        }
        response
            .text()
            .map_err(|err| StatError::Http(err.to_string()))
    }
}

impl PortalClient for StatHttpClient {
    fn get_text(&self, url: &str) -> Result<String, StatError> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| StatError::Http(err.to_string()))?;
        Self::read_body(response)
    }

    fn post_form(
        &self,
        url: &str,
        headers: &RequestHeaders,
        form: &[(String, String)],
    ) -> Result<String, StatError> {
        tracing::debug!(%url, fields = form.len(), "POST");
        let response = self
            .client
            .post(url)
            .headers(headers.to_header_map()?)
            .form(form)
            .send()
            .map_err(|err| StatError::Http(err.to_string()))?;
        Self::read_body(response)
    }
}
