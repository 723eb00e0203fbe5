//! HTTP sink posting each reading as JSON.

use std::collections::BTreeMap;

use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thermowatch_protocol::Reading;

use crate::{SinkError, SinkFuture, TelemetrySink};

/// Posts `{"temperature": …, "timestamp": …}` to a fixed endpoint.
///
/// Extra headers (for example a deployment bypass token) come from
/// configuration; nothing is baked in.
pub struct HttpSink {
    http: reqwest::Client,
    endpoint: Url,
}

/// Parses a sink endpoint, accepting only absolute `http`/`https` URLs with
/// a host.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, SinkError> {
    let invalid = || SinkError::InvalidEndpoint(endpoint.to_string());
    let url = Url::parse(endpoint).map_err(|_| invalid())?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

impl HttpSink {
    pub fn new(endpoint: &str, headers: &BTreeMap<String, String>) -> Result<Self, SinkError> {
        let endpoint = parse_endpoint(endpoint)?;

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| SinkError::InvalidHeader(name.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| SinkError::InvalidHeader(name.as_str().to_string()))?;
            header_map.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(header_map)
            .build()?;

        Ok(Self {
            http,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn post(&self, reading: Reading) -> Result<(), SinkError> {
        let resp = self.http.post(self.endpoint.clone()).json(&reading).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl TelemetrySink for HttpSink {
    fn send(&self, reading: Reading) -> SinkFuture<'_> {
        Box::pin(self.post(reading))
    }
}
