//! Shared http capability used by every pipeline stage

use crate::requests::{Error, Result};

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

use std::time::Duration;

const USER_AGENT: &str = "MangoLoader/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle over the shared http client. Cloning is cheap, all clones reuse
/// the same connection pool.
#[derive(Debug, Clone)]
pub struct MangaClient {
    client: ClientWithMiddleware,
}

impl MangaClient {
    /// Builds the client with the crate user agent and a per-request
    /// timeout, so one stuck remote call cannot stall a stage forever.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let client = ClientBuilder::new(client)
            .with(TracingMiddleware::default())
            .build();

        Ok(Self { client })
    }

    /// Plain GET. Transport failures are surfaced verbatim, no retries.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, url: &str) -> Result<reqwest::Response> {
        match self.client.get(url).send().await {
            Ok(resp) => Ok(resp),
            Err(e) => Err(Error::RequestMiddlewareError(e)),
        }
    }

    /// GET that expects a 200 response and collects the whole body
    #[tracing::instrument(skip(self))]
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes> {
        let resp = self.get(url).await?;

        let status = resp.status();
        if status != StatusCode::OK {
            tracing::warn!(status = status.as_u16(), url, "unexpected server response");

            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        match resp.bytes().await {
            Ok(bytes) => Ok(bytes),
            Err(e) => Err(Error::ReqwestError(e)),
        }
    }
}
