//! Bounded request helper shared by the authenticator and profile fetcher.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};

use crate::error::KeywardError;
use crate::util::timeout::with_timeout;

/// A response reduced to what the auth flows inspect.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub status: StatusCode,
    pub body: String,
}

impl Exchange {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, KeywardError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Build the `Bearer <token>` authorization value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Send `request` and read its body, failing with `Timeout` if the whole
/// exchange takes longer than `timeout`.
pub async fn send_bounded(
    request: RequestBuilder,
    timeout: Duration,
) -> Result<Exchange, KeywardError> {
    with_timeout(timeout, async move {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok::<_, KeywardError>(Exchange { status, body })
    })
    .await
}

/// Client used when the caller does not supply one.
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(4)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
