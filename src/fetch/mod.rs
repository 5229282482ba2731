//! HTTP plumbing shared by every upstream source.

pub mod auth;
mod basic;
mod client;
mod error;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use error::FetchError;

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// How many times a request is attempted and how long to wait between tries.
///
/// The wait grows linearly: `base_delay * attempt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(resp.bytes().await?.to_vec())
}

pub async fn fetch_json<T, C>(client: &C, url: &str) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    C: HttpClient + ?Sized,
{
    let bytes = fetch_bytes(client, url).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// [`fetch_bytes`] with linear backoff on rate limits, server errors and transport failures.
pub async fn fetch_bytes_with_retry<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    policy: RetryPolicy,
) -> Result<Vec<u8>, FetchError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match fetch_bytes(client, url).await {
            Ok(bytes) => {
                debug!(attempt, len = bytes.len(), "fetch succeeded");
                return Ok(bytes);
            }
            Err(e) if e.is_retryable() && attempt < attempts => {
                let delay = policy.delay_for(attempt);
                warn!(attempt, ?delay, error = %e, "fetch failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

pub async fn fetch_json_with_retry<T, C>(
    client: &C,
    url: &str,
    policy: RetryPolicy,
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    C: HttpClient + ?Sized,
{
    let bytes = fetch_bytes_with_retry(client, url, policy).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Builds `base` + `path` with URL-encoded query parameters.
pub fn build_url(base: &str, path: &str, params: &[(&str, String)]) -> Result<String, FetchError> {
    let joined = format!("{}{path}", base.trim_end_matches('/'));
    reqwest::Url::parse_with_params(&joined, params)
        .map(String::from)
        .map_err(|_| FetchError::InvalidUrl(joined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quick() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_single_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let client = BasicClient::new().unwrap();
        let url = format!("{}/data", server.uri());
        let value: Value = fetch_json_with_retry(&client, &url, quick()).await.unwrap();

        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let client = BasicClient::new().unwrap();
        let url = format!("{}/missing", server.uri());
        let err = fetch_json_with_retry::<Value, _>(&client, &url, quick())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_gives_up_after_configured_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let client = BasicClient::new().unwrap();
        let err = fetch_json_with_retry::<Value, _>(&client, &server.uri(), quick())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = BasicClient::new().unwrap();
        let err = fetch_json::<Value, _>(&client, &server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_build_url_encodes_lists() {
        let url = build_url(
            "https://archive-api.open-meteo.com/",
            "/v1/archive",
            &[("daily", "a,b".to_string()), ("latitude", "1.5".to_string())],
        )
        .unwrap();
        assert_eq!(url, "https://archive-api.open-meteo.com/v1/archive?daily=a%2Cb&latitude=1.5");
    }

    #[test]
    fn test_invalid_url() {
        let err = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(fetch_bytes(&BasicClient::new().unwrap(), "not a url"))
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
