//! Shared HTTP plumbing for the upstream provider clients

use std::time::Duration;

use reqwest::{Client, Response, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::Result;
use crate::config::HttpConfig;
use crate::error::{DataRunError, Provider};

/// Build the client used for every provider call.
///
/// Transient failures (connect errors, 5xx, 429) are retried with
/// exponential backoff when `max_retries` is non-zero.
pub fn build_client(config: &HttpConfig) -> Result<ClientWithMiddleware> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds.into()))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| DataRunError::config(format!("Failed to create HTTP client: {e}")))?;

    let mut builder = ClientBuilder::new(client);
    if config.max_retries > 0 {
        let policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
    }
    Ok(builder.build())
}

/// Join `path` onto `base` and append the query parameters
pub fn endpoint(
    provider: Provider,
    base: &str,
    path: &str,
    params: &[(&str, String)],
) -> Result<Url> {
    let path = path.trim_start_matches('/');
    let raw = if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path)
    };
    Url::parse_with_params(&raw, params)
        .map_err(|e| DataRunError::config(format!("Invalid {provider} URL {raw}: {e}")))
}

/// Issue a GET request and decode the JSON body.
///
/// Transport and status failures map to `ProviderUnavailable`, decode
/// failures to `DataShape`.
pub async fn get_json<T: DeserializeOwned>(
    client: &ClientWithMiddleware,
    provider: Provider,
    url: Url,
) -> Result<T> {
    debug!(%provider, url = %redact(&url), "Calling the API");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| DataRunError::provider_unavailable(provider, e.to_string()))?;

    let response = check_status(provider, response)?;

    response
        .json::<T>()
        .await
        .map_err(|e| DataRunError::data_shape(provider, e.to_string()))
}

fn check_status(provider: Provider, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(DataRunError::provider_unavailable(
            provider,
            format!("HTTP {status}"),
        ))
    }
}

/// Check the `status` field Google Maps APIs return alongside HTTP 200.
///
/// `OK` and `ZERO_RESULTS` are answers; anything else (quota, denied key,
/// invalid request) means the provider did not answer.
pub fn check_google_status(provider: Provider, status: &str) -> Result<()> {
    match status {
        "" | "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(DataRunError::provider_unavailable(
            provider,
            format!("status {other}"),
        )),
    }
}

/// URL with any `key` parameter masked, for logging
fn redact(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}
