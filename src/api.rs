use std::{future::Future, time::Duration};

use log::debug;
use serde::de::DeserializeOwned;

use crate::PaddockError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_S: u64 = 30;

/// Blocking client for the FastF1 browser API.
///
/// Every call spins up a current-thread tokio runtime and drives a fresh
/// `reqwest` client on it, so the client can be used from any worker thread
/// without an ambient runtime.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_S),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PaddockError> {
        let url = self.url(path);
        debug!("GET {} {:?}", url, query);
        let body = block_on(async {
            let client = self.http_client(&url)?;
            let response = client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| PaddockError::ApiTransportError {
                    url: url.clone(),
                    source: e,
                })?;
            read_body(&url, response).await
        })??;
        parse_json(&body)
    }

    pub fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PaddockError> {
        let url = self.url(path);
        debug!("POST {} {:?}", url, query);
        let body = block_on(async {
            let client = self.http_client(&url)?;
            let response = client
                .post(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| PaddockError::ApiTransportError {
                    url: url.clone(),
                    source: e,
                })?;
            read_body(&url, response).await
        })??;
        parse_json(&body)
    }

    fn http_client(&self, url: &str) -> Result<reqwest::Client, PaddockError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| PaddockError::ApiTransportError {
                url: url.to_string(),
                source: e,
            })
    }
}

fn block_on<F: Future>(future: F) -> Result<F::Output, PaddockError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| PaddockError::RuntimeError { source: e })?;
    Ok(runtime.block_on(future))
}

async fn read_body(url: &str, response: reqwest::Response) -> Result<String, PaddockError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| PaddockError::ApiTransportError {
            url: url.to_string(),
            source: e,
        })?;
    if !status.is_success() {
        return Err(PaddockError::ApiStatusError {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }
    Ok(body)
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, PaddockError> {
    serde_json::from_str(body).map_err(|e| PaddockError::ApiParseError { source: e })
}

/// Extracts the human readable failure from an error response body. The API
/// reports failures as `{"detail": "..."}`; anything else is passed through.
pub(crate) fn error_detail(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));
    match detail {
        Some(detail) => detail,
        None if body.trim().is_empty() => "no detail provided".to_string(),
        None => body.trim().to_string(),
    }
}
