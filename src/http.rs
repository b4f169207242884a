// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::HttpError;

/// HTTP client abstraction for testability
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch the entire response body of a GET request
    async fn get_bytes(&self, url: &str) -> Result<Bytes, HttpError>;

    /// POST a JSON body and return the entire response body
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Bytes, HttpError>;
}

/// Default HTTP client implementation using reqwest
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new ReqwestClient with default settings
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestClient with a custom reqwest::Client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn read_body(url: &str, response: reqwest::Response) -> Result<Bytes, HttpError> {
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| HttpError::Request {
            url: url.to_string(),
            source: e,
        })
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_bytes(&self, url: &str) -> Result<Bytes, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::Request {
                url: url.to_string(),
                source: e,
            })?;

        Self::read_body(url, response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Bytes, HttpError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| HttpError::Request {
                url: url.to_string(),
                source: e,
            })?;

        Self::read_body(url, response).await
    }
}
