//! HTTP client abstraction for the chat platform integration.
//!
//! The Telegram client only needs "GET with query parameters" and "POST a JSON
//! body", both returning the raw response text. Keeping that behind a trait lets
//! the platform code be tested against canned responses without a network.
//!
//! The default implementation wraps reqwest with a request timeout, so a
//! hanging upstream turns into an error instead of a stuck join request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest;

use crate::Error;

/// A generic trait for making HTTP requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: String, query: Vec<(String, String)>) -> Result<String, Error>;
    async fn post_json(&self, url: String, body: serde_json::Value) -> Result<String, Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn get(&self, url: String, query: Vec<(String, String)>) -> Result<String, Error> {
        let response = self.client
            .get(&url)
            .query(&query)
            .send()
            .await?
            .text()
            .await?;
        Ok(response)
    }

    async fn post_json(&self, url: String, body: serde_json::Value) -> Result<String, Error> {
        let response = self.client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .text()
            .await?;
        Ok(response)
    }
}
