use super::QuoteSource;
use crate::types::quote::Quote;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network request failed: {0}")]
    Network(String),
    #[error("request timeout: {0}")]
    Timeout(String),
    #[error("quote fetch failed with HTTP status {0}")]
    Status(u16),
    #[error("failed to parse quote payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if e.is_decode() {
            FetchError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Body of `GET https://dummyjson.com/quotes/random`.
#[derive(Deserialize, Debug)]
struct RandomQuoteBody {
    quote: String,
    author: String,
}

#[derive(Debug, Clone)]
pub struct HttpQuoteSource {
    client: Client,
    endpoint: String,
}

impl HttpQuoteSource {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpQuoteSource { client, endpoint: endpoint.to_string() })
    }
}

fn normalize(body: RandomQuoteBody) -> Result<Quote, FetchError> {
    let content = body.quote.trim();
    if content.is_empty() {
        return Err(FetchError::Malformed("empty quote text".to_string()));
    }
    let author = match body.author.trim() {
        "" => "Unknown",
        name => name,
    };
    Ok(Quote::new(content, author))
}

impl QuoteSource for HttpQuoteSource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn fetch_quote(&self) -> Result<Quote, FetchError> {
        let response = self.client.get(&self.endpoint).header(ACCEPT, "application/json").send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body: RandomQuoteBody = response.json()?;
        debug!("quote received from {}", self.endpoint);
        normalize(body)
    }
}
