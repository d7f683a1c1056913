use super::Translator;
use crate::parsing::parse_translation;
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Request(String),
    #[error("translation request failed with HTTP status {0}")]
    Status(u16),
    #[error("could not parse translation response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for TranslationError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => TranslationError::Status(status.as_u16()),
            None => TranslationError::Request(e.to_string()),
        }
    }
}

/// Client for the unauthenticated `translate_a/single` endpoint.
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    client: Client,
    endpoint: String,
    source_language: String,
}

impl HttpTranslator {
    pub fn new(endpoint: &str, source_language: &str, timeout: Duration) -> Result<Self, TranslationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpTranslator {
            client,
            endpoint: endpoint.to_string(),
            source_language: source_language.to_string(),
        })
    }
}

impl Translator for HttpTranslator {
    fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_language.as_str()),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Status(status.as_u16()));
        }
        let body = response.text()?;
        let translated = parse_translation(&body).map_err(|e| TranslationError::Malformed(e.to_string()))?;
        debug!(chars = text.chars().count(), target, "translated text");
        Ok(translated)
    }
}
