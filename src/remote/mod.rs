//! HTTP clients for the quote and translation services, and the traits the
//! managers depend on so they can be driven by fakes in tests.

pub mod quote_api;
pub mod translate_api;

use crate::types::quote::Quote;

pub use quote_api::{FetchError, HttpQuoteSource};
pub use translate_api::{HttpTranslator, TranslationError};

pub trait QuoteSource: Send + Sync {
    /// The URL this source reads from, used for probing and log context.
    fn endpoint(&self) -> &str;
    fn fetch_quote(&self) -> Result<Quote, FetchError>;
}

pub trait Translator: Send + Sync {
    /// Translates `text` into `target`. Empty text translates to empty text.
    fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError>;
}
