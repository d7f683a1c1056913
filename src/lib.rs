//*** START FILE: src/lib.rs ***//

pub mod config;
pub mod types {
    pub mod quote;
}
pub mod parsing;
pub mod remote;
pub mod store;
pub mod task;
pub mod diagnostics;
pub mod quote_fetcher;
pub mod favorites;
pub mod translation;
pub mod ui;
pub mod app;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::{QuotebookApp, Route, Services};
pub use config::Config;
pub use types::quote::{Quote, QuoteKey, Translation};

//*** END FILE: src/lib.rs ***//
