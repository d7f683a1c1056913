use serde::{Deserialize, Serialize};

/// A quote as displayed and persisted. The JSON shape is `{content, author}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Quote {
    pub content: String,
    pub author: String,
}

impl Quote {
    pub fn new(content: impl Into<String>, author: impl Into<String>) -> Self {
        Quote { content: content.into(), author: author.into() }
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn key(&self) -> QuoteKey {
        QuoteKey::from(self)
    }
}

/// Composite identity of a quote, used to key per-row state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuoteKey {
    pub content: String,
    pub author: String,
}

impl From<&Quote> for QuoteKey {
    fn from(quote: &Quote) -> Self {
        QuoteKey { content: quote.content.clone(), author: quote.author.clone() }
    }
}

/// A translated quote. Empty strings mean "no translation".
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    pub quote: String,
    pub author: String,
}

impl Translation {
    pub fn is_empty(&self) -> bool {
        self.quote.is_empty() && self.author.is_empty()
    }
}
