use crate::diagnostics::{context, Diagnostics};
use crate::remote::{TranslationError, Translator};
use crate::task::TaskChannel;
use crate::types::quote::{Quote, QuoteKey, Translation};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::thread;
#[cfg(test)]
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const TRANSLATION_FAILED: &str = "Failed to translate text. Please try again.";

/// Per-item translation state. A missing slot reads as the default: no
/// result, not in flight, no error, disabled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationSlot {
    pub result: Translation,
    pub in_flight: bool,
    pub error: String,
    pub enabled: bool,
    request: u64,
}

struct TranslationOutcome<K> {
    key: K,
    request: u64,
    result: Result<Translation, TranslationError>,
}

/// Translations keyed by `K`. The favorites list uses [`QuoteKey`]; the main
/// view uses `()` through [`CurrentTranslation`].
pub struct TranslationManager<K> {
    translator: Arc<dyn Translator>,
    diagnostics: Arc<Diagnostics>,
    target_language: String,
    tasks: TaskChannel<TranslationOutcome<K>>,
    slots: HashMap<K, TranslationSlot>,
    next_request: u64,
}

pub type FavoriteTranslations = TranslationManager<QuoteKey>;

fn translate_or_empty(translator: &dyn Translator, text: &str, target: &str) -> Result<String, TranslationError> {
    if text.is_empty() {
        return Ok(String::new());
    }
    translator.translate(text, target)
}

/// Translates quote and author with two requests running side by side and
/// only returns once both are done.
fn translate_pair(translator: &dyn Translator, quote: &str, author: &str, target: &str) -> Result<Translation, TranslationError> {
    let (quote_result, author_result) = thread::scope(|s| {
        let quote_job = s.spawn(|| translate_or_empty(translator, quote, target));
        let author_job = s.spawn(|| translate_or_empty(translator, author, target));
        (quote_job.join(), author_job.join())
    });
    let lost = || TranslationError::Request("translation worker panicked".to_string());
    let quote = quote_result.map_err(|_| lost())??;
    let author = author_result.map_err(|_| lost())??;
    Ok(Translation { quote, author })
}

impl<K> TranslationManager<K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
{
    pub fn new(translator: Arc<dyn Translator>, diagnostics: Arc<Diagnostics>, target_language: &str) -> Self {
        TranslationManager {
            translator,
            diagnostics,
            target_language: target_language.to_string(),
            tasks: TaskChannel::new(),
            slots: HashMap::new(),
            next_request: 0,
        }
    }

    #[cfg(test)]
    pub fn slot(&self, key: &K) -> TranslationSlot {
        self.slots.get(key).cloned().unwrap_or_default()
    }

    pub fn translation(&self, key: &K) -> Translation {
        self.slots.get(key).map(|s| s.result.clone()).unwrap_or_default()
    }

    pub fn has_translation(&self, key: &K) -> bool {
        self.slots.get(key).is_some_and(|s| !s.result.is_empty())
    }

    pub fn is_translating(&self, key: &K) -> bool {
        self.slots.get(key).is_some_and(|s| s.in_flight)
    }

    pub fn is_enabled(&self, key: &K) -> bool {
        self.slots.get(key).is_some_and(|s| s.enabled)
    }

    pub fn error(&self, key: &K) -> &str {
        self.slots.get(key).map(|s| s.error.as_str()).unwrap_or("")
    }

    pub fn any_in_flight(&self) -> bool {
        self.slots.values().any(|s| s.in_flight)
    }

    /// Clears an existing (or pending) translation, otherwise starts one.
    pub fn toggle(&mut self, key: K, quote: &str, author: &str) {
        if self.has_translation(&key) || self.is_translating(&key) {
            self.clear(&key);
        } else {
            self.translate(key, quote, author);
        }
    }

    /// Starts translating both texts for `key`. Does nothing if both are empty.
    pub fn translate(&mut self, key: K, quote: &str, author: &str) {
        if quote.is_empty() && author.is_empty() {
            return;
        }
        self.next_request += 1;
        let request = self.next_request;
        self.slots.insert(
            key.clone(),
            TranslationSlot { in_flight: true, enabled: true, request, ..TranslationSlot::default() },
        );

        let translator = Arc::clone(&self.translator);
        let target = self.target_language.clone();
        let (quote, author) = (quote.to_string(), author.to_string());
        let job_key = key.clone();
        let spawned = self.tasks.spawn("translate", move || TranslationOutcome {
            key: job_key,
            request,
            result: translate_pair(translator.as_ref(), &quote, &author, &target),
        });
        if let Err(e) = spawned {
            self.apply(TranslationOutcome {
                key,
                request,
                result: Err(TranslationError::Request(format!("could not start worker: {}", e))),
            });
        }
    }

    /// Forgets everything about `key`; a result still in flight is discarded.
    pub fn clear(&mut self, key: &K) {
        if self.slots.remove(key).is_some() {
            debug!(?key, "translation cleared");
        }
    }

    /// Drops every slot whose key fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.slots.retain(|key, _| keep(key));
    }

    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Some(outcome) = self.tasks.try_recv() {
            changed |= self.apply(outcome);
        }
        changed
    }

    /// Blocks until nothing is in flight or `timeout` elapses.
    #[cfg(test)]
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.any_in_flight() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.tasks.recv_timeout(remaining) {
                Some(outcome) => {
                    self.apply(outcome);
                }
                None => return false,
            }
        }
        true
    }

    fn apply(&mut self, outcome: TranslationOutcome<K>) -> bool {
        let Some(slot) = self.slots.get_mut(&outcome.key) else {
            debug!(key = ?outcome.key, "dropping translation for cleared item");
            return false;
        };
        if slot.request != outcome.request {
            return false;
        }
        slot.in_flight = false;
        match outcome.result {
            Ok(translation) => {
                info!(key = ?outcome.key, "translation ready");
                slot.result = translation;
                slot.error.clear();
            }
            Err(e) => {
                slot.result = Translation::default();
                slot.error = TRANSLATION_FAILED.to_string();
                slot.enabled = false;
                let key = format!("{:?}", outcome.key);
                self.diagnostics.log_error(&e, context(&[("operation", "translate"), ("item", key.as_str())]));
            }
        }
        true
    }
}

/// Translation of whatever quote the main view is showing.
pub struct CurrentTranslation {
    inner: TranslationManager<()>,
    followed: Option<QuoteKey>,
}

impl CurrentTranslation {
    pub fn new(translator: Arc<dyn Translator>, diagnostics: Arc<Diagnostics>, target_language: &str) -> Self {
        CurrentTranslation { inner: TranslationManager::new(translator, diagnostics, target_language), followed: None }
    }

    pub fn translation(&self) -> Translation {
        self.inner.translation(&())
    }

    pub fn has_translation(&self) -> bool {
        self.inner.has_translation(&())
    }

    pub fn is_translating(&self) -> bool {
        self.inner.is_translating(&())
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled(&())
    }

    pub fn error(&self) -> &str {
        self.inner.error(&())
    }

    pub fn toggle(&mut self, quote: &Quote) {
        self.inner.toggle((), &quote.content, &quote.author);
    }

    pub fn clear(&mut self) {
        self.inner.clear(&());
    }

    /// Must be called with the displayed quote whenever it may have changed.
    /// On a change the old translation is cleared; if translation was on and
    /// the new quote has content, the new quote is translated.
    pub fn follow_quote(&mut self, quote: &Quote) {
        let key = quote.key();
        if self.followed.as_ref() == Some(&key) {
            return;
        }
        let first = self.followed.is_none();
        self.followed = Some(key);
        if first {
            return;
        }
        let was_enabled = self.is_enabled();
        self.clear();
        if was_enabled && quote.has_content() {
            self.inner.translate((), &quote.content, &quote.author);
        }
    }

    pub fn poll(&mut self) -> bool {
        self.inner.poll()
    }

    #[cfg(test)]
    pub fn settle(&mut self, timeout: Duration) -> bool {
        self.inner.settle(timeout)
    }
}
