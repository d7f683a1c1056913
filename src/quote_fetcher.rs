use crate::diagnostics::{context, Diagnostics, ErrorCategory};
use crate::remote::{FetchError, QuoteSource};
use crate::store::{JsonStore, QUOTE_KEY};
use crate::task::TaskChannel;
use crate::types::quote::Quote;
use std::sync::Arc;
#[cfg(test)]
use std::time::{Duration, Instant};
use tracing::{info, warn};

struct FetchOutcome {
    request: u64,
    result: Result<Quote, FetchError>,
}

/// Loads random quotes on a worker thread and keeps the last good one.
///
/// A failed fetch leaves the displayed quote untouched and writes nothing.
/// Only the most recent request may update state; older completions are
/// dropped when they arrive.
pub struct QuoteFetcher {
    source: Arc<dyn QuoteSource>,
    store: JsonStore,
    diagnostics: Arc<Diagnostics>,
    preflight_probe: bool,
    tasks: TaskChannel<FetchOutcome>,
    quote: Quote,
    loading: bool,
    error: String,
    latest_request: u64,
}

impl QuoteFetcher {
    /// Restores the last stored quote, if any. Call [`QuoteFetcher::mount`]
    /// afterwards to fetch one when nothing was stored.
    pub fn new(source: Arc<dyn QuoteSource>, store: JsonStore, diagnostics: Arc<Diagnostics>) -> Self {
        let quote: Quote = store.get_or_default(QUOTE_KEY);
        QuoteFetcher {
            source,
            store,
            diagnostics,
            preflight_probe: false,
            tasks: TaskChannel::new(),
            quote,
            loading: false,
            error: String::new(),
            latest_request: 0,
        }
    }

    pub fn with_preflight_probe(mut self, enabled: bool) -> Self {
        self.preflight_probe = enabled;
        self
    }

    /// Fetches once if no usable quote was restored.
    pub fn mount(&mut self) {
        if !self.quote.has_content() {
            info!("no cached quote, fetching one");
            self.fetch();
        }
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// User-facing error text; empty when the last fetch succeeded.
    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn fetch(&mut self) {
        self.latest_request += 1;
        let request = self.latest_request;
        self.loading = true;
        self.error.clear();

        let source = Arc::clone(&self.source);
        let diagnostics = Arc::clone(&self.diagnostics);
        let probe_first = self.preflight_probe;
        let spawned = self.tasks.spawn("quote-fetch", move || {
            if probe_first {
                let probe = diagnostics.test_endpoint(source.endpoint(), true);
                if !probe.is_success() {
                    let detail = probe.error.unwrap_or_default();
                    return FetchOutcome {
                        request,
                        result: Err(FetchError::Network(format!("pre-flight probe failed: {}", detail))),
                    };
                }
            }
            FetchOutcome { request, result: source.fetch_quote() }
        });
        if let Err(e) = spawned {
            self.fail(FetchError::Network(format!("could not start worker: {}", e)));
        }
    }

    /// Applies finished fetches. Returns `true` if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Some(outcome) = self.tasks.try_recv() {
            changed |= self.apply(outcome);
        }
        changed
    }

    /// Blocks until no fetch is outstanding or `timeout` elapses.
    #[cfg(test)]
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.loading {
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

    fn apply(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.request != self.latest_request {
            info!(request = outcome.request, latest = self.latest_request, "dropping superseded quote response");
            return false;
        }
        match outcome.result {
            Ok(quote) => {
                if let Err(e) = self.store.set(QUOTE_KEY, &quote) {
                    warn!("could not persist quote: {}", e);
                }
                info!(author = %quote.author, "quote updated");
                self.quote = quote;
                self.loading = false;
            }
            Err(e) => self.fail(e),
        }
        true
    }

    fn fail(&mut self, err: FetchError) {
        let record = self.diagnostics.log_error(
            &err,
            context(&[("operation", "fetch_quote"), ("endpoint", self.source.endpoint())]),
        );
        self.error = user_message(record.category).to_string();
        self.loading = false;
    }
}

fn user_message(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::NetworkError => "Failed to fetch quote. Check your connection and try again.",
        ErrorCategory::TimeoutError => "The quote service took too long to respond. Please try again.",
        _ => "Failed to fetch quote. Please try again.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::closed_port_url;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::Mutex;

    const WAIT: Duration = Duration::from_secs(5);

    /// Replies with scripted results and counts calls.
    struct Scripted {
        replies: Mutex<VecDeque<Result<Quote, FetchError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(replies: Vec<Result<Quote, FetchError>>) -> Arc<Self> {
            Arc::new(Scripted { replies: Mutex::new(replies.into()), calls: AtomicUsize::new(0) })
        }
    }

    impl QuoteSource for Scripted {
        fn endpoint(&self) -> &str {
            "scripted://quotes"
        }
        fn fetch_quote(&self) -> Result<Quote, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Malformed("script exhausted".into())))
        }
    }

    /// Each call blocks until the test releases a reply for it.
    struct Gated {
        gate: Mutex<Receiver<Result<Quote, FetchError>>>,
    }

    impl QuoteSource for Gated {
        fn endpoint(&self) -> &str {
            "gated://quotes"
        }
        fn fetch_quote(&self) -> Result<Quote, FetchError> {
            self.gate.lock().unwrap().recv().unwrap()
        }
    }

    fn gated() -> (Arc<Gated>, Sender<Result<Quote, FetchError>>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Gated { gate: Mutex::new(rx) }), tx)
    }

    fn store(dir: &tempfile::TempDir) -> JsonStore {
        JsonStore::open(dir.path()).unwrap()
    }

    #[test]
    fn successful_fetch_updates_quote_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let expected = Quote::new("Fortune favors the bold.", "Virgil");
        let source = Scripted::new(vec![Ok(expected.clone())]);
        let mut fetcher = QuoteFetcher::new(source, store(&dir), Arc::new(Diagnostics::new()));

        fetcher.fetch();
        assert!(fetcher.is_loading());
        assert!(fetcher.settle(WAIT));

        assert!(!fetcher.is_loading());
        assert_eq!(fetcher.error(), "");
        assert_eq!(fetcher.quote(), &expected);
        assert_eq!(store(&dir).get::<Quote>(QUOTE_KEY), Some(expected));
    }

    #[test]
    fn mount_fetches_once_then_reload_does_not() {
        let dir = tempfile::tempdir().unwrap();
        let source = Scripted::new(vec![Ok(Quote::new("First", "A"))]);
        let diagnostics = Arc::new(Diagnostics::new());

        let mut fetcher = QuoteFetcher::new(source.clone(), store(&dir), diagnostics.clone());
        fetcher.mount();
        assert!(fetcher.settle(WAIT));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(store(&dir).contains(QUOTE_KEY));

        let mut reloaded = QuoteFetcher::new(source.clone(), store(&dir), diagnostics);
        reloaded.mount();
        assert!(!reloaded.is_loading());
        assert_eq!(reloaded.quote(), &Quote::new("First", "A"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn network_failure_sets_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = Scripted::new(vec![Err(FetchError::Network("connection reset".into()))]);
        let diagnostics = Arc::new(Diagnostics::new());
        let mut fetcher = QuoteFetcher::new(source, store(&dir), diagnostics.clone());

        fetcher.fetch();
        assert!(fetcher.settle(WAIT));

        assert!(!fetcher.is_loading());
        assert_eq!(fetcher.error(), "Failed to fetch quote. Check your connection and try again.");
        assert!(!store(&dir).contains(QUOTE_KEY));
        assert_eq!(diagnostics.count(ErrorCategory::NetworkError), 1);
        let record = &diagnostics.records()[0];
        assert_eq!(record.context.get("operation").map(String::as_str), Some("fetch_quote"));
    }

    #[test]
    fn failure_keeps_previous_quote_on_screen() {
        let dir = tempfile::tempdir().unwrap();
        let source = Scripted::new(vec![Ok(Quote::new("Kept", "K")), Err(FetchError::Status(500))]);
        let mut fetcher = QuoteFetcher::new(source, store(&dir), Arc::new(Diagnostics::new()));

        fetcher.fetch();
        fetcher.settle(WAIT);
        fetcher.fetch();
        fetcher.settle(WAIT);

        assert_eq!(fetcher.quote(), &Quote::new("Kept", "K"));
        assert_eq!(fetcher.error(), "Failed to fetch quote. Check your connection and try again.");
        assert_eq!(store(&dir).get::<Quote>(QUOTE_KEY), Some(Quote::new("Kept", "K")));
    }

    #[test]
    fn timeout_gets_its_own_message() {
        let dir = tempfile::tempdir().unwrap();
        let source = Scripted::new(vec![Err(FetchError::Timeout("operation timed out".into()))]);
        let mut fetcher = QuoteFetcher::new(source, store(&dir), Arc::new(Diagnostics::new()));
        fetcher.fetch();
        fetcher.settle(WAIT);
        assert_eq!(fetcher.error(), "The quote service took too long to respond. Please try again.");
    }

    #[test]
    fn superseded_response_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (source, gate) = gated();
        let mut fetcher = QuoteFetcher::new(source, store(&dir), Arc::new(Diagnostics::new()));

        fetcher.fetch();
        fetcher.fetch();
        // Whichever worker picks up a reply first, only request 2 may land.
        gate.send(Ok(Quote::new("one", "a"))).unwrap();
        gate.send(Ok(Quote::new("two", "b"))).unwrap();
        assert!(fetcher.settle(WAIT));
        let landed = fetcher.quote().clone();

        // Drain the other completion too; it must not change anything.
        std::thread::sleep(Duration::from_millis(50));
        assert!(!fetcher.poll());
        assert_eq!(fetcher.quote(), &landed);
        assert_eq!(store(&dir).get::<Quote>(QUOTE_KEY), Some(landed));
    }

    #[test]
    fn failed_preflight_skips_the_fetch() {
        let dir = tempfile::tempdir().unwrap();

        struct Unreachable {
            url: String,
            calls: AtomicUsize,
        }
        impl QuoteSource for Unreachable {
            fn endpoint(&self) -> &str {
                &self.url
            }
            fn fetch_quote(&self) -> Result<Quote, FetchError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(Quote::new("unexpected", "x"))
            }
        }

        let source = Arc::new(Unreachable { url: closed_port_url(), calls: AtomicUsize::new(0) });
        let mut fetcher = QuoteFetcher::new(source.clone(), store(&dir), Arc::new(Diagnostics::new()))
            .with_preflight_probe(true);
        fetcher.fetch();
        assert!(fetcher.settle(Duration::from_secs(15)));

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(!fetcher.error().is_empty());
        assert!(!fetcher.quote().has_content());
    }
}
