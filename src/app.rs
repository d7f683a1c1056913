use crate::config::Config;
use crate::diagnostics::{context, ConnectivityReport, Diagnostics, ErrorBoundary, ProbeTarget};
use crate::favorites::Favorites;
use crate::quote_fetcher::QuoteFetcher;
use crate::remote::{FetchError, HttpQuoteSource, HttpTranslator, QuoteSource, TranslationError, Translator};
use crate::store::{JsonStore, StoreError, FAVORITES_KEY, QUOTE_KEY};
use crate::task::TaskChannel;
use crate::translation::{CurrentTranslation, FavoriteTranslations};
use crate::types::quote::{Quote, QuoteKey};
use crate::ui::{diagnostics_window, fallback, favorites_view, random_quote};
use eframe::{egui, App};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Route {
    Random,
    Favorites,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Random => "/",
            Route::Favorites => "/favorites",
        }
    }

    #[cfg(test)]
    pub fn from_path(path: &str) -> Option<Route> {
        match path {
            "/" | "" => Some(Route::Random),
            "/favorites" => Some(Route::Favorites),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("could not open the data store: {0}")]
    Store(#[from] StoreError),
    #[error("could not set up the quote client: {0}")]
    Quotes(#[from] FetchError),
    #[error("could not set up the translation client: {0}")]
    Translator(#[from] TranslationError),
}

/// Everything the views need from the outside world.
#[derive(Clone)]
pub struct Services {
    pub store: JsonStore,
    pub quotes: Arc<dyn QuoteSource>,
    pub translator: Arc<dyn Translator>,
    pub diagnostics: Arc<Diagnostics>,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let store = JsonStore::open(config.store_dir())?;
        let quotes = HttpQuoteSource::new(&config.quote_endpoint, config.request_timeout())?;
        let translator =
            HttpTranslator::new(&config.translate_endpoint, &config.source_language, config.request_timeout())?;
        Ok(Services {
            store,
            quotes: Arc::new(quotes),
            translator: Arc::new(translator),
            diagnostics: Arc::new(Diagnostics::new()),
        })
    }
}

/// State that lives as long as the views are mounted. Rebuilt on reload.
pub struct Views {
    pub fetcher: QuoteFetcher,
    pub current_translation: CurrentTranslation,
    pub favorites: Favorites,
    pub favorite_translations: FavoriteTranslations,
}

impl Views {
    pub fn mount(config: &Config, services: &Services) -> Self {
        let mut fetcher = QuoteFetcher::new(
            Arc::clone(&services.quotes),
            services.store.clone(),
            Arc::clone(&services.diagnostics),
        )
        .with_preflight_probe(config.preflight_probe);
        fetcher.mount();
        Views {
            fetcher,
            current_translation: CurrentTranslation::new(
                Arc::clone(&services.translator),
                Arc::clone(&services.diagnostics),
                &config.target_language,
            ),
            favorites: Favorites::load(services.store.clone(), config.favorite_match),
            favorite_translations: FavoriteTranslations::new(
                Arc::clone(&services.translator),
                Arc::clone(&services.diagnostics),
                &config.target_language,
            ),
        }
    }

    /// Saves or removes `quote`. Rows that leave the list lose their
    /// translation, so a quote saved again starts untranslated.
    pub fn toggle_favorite(&mut self, quote: &Quote) -> Result<(), StoreError> {
        let result = self.favorites.toggle(quote);
        let kept: HashSet<QuoteKey> = self.favorites.list().iter().map(Quote::key).collect();
        self.favorite_translations.retain(|key| kept.contains(key));
        result
    }

    fn poll(&mut self) -> bool {
        let fetched = self.fetcher.poll();
        let current = self.current_translation.poll();
        let rows = self.favorite_translations.poll();
        fetched || current || rows
    }

    fn busy(&self) -> bool {
        self.fetcher.is_loading() || self.current_translation.is_translating() || self.favorite_translations.any_in_flight()
    }
}

pub struct QuotebookApp {
    config: Config,
    config_error: Option<String>,
    services: Services,
    route: Route,
    views: Views,
    boundary: ErrorBoundary,
    show_diagnostics: bool,
    connectivity_tasks: TaskChannel<ConnectivityReport>,
    connectivity: Option<ConnectivityReport>,
    checking_connectivity: bool,
}

impl QuotebookApp {
    pub fn new(config: Config, config_error: Option<String>, services: Services, route: Route) -> Self {
        info!(route = route.path(), store = ?services.store.root(), "mounting views");
        let views = Views::mount(&config, &services);
        QuotebookApp {
            config,
            config_error,
            services,
            route,
            views,
            boundary: ErrorBoundary::new(),
            show_diagnostics: false,
            connectivity_tasks: TaskChannel::new(),
            connectivity: None,
            checking_connectivity: false,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn navigate(&mut self, route: Route) {
        if self.route != route {
            info!(from = self.route.path(), to = route.path(), "navigate");
            self.route = route;
        }
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut Views {
        &mut self.views
    }

    pub fn boundary(&self) -> &ErrorBoundary {
        &self.boundary
    }

    /// Throws away in-memory view state and mounts again from the store.
    pub fn reload(&mut self) {
        info!("reloading views from store");
        self.views = Views::mount(&self.config, &self.services);
        self.boundary.reset();
    }

    /// Wipes the stored quote and favorites, then reloads.
    pub fn reset_local_state(&mut self) {
        for key in [QUOTE_KEY, FAVORITES_KEY] {
            if let Err(e) = self.services.store.remove(key) {
                warn!("could not remove {}: {}", key, e);
            }
        }
        self.reload();
    }

    fn check_connectivity(&mut self) {
        let targets = vec![
            ProbeTarget::new("Quote API", &self.config.quote_endpoint, true),
            ProbeTarget::new("Translation API", &self.config.translate_endpoint, false),
            ProbeTarget::new("GitHub", "https://api.github.com", false),
        ];
        let diagnostics = Arc::clone(&self.services.diagnostics);
        match self.connectivity_tasks.spawn("connectivity", move || diagnostics.diagnose_connectivity(&targets)) {
            Ok(()) => self.checking_connectivity = true,
            Err(e) => warn!("could not start connectivity check: {}", e),
        }
    }

    fn poll(&mut self) -> bool {
        let mut changed = self.views.poll();
        while let Some(report) = self.connectivity_tasks.try_recv() {
            self.connectivity = Some(report);
            self.checking_connectivity = false;
            changed = true;
        }
        changed
    }

    /// Draws one frame. Split from [`App::update`] so it can run headless.
    pub fn ui(&mut self, ctx: &egui::Context) {
        self.poll();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Reload").clicked() {
                        self.reload();
                        ui.close_menu();
                    }
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.separator();
                let mut route = self.route;
                ui.selectable_value(&mut route, Route::Random, "Random Quote");
                ui.selectable_value(&mut route, Route::Favorites, format!("Favorites ({})", self.views.favorites.len()));
                self.navigate(route);
                ui.separator();
                ui.toggle_value(&mut self.show_diagnostics, "Diagnostics");
            });
            if let Some(err) = &self.config_error {
                ui.colored_label(egui::Color32::RED, format!("Config: {}", err));
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(record) = self.boundary.tripped() {
                match fallback::show(ui, record) {
                    Some(fallback::FallbackAction::Reload) => self.reload(),
                    Some(fallback::FallbackAction::Reset) => self.reset_local_state(),
                    None => {}
                }
                return;
            }

            let route = self.route;
            let diagnostics = Arc::clone(&self.services.diagnostics);
            let views = &mut self.views;
            self.boundary.guard(&diagnostics, context(&[("route", route.path())]), || match route {
                Route::Random => random_quote::show(ui, views, &diagnostics),
                Route::Favorites => favorites_view::show(ui, views, &diagnostics),
            });
        });

        if self.show_diagnostics {
            let report = self.services.diagnostics.report();
            let requested = diagnostics_window::show(
                ctx,
                &mut self.show_diagnostics,
                &report,
                self.connectivity.as_ref(),
                self.checking_connectivity,
            );
            if requested && !self.checking_connectivity {
                self.check_connectivity();
            }
        }

        if self.views.busy() || self.checking_connectivity {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl App for QuotebookApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WAIT: Duration = Duration::from_secs(5);

    struct Counting {
        calls: AtomicUsize,
    }

    impl QuoteSource for Counting {
        fn endpoint(&self) -> &str {
            "counting://quotes"
        }
        fn fetch_quote(&self) -> Result<Quote, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Quote::new(format!("Quote number {}", n), "Counter"))
        }
    }

    struct Echo;

    impl Translator for Echo {
        fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
            Ok(format!("[{}] {}", target, text))
        }
    }

    fn services(dir: &tempfile::TempDir, quotes: Arc<Counting>) -> Services {
        Services {
            store: JsonStore::open(dir.path()).unwrap(),
            quotes,
            translator: Arc::new(Echo),
            diagnostics: Arc::new(Diagnostics::new()),
        }
    }

    fn frame(app: &mut QuotebookApp) {
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| app.ui(ctx));
    }

    #[test]
    fn routes_map_to_paths() {
        assert_eq!(Route::from_path("/favorites"), Some(Route::Favorites));
        assert_eq!(Route::from_path("/"), Some(Route::Random));
        assert_eq!(Route::from_path("/nope"), None);
        assert_eq!(Route::Favorites.path(), "/favorites");
    }

    #[test]
    fn empty_store_fetches_once_and_reload_reuses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let quotes = Arc::new(Counting { calls: AtomicUsize::new(0) });

        let mut app = QuotebookApp::new(Config::default(), None, services(&dir, quotes.clone()), Route::Random);
        assert!(app.views_mut().fetcher.settle(WAIT));
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 1);
        let stored: Option<Quote> = JsonStore::open(dir.path()).unwrap().get(QUOTE_KEY);
        assert_eq!(stored, Some(Quote::new("Quote number 1", "Counter")));

        let app = QuotebookApp::new(Config::default(), None, services(&dir, quotes.clone()), Route::Random);
        assert!(!app.views().fetcher.is_loading());
        assert_eq!(app.views().fetcher.quote().content, "Quote number 1");
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn both_routes_render_headless() {
        let dir = tempfile::tempdir().unwrap();
        let quotes = Arc::new(Counting { calls: AtomicUsize::new(0) });
        let mut app = QuotebookApp::new(Config::default(), None, services(&dir, quotes), Route::Random);
        app.views_mut().fetcher.settle(WAIT);
        let quote = app.views().fetcher.quote().clone();
        app.views_mut().favorites.toggle(&quote).unwrap();

        frame(&mut app);
        app.navigate(Route::Favorites);
        frame(&mut app);
        assert!(app.boundary().tripped().is_none());
        assert_eq!(app.route(), Route::Favorites);
    }

    #[test]
    fn reset_clears_store_and_refetches() {
        let dir = tempfile::tempdir().unwrap();
        let quotes = Arc::new(Counting { calls: AtomicUsize::new(0) });
        let mut app = QuotebookApp::new(Config::default(), None, services(&dir, quotes.clone()), Route::Random);
        app.views_mut().fetcher.settle(WAIT);
        let quote = app.views().fetcher.quote().clone();
        app.views_mut().favorites.toggle(&quote).unwrap();

        app.reset_local_state();
        assert!(app.views().favorites.is_empty());
        assert!(app.views_mut().fetcher.settle(WAIT));
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 2);
        assert_eq!(app.views().fetcher.quote().content, "Quote number 2");
    }
    #[test]
    fn favorite_saved_again_starts_untranslated() {
        let dir = tempfile::tempdir().unwrap();
        let quotes = Arc::new(Counting { calls: AtomicUsize::new(0) });
        let mut app = QuotebookApp::new(Config::default(), None, services(&dir, quotes), Route::Random);
        let quote = Quote::new("Q", "A");
        let key = quote.key();
        let views = app.views_mut();

        views.toggle_favorite(&quote).unwrap();
        views.favorite_translations.toggle(key.clone(), "Q", "A");
        assert!(views.favorite_translations.settle(WAIT));
        assert!(views.favorite_translations.has_translation(&key));

        views.toggle_favorite(&quote).unwrap();
        views.toggle_favorite(&quote).unwrap();
        assert!(views.favorites.contains(&quote));
        assert!(views.favorite_translations.translation(&key).is_empty());
        assert!(!views.favorite_translations.is_enabled(&key));
    }

    #[test]
    fn entry_removed_by_same_content_loses_its_translation() {
        let dir = tempfile::tempdir().unwrap();
        let quotes = Arc::new(Counting { calls: AtomicUsize::new(0) });
        let mut app = QuotebookApp::new(Config::default(), None, services(&dir, quotes), Route::Random);
        let saved = Quote::new("A", "X");
        let views = app.views_mut();
        views.toggle_favorite(&saved).unwrap();
        views.favorite_translations.toggle(saved.key(), "A", "X");
        views.favorite_translations.settle(WAIT);

        // Content-only matching: a different author still removes the saved row.
        views.toggle_favorite(&Quote::new("A", "Y")).unwrap();
        assert!(views.favorites.is_empty());
        assert!(!views.favorite_translations.has_translation(&saved.key()));
    }
}
