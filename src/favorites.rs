use crate::config::FavoriteMatch;
use crate::store::{JsonStore, StoreError, FAVORITES_KEY};
use crate::types::quote::Quote;
use tracing::{info, warn};

/// The user's saved quotes, mirrored in full to the store on every change.
#[derive(Debug)]
pub struct Favorites {
    store: JsonStore,
    matching: FavoriteMatch,
    items: Vec<Quote>,
}

impl Favorites {
    /// Loads the list from the store. Absent or undecodable data is an empty list.
    pub fn load(store: JsonStore, matching: FavoriteMatch) -> Self {
        let items: Vec<Quote> = store.get_or_default(FAVORITES_KEY);
        info!("loaded {} favorites", items.len());
        Favorites { store, matching, items }
    }

    pub fn list(&self) -> &[Quote] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn same(&self, a: &Quote, b: &Quote) -> bool {
        match self.matching {
            FavoriteMatch::Content => a.content == b.content,
            FavoriteMatch::ContentAndAuthor => a.content == b.content && a.author == b.author,
        }
    }

    pub fn contains(&self, quote: &Quote) -> bool {
        self.items.iter().any(|fav| self.same(fav, quote))
    }

    /// Removes every matching entry if there is one, otherwise appends `quote`.
    /// The in-memory list changes even if persisting it fails.
    pub fn toggle(&mut self, quote: &Quote) -> Result<(), StoreError> {
        if self.contains(quote) {
            let matching = self.matching;
            self.items.retain(|fav| match matching {
                FavoriteMatch::Content => fav.content != quote.content,
                FavoriteMatch::ContentAndAuthor => fav.content != quote.content || fav.author != quote.author,
            });
        } else {
            self.items.push(quote.clone());
        }
        self.store.set(FAVORITES_KEY, &self.items).map_err(|e| {
            warn!("failed to persist favorites: {}", e);
            e
        })
    }
}
