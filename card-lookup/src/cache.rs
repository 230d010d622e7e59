use common::{
    card::Card,
    lookup::{CardLookup, LookupError, SearchPage},
};
use log::debug;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Id(String),
    Name(String),
}

impl Key {
    /// Exact name lookups ignore case, so the cache does as well.
    fn name(name: &str) -> Self {
        Self::Name(name.to_lowercase())
    }
}

/// Remembers cards resolved by name or id.
///
/// Failed lookups are not cached, so a card that could not be found because of a network error
/// is requested again next time.
pub struct CachedLookup<L> {
    inner: L,
    cards: Mutex<FxHashMap<Key, Card>>,
}

impl<L> CachedLookup<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cards: Mutex::default(),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Number of cached keys.
    pub async fn len(&self) -> usize {
        self.cards.lock().await.len()
    }

    async fn cached(&self, key: &Key) -> Option<Card> {
        let card = self.cards.lock().await.get(key).cloned();
        if card.is_some() {
            debug!("Cache hit for {key:?}");
        }
        card
    }

    async fn remember(&self, key: Key, card: &Card) {
        let mut cards = self.cards.lock().await;
        cards.insert(Key::Id(card.id.clone()), card.clone());
        cards.insert(key, card.clone());
    }
}

impl<L: CardLookup + Sync> CardLookup for CachedLookup<L> {
    async fn autocomplete(&self, prefix: &str) -> Vec<String> {
        self.inner.autocomplete(prefix).await
    }

    async fn search_cards(&self, query: &str, page: u32) -> SearchPage {
        self.inner.search_cards(query, page).await
    }

    async fn get_card_by_name(&self, name: &str) -> Result<Card, LookupError> {
        let key = Key::name(name);
        if let Some(card) = self.cached(&key).await {
            return Ok(card);
        }

        let card = self.inner.get_card_by_name(name).await?;
        self.remember(key, &card).await;
        Ok(card)
    }

    async fn get_card_by_id(&self, id: &str) -> Result<Card, LookupError> {
        let key = Key::Id(id.to_owned());
        if let Some(card) = self.cached(&key).await {
            return Ok(card);
        }

        let card = self.inner.get_card_by_id(id).await?;
        self.remember(key, &card).await;
        Ok(card)
    }

    async fn get_card_prints(&self, card_id: &str) -> Vec<Card> {
        self.inner.get_card_prints(card_id).await
    }
}
