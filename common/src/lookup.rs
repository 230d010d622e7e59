//! Access to the card database.

use std::future::Future;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::card::Card;

/// Queries shorter than this (in characters) never match anything.
pub const MIN_QUERY_LENGTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("card not found: {0}")]
    NotFound(String),
    #[error("card database unavailable: {0}")]
    Transport(String),
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SearchPage {
    pub data: Vec<Card>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub total_cards: usize,
}

#[must_use]
pub fn is_short_query(query: &str) -> bool {
    query.chars().count() < MIN_QUERY_LENGTH
}

/// Resolves card names and ids to card data.
///
/// Only the exact lookups report errors. The listing operations degrade to empty results when the
/// database can not be reached, so callers can show "no results" instead of failing.
pub trait CardLookup {
    /// Card names starting with `prefix`.
    fn autocomplete(&self, prefix: &str) -> impl Future<Output = Vec<String>> + Send;

    /// Full text search. Pages are numbered from one.
    fn search_cards(&self, query: &str, page: u32) -> impl Future<Output = SearchPage> + Send;

    /// Card with exactly this name.
    fn get_card_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Card, LookupError>> + Send;

    fn get_card_by_id(&self, id: &str) -> impl Future<Output = Result<Card, LookupError>> + Send;

    /// All printings of the card with this id, oldest first.
    fn get_card_prints(&self, card_id: &str) -> impl Future<Output = Vec<Card>> + Send;
}

/// A card database held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLookup {
    cards: Vec<Card>,
    by_id: FxHashMap<String, usize>,
    by_name: FxHashMap<String, usize>,
}

impl MemoryLookup {
    /// Results per search page.
    pub const PAGE_SIZE: usize = 175;

    /// Maximum number of autocomplete suggestions.
    pub const AUTOCOMPLETE_LIMIT: usize = 20;

    pub fn new(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut result = Self::default();
        for card in cards {
            result.insert(card);
        }
        result
    }

    /// Add a card, replacing any card with the same id.
    ///
    /// Name lookups resolve to the first printing inserted under that name.
    pub fn insert(&mut self, card: Card) {
        if let Some(&idx) = self.by_id.get(&card.id) {
            let old_name = self.cards[idx].name.to_lowercase();
            let new_name = card.name.to_lowercase();
            self.cards[idx] = card;
            if old_name != new_name {
                self.unlink_name(old_name, idx);
                self.by_name.entry(new_name).or_insert(idx);
            }
            return;
        }

        let idx = self.cards.len();
        self.by_id.insert(card.id.clone(), idx);
        self.by_name.entry(card.name.to_lowercase()).or_insert(idx);
        self.cards.push(card);
    }

    /// Point `name` away from the card at `idx`, to another printing if there is one.
    fn unlink_name(&mut self, name: String, idx: usize) {
        if self.by_name.get(&name) != Some(&idx) {
            return;
        }

        match self
            .cards
            .iter()
            .position(|card| card.name.to_lowercase() == name)
        {
            Some(other) => self.by_name.insert(name, other),
            None => self.by_name.remove(&name),
        };
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn matching_names(&self, predicate: impl Fn(&str) -> bool) -> impl Iterator<Item = &Card> {
        self.cards
            .iter()
            .filter(move |card| predicate(&card.name.to_lowercase()))
            .unique_by(|card| card.name.clone())
            .sorted_by(|lhs, rhs| lhs.name.cmp(&rhs.name))
    }
}

impl CardLookup for MemoryLookup {
    async fn autocomplete(&self, prefix: &str) -> Vec<String> {
        if is_short_query(prefix) {
            return Vec::new();
        }

        let prefix = prefix.to_lowercase();
        self.matching_names(|name| name.starts_with(&prefix))
            .take(Self::AUTOCOMPLETE_LIMIT)
            .map(|card| card.name.clone())
            .collect()
    }

    async fn search_cards(&self, query: &str, page: u32) -> SearchPage {
        if is_short_query(query) {
            return SearchPage::default();
        }

        let query = query.to_lowercase();
        let matches = self
            .matching_names(|name| name.contains(&query))
            .collect::<Vec<_>>();

        let page = usize::try_from(page.max(1)).unwrap_or(usize::MAX);
        let start = (page - 1).saturating_mul(Self::PAGE_SIZE);
        SearchPage {
            data: matches
                .iter()
                .skip(start)
                .take(Self::PAGE_SIZE)
                .map(|&card| card.clone())
                .collect(),
            has_more: matches.len() > start.saturating_add(Self::PAGE_SIZE),
            total_cards: matches.len(),
        }
    }

    async fn get_card_by_name(&self, name: &str) -> Result<Card, LookupError> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&idx| self.cards[idx].clone())
            .ok_or_else(|| LookupError::NotFound(name.to_owned()))
    }

    async fn get_card_by_id(&self, id: &str) -> Result<Card, LookupError> {
        self.by_id
            .get(id)
            .map(|&idx| self.cards[idx].clone())
            .ok_or_else(|| LookupError::NotFound(id.to_owned()))
    }

    async fn get_card_prints(&self, card_id: &str) -> Vec<Card> {
        let Some(&idx) = self.by_id.get(card_id) else {
            return Vec::new();
        };

        let Some(oracle_id) = &self.cards[idx].oracle_id else {
            return vec![self.cards[idx].clone()];
        };

        // Printings without a release date come first
        self.cards
            .iter()
            .filter(|card| card.oracle_id.as_ref() == Some(oracle_id))
            .sorted_by_key(|card| card.released_at)
            .cloned()
            .collect()
    }
}
