use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{block::CanonicalBlock, card::Card};

/// A number of copies of one card within one block.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckCardEntry {
    pub card: Card,
    pub quantity: u32,
    pub block_id: String,
}

/// Add `quantity` copies of `card`, merging with an existing entry for the same card id.
///
/// Returns `false` and leaves the entries untouched if the merged quantity would overflow.
pub(crate) fn merge_entry(
    entries: &mut Vec<DeckCardEntry>,
    card: Card,
    quantity: u32,
    block_id: &str,
) -> bool {
    if let Some(entry) = entries.iter_mut().find(|entry| entry.card.id == card.id) {
        let Some(merged) = entry.quantity.checked_add(quantity) else {
            return false;
        };
        entry.quantity = merged;
        return true;
    }

    entries.push(DeckCardEntry {
        card,
        quantity,
        block_id: block_id.to_owned(),
    });
    true
}

pub(crate) fn sum_quantities<'a>(entries: impl IntoIterator<Item = &'a DeckCardEntry>) -> u32 {
    entries
        .into_iter()
        .fold(0, |total, entry| total.saturating_add(entry.quantity))
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Block {
    pub id: String,
    pub name: String,
    pub color: String,
    pub cards: Vec<DeckCardEntry>,
}

impl Block {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            cards: Vec::new(),
        }
    }

    #[must_use]
    pub fn canonical(block: CanonicalBlock) -> Self {
        Self::new(block.id(), block.to_string(), block.color())
    }

    #[must_use]
    pub fn entry(&self, card_id: &str) -> Option<&DeckCardEntry> {
        self.cards.iter().find(|entry| entry.card.id == card_id)
    }

    /// Insert copies of a card; repeated adds of the same card increase the quantity.
    ///
    /// Returns `false` without changing the block if the quantity would overflow.
    pub fn add(&mut self, card: Card, quantity: u32) -> bool {
        merge_entry(&mut self.cards, card, quantity, &self.id)
    }

    /// Whether `quantity` more copies of a card fit in its entry.
    #[must_use]
    pub fn can_add(&self, card_id: &str, quantity: u32) -> bool {
        self.entry(card_id)
            .is_none_or(|entry| entry.quantity.checked_add(quantity).is_some())
    }

    /// Remove copies of a card.
    ///
    /// Without a quantity, with zero, or with one at least as large as the current quantity, the
    /// entry is removed entirely. Returns whether an entry was found.
    pub fn remove(&mut self, card_id: &str, quantity: Option<u32>) -> bool {
        let Some(idx) = self.cards.iter().position(|entry| entry.card.id == card_id) else {
            return false;
        };

        match quantity {
            Some(quantity) if quantity > 0 && quantity < self.cards[idx].quantity => {
                self.cards[idx].quantity -= quantity;
            }
            _ => {
                self.cards.remove(idx);
            }
        }

        true
    }

    /// Remove the entry for a card and return it.
    pub fn take(&mut self, card_id: &str) -> Option<DeckCardEntry> {
        let idx = self.cards.iter().position(|entry| entry.card.id == card_id)?;
        Some(self.cards.remove(idx))
    }

    /// Replace the block contents, rewriting the entries' block ids.
    pub fn replace_cards(&mut self, cards: Vec<DeckCardEntry>) {
        self.cards = cards;
        for entry in &mut self.cards {
            entry.block_id.clone_from(&self.id);
        }
    }

    #[must_use]
    pub fn quantity(&self) -> u32 {
        sum_quantities(&self.cards)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    /// Assigned by the deck store on first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Sum of all entry quantities; kept current by [`Deck::recompute_total`].
    #[serde(default)]
    pub total_cards: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    /// An unsaved commander deck with the default blocks.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            description: None,
            blocks: CanonicalBlock::iter().map(Block::canonical).collect(),
            format: Some("Commander".to_owned()),
            total_cards: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn block_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| block.id == id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &DeckCardEntry> {
        self.blocks.iter().flat_map(|block| block.cards.iter())
    }

    /// Number of entries over all blocks.
    #[must_use]
    pub fn card_types(&self) -> usize {
        self.blocks.iter().map(|block| block.cards.len()).sum()
    }

    pub fn recompute_total(&mut self) -> u32 {
        self.total_cards = sum_quantities(self.entries());
        self.total_cards
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new("")
    }
}
