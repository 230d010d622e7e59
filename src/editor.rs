//! The deck being edited and every operation that changes it.
//!
//! All mutations keep `total_cards` equal to the sum of entry quantities and bump `updated_at`.
//! Operations referring to a block or card that does not exist, or that would push a quantity past
//! `u32::MAX`, leave the deck untouched and report that through their return value.

use common::{
    block::palette_color,
    card::Card,
    deck::{Block, Deck},
    deck_list::{self, ParsedDeck},
    lookup::CardLookup,
    stats::DeckStats,
};
use log::{debug, info, warn};

use crate::{
    import::{self, ImportError},
    store::{DeckStore, StoreError},
};

pub const NEW_BLOCK_NAME: &str = "New Block";

/// Changes to apply to a block; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub card_types: usize,
    pub total_cards: u32,
}

#[derive(Debug, Clone)]
pub struct DeckEditor {
    deck: Deck,
    next_block: usize,
}

impl DeckEditor {
    /// A fresh, unsaved deck.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_deck(Deck::new(name))
    }

    /// Edit a loaded deck.
    pub fn from_deck(mut deck: Deck) -> Self {
        deck.recompute_total();
        Self {
            deck,
            next_block: 0,
        }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn into_deck(self) -> Deck {
        self.deck
    }

    pub fn stats(&self) -> DeckStats {
        DeckStats::from_entries(self.deck.entries())
    }

    fn changed(&mut self) {
        self.deck.recompute_total();
        self.deck.touch();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.deck.name = name.into();
        self.deck.touch();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.deck.description = description.filter(|text| !text.is_empty());
        self.deck.touch();
    }

    pub fn set_format(&mut self, format: Option<String>) {
        self.deck.format = format.filter(|text| !text.is_empty());
        self.deck.touch();
    }

    /// Block ids are never reused within a session, even after deleting blocks.
    fn fresh_block_id(&mut self) -> String {
        loop {
            self.next_block += 1;
            let id = format!("block-{}", self.next_block);
            if self.deck.block(&id).is_none() {
                return id;
            }
        }
    }

    /// Append an empty block and return its id.
    pub fn add_block(&mut self) -> String {
        let id = self.fresh_block_id();
        let color = palette_color(self.deck.blocks.len());
        self.deck
            .blocks
            .push(Block::new(id.clone(), NEW_BLOCK_NAME, color));
        self.changed();

        debug!("Added block {id}");
        id
    }

    pub fn update_block(&mut self, block_id: &str, update: BlockUpdate) -> bool {
        let Some(block) = self.deck.block_mut(block_id) else {
            debug!("Block {block_id} not found");
            return false;
        };

        if let Some(name) = update.name {
            block.name = name;
        }
        if let Some(color) = update.color {
            block.color = color;
        }
        self.deck.touch();
        true
    }

    /// Remove a block together with the cards in it.
    pub fn delete_block(&mut self, block_id: &str) -> bool {
        let count = self.deck.blocks.len();
        self.deck.blocks.retain(|block| block.id != block_id);
        if self.deck.blocks.len() == count {
            debug!("Block {block_id} not found");
            return false;
        }

        debug!("Deleted block {block_id}");
        self.changed();
        true
    }

    pub fn add_card_to_block(&mut self, card: Card, block_id: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }

        if self.deck.total_cards.checked_add(quantity).is_none() {
            warn!("Adding {quantity}x {} would overflow the card count", card.name);
            return false;
        }

        let Some(block) = self.deck.block_mut(block_id) else {
            debug!("Block {block_id} not found, not adding {}", card.name);
            return false;
        };

        debug!("Adding {quantity}x {} to {}", card.name, block.name);
        if !block.add(card, quantity) {
            return false;
        }
        self.changed();
        true
    }

    /// Remove some or, without a quantity or with zero, all copies of a card from a block.
    pub fn remove_card_from_block(
        &mut self,
        card_id: &str,
        block_id: &str,
        quantity: Option<u32>,
    ) -> bool {
        let removed = self
            .deck
            .block_mut(block_id)
            .is_some_and(|block| block.remove(card_id, quantity));

        if removed {
            debug!("Removed {card_id} from {block_id}");
            self.changed();
        }
        removed
    }

    /// Move all copies of a card into another block, merging with copies already there.
    ///
    /// Nothing happens unless both blocks exist and the source holds the card.
    pub fn move_card(&mut self, card_id: &str, from_block: &str, to_block: &str) -> bool {
        if from_block == to_block {
            return self
                .deck
                .block(from_block)
                .is_some_and(|block| block.entry(card_id).is_some());
        }
        let Some(target) = self.deck.block(to_block) else {
            debug!("Block {to_block} not found");
            return false;
        };
        let moved = self
            .deck
            .block(from_block)
            .and_then(|block| block.entry(card_id))
            .map_or(0, |entry| entry.quantity);
        if !target.can_add(card_id, moved) {
            warn!("Moving {card_id} to {to_block} would overflow its quantity");
            return false;
        }

        let Some(entry) = self
            .deck
            .block_mut(from_block)
            .and_then(|block| block.take(card_id))
        else {
            return false;
        };

        debug!("Moving {}x {} to {to_block}", entry.quantity, entry.card.name);
        if let Some(target) = self.deck.block_mut(to_block) {
            target.add(entry.card, entry.quantity);
        }
        self.changed();
        true
    }

    /// Replace the canonical blocks with the cards of a deck list.
    ///
    /// The list is validated as a whole first; any malformed line rejects the import. Lines naming
    /// unknown cards are skipped. Other blocks keep their cards.
    pub async fn import_deck(
        &mut self,
        text: &str,
        lookup: &impl CardLookup,
    ) -> Result<ImportSummary, ImportError> {
        let validation = deck_list::validate_deck_format(text);
        if !validation.is_valid() {
            return Err(ImportError::InvalidFormat(validation));
        }

        let parsed = import::parse_deck_list(text, lookup).await;
        self.apply_import(parsed)
    }

    /// Second half of [`DeckEditor::import_deck`], for lists resolved elsewhere.
    pub fn apply_import(&mut self, parsed: ParsedDeck) -> Result<ImportSummary, ImportError> {
        if parsed.is_empty() {
            return Err(ImportError::NoCardsFound);
        }

        let summary = ImportSummary {
            card_types: parsed.card_types(),
            total_cards: parsed.total_cards(),
        };

        for (block, cards) in parsed.into_parts() {
            match self.deck.block_mut(block.id()) {
                Some(target) => target.replace_cards(cards),
                None if cards.is_empty() => {}
                None => warn!(
                    "Block {} was deleted, dropping {} imported cards",
                    block.id(),
                    cards.len()
                ),
            }
        }
        self.changed();

        info!(
            "Imported {} different cards ({} total)",
            summary.card_types, summary.total_cards
        );
        Ok(summary)
    }

    /// Store the deck, adopting the id and timestamps assigned by the store.
    ///
    /// On failure the deck is left as it was.
    pub fn save_deck(&mut self, store: &mut impl DeckStore) -> Result<(), StoreError> {
        let saved = store.save(&self.deck)?;
        self.deck.id = saved.id;
        self.deck.created_at = saved.created_at;
        self.deck.updated_at = saved.updated_at;

        debug!("Saved deck {}", self.deck.name);
        Ok(())
    }

    pub fn export_deck(&self) -> String {
        deck_list::export_deck(&self.deck)
    }
}
