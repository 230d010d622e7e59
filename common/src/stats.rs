//! Card type statistics for a set of deck entries.

use crate::deck::DeckCardEntry;

/// The single bucket a card is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeBucket {
    Creature,
    Land,
    Artifact,
    Planeswalker,
    Enchantment,
    Spell,
}

impl TypeBucket {
    /// Classify a type line. Earlier buckets win, so an artifact creature is a creature.
    #[must_use]
    pub fn classify(type_line: &str) -> Self {
        const ORDER: [(&str, TypeBucket); 5] = [
            ("creature", TypeBucket::Creature),
            ("land", TypeBucket::Land),
            ("artifact", TypeBucket::Artifact),
            ("planeswalker", TypeBucket::Planeswalker),
            ("enchantment", TypeBucket::Enchantment),
        ];

        let type_line = type_line.to_lowercase();
        ORDER
            .into_iter()
            .find(|(word, _)| type_line.contains(word))
            .map_or(Self::Spell, |(_, bucket)| bucket)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeckStats {
    pub total_cards: u32,
    pub creatures: u32,
    pub spells: u32,
    pub lands: u32,
    pub artifacts: u32,
    pub planeswalkers: u32,
    pub enchantments: u32,
}

impl DeckStats {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a DeckCardEntry>) -> Self {
        entries
            .into_iter()
            .fold(Self::default(), |mut stats, entry| {
                stats.fold(entry);
                stats
            })
    }

    fn fold(&mut self, entry: &DeckCardEntry) {
        let counter = match TypeBucket::classify(&entry.card.type_line) {
            TypeBucket::Creature => &mut self.creatures,
            TypeBucket::Land => &mut self.lands,
            TypeBucket::Artifact => &mut self.artifacts,
            TypeBucket::Planeswalker => &mut self.planeswalkers,
            TypeBucket::Enchantment => &mut self.enchantments,
            TypeBucket::Spell => &mut self.spells,
        };
        *counter = counter.saturating_add(entry.quantity);
        self.total_cards = self.total_cards.saturating_add(entry.quantity);
    }
}
