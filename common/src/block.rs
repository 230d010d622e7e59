use std::fmt::{self, Display};

/// Colors cycled through for new blocks.
pub const PALETTE: [&str; 7] = [
    "#ef4444", // red
    "#3b82f6", // blue
    "#10b981", // green
    "#f59e0b", // yellow
    "#8b5cf6", // purple
    "#ec4899", // pink
    "#6b7280", // gray
];

/// Color for the block at position `index`.
#[must_use]
pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// The fixed blocks the deck list parser sorts cards into.
///
/// A new deck starts with one block per variant, using [`CanonicalBlock::id`] as block id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalBlock {
    Commanders,
    Nonlands,
    Lands,
    Maybeboard,
}

impl CanonicalBlock {
    pub fn iter() -> impl Iterator<Item = Self> {
        [
            Self::Commanders,
            Self::Nonlands,
            Self::Lands,
            Self::Maybeboard,
        ]
        .into_iter()
    }

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Commanders => "commanders",
            Self::Nonlands => "nonlands",
            Self::Lands => "lands",
            Self::Maybeboard => "maybeboard",
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::iter().find(|block| block.id() == id)
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        palette_color(self as usize)
    }
}

impl Display for CanonicalBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Commanders => "Commanders",
            Self::Nonlands => "Nonlands",
            Self::Lands => "Lands",
            Self::Maybeboard => "Maybeboard",
        };

        write!(f, "{name}")
    }
}
