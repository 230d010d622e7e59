//! Plain text deck lists.
//!
//! The format is line based:
//!
//! ```text
//! // Commander
//! 1 Atraxa, Grand Unifier
//! // Main deck
//! 4x Lightning Bolt
//! 10 Forest
//! ```
//!
//! Lines starting with `//` or `#` are comments. Comments mentioning a commander, a sideboard or
//! a maybeboard switch the section subsequent cards are sorted into; comments mentioning lands or
//! the main deck switch back to the default section. Every other non-blank line is
//! `<quantity>[x] <card name>`.
//!
//! Validation and line parsing work offline. Turning card lines into deck entries requires the
//! resolved card data, which is used to sort cards of the default section into lands and nonlands.

use std::{
    fmt::{self, Display, Write},
    ops::Index,
};

use itertools::Itertools;
use thiserror::Error;

use crate::{
    block::CanonicalBlock,
    card::Card,
    deck::{merge_entry, sum_quantities, Deck, DeckCardEntry},
};

/// Largest quantity accepted on a single line.
pub const MAX_QUANTITY: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
    InvalidFormat,
    InvalidQuantity,
    MissingCardName,
}

impl Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::InvalidFormat => "invalid format",
            Self::InvalidQuantity => "invalid quantity",
            Self::MissingCardName => "missing card name",
        };

        write!(f, "{message}")
    }
}

/// A line that can not be read as a card line.
///
/// Lines are numbered from one, counting only non-blank lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Line {line}: {kind}")]
pub struct FormatError {
    pub line: usize,
    pub kind: FormatErrorKind,
}

/// Result of [`validate_deck_format`], holding every error found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub errors: Vec<FormatError>,
}

impl Validation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.iter().join("\n"))
    }
}

/// Section of the list a card line appears in.
///
/// Lands are not a section: cards of the default section are routed to the lands block based on
/// their type line, see [`route`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Section {
    #[default]
    Nonlands,
    Commanders,
    Maybeboard,
}

impl Section {
    /// Section after reading a comment with the given text (marker already stripped).
    #[must_use]
    pub fn after_comment(self, comment: &str) -> Self {
        let comment = comment.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|word| comment.contains(word));

        if mentions(&["commander"]) {
            Self::Commanders
        } else if mentions(&["outside", "sideboard", "maybe"]) {
            Self::Maybeboard
        } else if mentions(&["land", "main"]) {
            Self::Nonlands
        } else {
            self
        }
    }
}

/// Block a resolved card of a section ends up in.
///
/// Cards of the default section go to the lands block only if their type line names a land and
/// no other card type. Double-faced cards with a land face and unrecognized type lines stay with
/// the nonlands.
#[must_use]
pub fn route(section: Section, type_line: &str) -> CanonicalBlock {
    const NONLAND_TYPES: [&str; 6] = [
        "creature",
        "artifact",
        "enchantment",
        "planeswalker",
        "instant",
        "sorcery",
    ];

    match section {
        Section::Commanders => CanonicalBlock::Commanders,
        Section::Maybeboard => CanonicalBlock::Maybeboard,
        Section::Nonlands => {
            let type_line = type_line.to_lowercase();
            let has_land = type_line.contains("land");
            let has_nonland = NONLAND_TYPES.iter().any(|word| type_line.contains(word));

            if has_land && !has_nonland {
                CanonicalBlock::Lands
            } else {
                CanonicalBlock::Nonlands
            }
        }
    }
}

/// A valid card line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLine {
    pub line: usize,
    pub section: Section,
    pub quantity: u32,
    pub name: String,
}

enum Line<'a> {
    Comment(&'a str),
    Card(Result<(u32, &'a str), FormatErrorKind>),
}

mod grammar {
    use nom::{
        bytes::complete::{tag, take_while1},
        character::complete::digit1,
        combinator::{opt, rest},
        sequence::{terminated, tuple},
        IResult, Parser,
    };

    /// `<digits>[x]<whitespace><name>`, returning quantity digits and name.
    pub fn card_line(input: &str) -> IResult<&str, (&str, &str)> {
        tuple((
            terminated(digit1, opt(tag("x"))),
            take_while1(char::is_whitespace),
            rest,
        ))
        .map(|(quantity, _, name)| (quantity, name))
        .parse(input)
    }
}

fn read_line(line: &str) -> Line<'_> {
    if let Some(comment) = line.strip_prefix("//").or_else(|| line.strip_prefix('#')) {
        return Line::Comment(comment.trim());
    }

    let Ok((_, (quantity, name))) = grammar::card_line(line) else {
        return Line::Card(Err(FormatErrorKind::InvalidFormat));
    };

    let quantity = match quantity.parse::<u32>() {
        Ok(quantity) if (1..=MAX_QUANTITY).contains(&quantity) => quantity,
        _ => return Line::Card(Err(FormatErrorKind::InvalidQuantity)),
    };

    let name = name.trim();
    if name.is_empty() {
        return Line::Card(Err(FormatErrorKind::MissingCardName));
    }

    Line::Card(Ok((quantity, name)))
}

/// Non-blank lines, trimmed and numbered from one.
fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, Line<'_>)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(idx, line)| (idx + 1, read_line(line)))
}

/// Check every line of a deck list without resolving any card names.
#[must_use]
pub fn validate_deck_format(text: &str) -> Validation {
    let errors = numbered_lines(text)
        .filter_map(|(line, content)| match content {
            Line::Card(Err(kind)) => Some(FormatError { line, kind }),
            _ => None,
        })
        .collect();

    Validation { errors }
}

/// Card lines in order, tagged with the section they appear in.
///
/// Lines failing validation are left out.
#[must_use]
pub fn parse_lines(text: &str) -> Vec<ListLine> {
    let mut section = Section::default();
    let mut result = Vec::new();

    for (line, content) in numbered_lines(text) {
        match content {
            Line::Comment(comment) => section = section.after_comment(comment),
            Line::Card(Ok((quantity, name))) => result.push(ListLine {
                line,
                section,
                quantity,
                name: name.to_owned(),
            }),
            Line::Card(Err(_)) => {}
        }
    }

    result
}

/// Deck entries sorted into the canonical blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDeck {
    parts: [Vec<DeckCardEntry>; 4],
}

impl ParsedDeck {
    /// Assemble entries from lines and the cards they resolved to.
    pub fn from_resolved(resolved: impl IntoIterator<Item = (ListLine, Card)>) -> Self {
        let mut result = Self::default();
        for (line, card) in resolved {
            let block = route(line.section, &card.type_line);
            result.add(block, card, line.quantity);
        }
        result
    }

    /// Returns `false` if the merged quantity would overflow; the lines are then dropped.
    pub fn add(&mut self, block: CanonicalBlock, card: Card, quantity: u32) -> bool {
        merge_entry(&mut self.parts[block as usize], card, quantity, block.id())
    }

    /// Number of distinct entries over all blocks.
    #[must_use]
    pub fn card_types(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn total_cards(&self) -> u32 {
        sum_quantities(self.parts.iter().flatten())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.card_types() == 0
    }

    pub fn into_parts(self) -> impl Iterator<Item = (CanonicalBlock, Vec<DeckCardEntry>)> {
        CanonicalBlock::iter().zip(self.parts)
    }
}

impl Index<CanonicalBlock> for ParsedDeck {
    type Output = Vec<DeckCardEntry>;

    fn index(&self, index: CanonicalBlock) -> &Self::Output {
        &self.parts[index as usize]
    }
}

/// Comment text must stay on a single line.
fn single_line(text: &str) -> String {
    text.lines().map(str::trim).join(" ")
}

/// Serialize a deck into the text format.
///
/// Blocks without cards are skipped.
pub fn write_deck(deck: &Deck, writer: &mut impl Write) -> fmt::Result {
    writeln!(writer, "// {}", single_line(&deck.name))?;
    if let Some(description) = deck.description.as_deref().filter(|d| !d.is_empty()) {
        writeln!(writer, "// {}", single_line(description))?;
    }
    writeln!(writer)?;

    for block in deck.blocks.iter().filter(|block| !block.cards.is_empty()) {
        writeln!(writer, "// {}", single_line(&block.name))?;
        for entry in &block.cards {
            writeln!(writer, "{} {}", entry.quantity, entry.card.name)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

#[must_use]
pub fn export_deck(deck: &Deck) -> String {
    let mut result = String::new();
    write_deck(deck, &mut result).unwrap(/* Write for String should never fail */);
    result
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use crate::{card::test_util::make_card, deck::Block};

    use super::*;

    fn error(line: usize, kind: FormatErrorKind) -> FormatError {
        FormatError { line, kind }
    }

    fn resolve_all(text: &str, cards: &[Card]) -> ParsedDeck {
        let by_name: HashMap<_, _> = cards.iter().map(|card| (card.name.as_str(), card)).collect();
        ParsedDeck::from_resolved(parse_lines(text).into_iter().filter_map(|line| {
            let card = by_name.get(line.name.as_str())?;
            Some((line, (*card).clone()))
        }))
    }

    fn summary(entries: &[DeckCardEntry]) -> Vec<(&str, u32)> {
        entries
            .iter()
            .map(|entry| (entry.card.name.as_str(), entry.quantity))
            .collect()
    }

    #[test]
    fn validation_reports_every_error() {
        let validation =
            validate_deck_format("4 Lightning Bolt\n0 Island\nfoo\n// Commander\n1 Atraxa");

        assert!(!validation.is_valid());
        assert_eq!(
            validation.errors,
            [
                error(2, FormatErrorKind::InvalidQuantity),
                error(3, FormatErrorKind::InvalidFormat),
            ]
        );
        assert_eq!(
            validation.to_string(),
            "Line 2: invalid quantity\nLine 3: invalid format"
        );
    }

    #[test]
    fn validation_accepts_variants() {
        let text = "\n  4x Lightning Bolt  \n# Sideboard\n99 Relentless Rats\n\t1\tSol Ring\r\n";
        assert!(validate_deck_format(text).is_valid());
        assert!(validate_deck_format("").is_valid());
    }

    #[test]
    fn validation_edge_cases() {
        let validation = validate_deck_format(
            "100 Relentless Rats\n4X Lightning Bolt\n4xLightning Bolt\nx4 Bolt\n/ Bolt\n99999999999999999999 Bolt\n4x",
        );

        assert_eq!(
            validation.errors,
            [
                error(1, FormatErrorKind::InvalidQuantity),
                error(2, FormatErrorKind::InvalidFormat),
                error(3, FormatErrorKind::InvalidFormat),
                error(4, FormatErrorKind::InvalidFormat),
                error(5, FormatErrorKind::InvalidFormat),
                error(6, FormatErrorKind::InvalidQuantity),
                error(7, FormatErrorKind::InvalidFormat),
            ]
        );
    }

    #[test]
    fn blank_lines_are_not_counted() {
        let validation = validate_deck_format("1 Sol Ring\n\n\nfoo");
        assert_eq!(validation.errors, [error(2, FormatErrorKind::InvalidFormat)]);
    }

    #[test]
    fn sections() {
        let lines = parse_lines(
            "1 A\n// Commander\n1 B\n// Combo pieces\n1 C\n// Outside the game\n1 D\n# Mainboard\n1 E\n//Maybe\n1 F\n// Lands\n1 G",
        );

        assert_eq!(
            lines
                .iter()
                .map(|line| (line.name.as_str(), line.section))
                .collect::<Vec<_>>(),
            [
                ("A", Section::Nonlands),
                ("B", Section::Commanders),
                ("C", Section::Commanders),
                ("D", Section::Maybeboard),
                ("E", Section::Nonlands),
                ("F", Section::Maybeboard),
                ("G", Section::Nonlands),
            ]
        );
    }

    #[test]
    fn parse_lines_skips_invalid() {
        let lines = parse_lines("4x Lightning Bolt\n0 Island\nfoo\n2 Counterspell");
        assert_eq!(
            lines,
            [
                ListLine {
                    line: 1,
                    section: Section::Nonlands,
                    quantity: 4,
                    name: "Lightning Bolt".to_owned(),
                },
                ListLine {
                    line: 4,
                    section: Section::Nonlands,
                    quantity: 2,
                    name: "Counterspell".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn routing() {
        for (type_line, block) in [
            ("Basic Land — Forest", CanonicalBlock::Lands),
            ("Land", CanonicalBlock::Lands),
            ("Legendary Land", CanonicalBlock::Lands),
            ("Artifact Land", CanonicalBlock::Nonlands),
            (
                "Legendary Creature — God // Legendary Land",
                CanonicalBlock::Nonlands,
            ),
            ("Instant", CanonicalBlock::Nonlands),
            ("Kindred", CanonicalBlock::Nonlands),
        ] {
            assert_eq!(route(Section::Nonlands, type_line), block, "{type_line}");
        }

        assert_eq!(
            route(Section::Commanders, "Basic Land — Forest"),
            CanonicalBlock::Commanders
        );
        assert_eq!(
            route(Section::Maybeboard, "Basic Land — Forest"),
            CanonicalBlock::Maybeboard
        );
    }

    #[test]
    fn section_routing() {
        let cards = [
            make_card("1", "Atraxa, Grand Unifier", "Legendary Creature — Phyrexian Angel"),
            make_card("2", "Lightning Bolt", "Instant"),
            make_card("3", "Forest", "Basic Land — Forest"),
        ];

        let parsed = resolve_all(
            "// Commander\n1 Atraxa, Grand Unifier\n// nonlands implied\n4 Lightning Bolt\n10 Forest",
            &cards,
        );

        assert_eq!(
            summary(&parsed[CanonicalBlock::Commanders]),
            [("Atraxa, Grand Unifier", 1)]
        );
        assert_eq!(
            summary(&parsed[CanonicalBlock::Nonlands]),
            [("Lightning Bolt", 4)]
        );
        assert_eq!(summary(&parsed[CanonicalBlock::Lands]), [("Forest", 10)]);
        assert!(parsed[CanonicalBlock::Maybeboard].is_empty());
        assert_eq!(parsed[CanonicalBlock::Lands][0].block_id, "lands");
        assert_eq!(parsed.total_cards(), 15);
        assert_eq!(parsed.card_types(), 3);
    }

    #[test]
    fn repeated_lines_merge() {
        let cards = [make_card("3", "Forest", "Basic Land — Forest")];
        let parsed = resolve_all("4 Forest\n// Maybeboard\n1 Forest\n// Lands\n6x Forest", &cards);

        assert_eq!(summary(&parsed[CanonicalBlock::Lands]), [("Forest", 10)]);
        assert_eq!(summary(&parsed[CanonicalBlock::Maybeboard]), [("Forest", 1)]);
    }

    #[test]
    fn unresolved_lines_are_dropped() {
        let parsed = resolve_all("1 Unknown Card", &[]);
        assert!(parsed.is_empty());
    }

    #[test]
    fn export() {
        let mut deck = Deck::new("Atraxa Superfriends");
        deck.description = Some("Proliferate all the things".to_owned());
        deck.block_mut("commanders").unwrap().add(
            make_card("1", "Atraxa, Grand Unifier", "Legendary Creature"),
            1,
        );
        deck.block_mut("lands")
            .unwrap()
            .add(make_card("3", "Forest", "Basic Land — Forest"), 10);
        let mut combo = Block::new("block-1", "Combo", "#8b5cf6");
        combo.add(make_card("4", "Doubling Season", "Enchantment"), 1);
        deck.blocks.push(combo);

        assert_eq!(
            export_deck(&deck),
            "// Atraxa Superfriends\n// Proliferate all the things\n\n\
             // Commanders\n1 Atraxa, Grand Unifier\n\n\
             // Lands\n10 Forest\n\n\
             // Combo\n1 Doubling Season\n\n"
        );
    }

    #[test]
    fn export_without_description() {
        let mut deck = Deck::new("Empty");
        deck.description = Some(String::new());
        assert_eq!(export_deck(&deck), "// Empty\n\n");
    }

    #[test]
    fn export_is_valid() {
        let mut deck = Deck::new("Multi\nline");
        deck.block_mut("nonlands")
            .unwrap()
            .add(make_card("2", "Lightning Bolt", "Instant"), 4);

        let text = export_deck(&deck);
        assert!(text.starts_with("// Multi line\n"));
        assert!(validate_deck_format(&text).is_valid());
    }
}
