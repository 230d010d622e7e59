use common::{
    deck_list::{self, ListLine, ParsedDeck, Validation},
    lookup::CardLookup,
};
use futures::{future, stream, StreamExt};
use log::{debug, warn};
use thiserror::Error;

/// Card lookups in flight at once while resolving a deck list.
pub const CONCURRENT_LOOKUPS: usize = 8;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid deck list:\n{0}")]
    InvalidFormat(Validation),
    #[error("No valid cards found in the deck list")]
    NoCardsFound,
}

/// Parse a deck list and resolve its card names.
///
/// Lines that fail validation or name unknown cards are skipped.
pub async fn parse_deck_list(text: &str, lookup: &impl CardLookup) -> ParsedDeck {
    resolve_lines(deck_list::parse_lines(text), lookup).await
}

/// Resolve parsed lines, keeping the order in which they appear in the list.
pub async fn resolve_lines(lines: Vec<ListLine>, lookup: &impl CardLookup) -> ParsedDeck {
    debug!("Resolving {} deck list lines", lines.len());

    let resolved = stream::iter(lines)
        .map(|line| async move {
            match lookup.get_card_by_name(&line.name).await {
                Ok(card) => Some((line, card)),
                Err(err) => {
                    warn!("Skipping line {} ({}): {err}", line.line, line.name);
                    None
                }
            }
        })
        .buffered(CONCURRENT_LOOKUPS)
        .filter_map(future::ready)
        .collect::<Vec<_>>()
        .await;

    ParsedDeck::from_resolved(resolved)
}
