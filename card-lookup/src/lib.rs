//! Card database access through the Scryfall API.

pub mod cache;
pub mod client;
pub mod error;
pub mod scryfall;

pub use cache::CachedLookup;
pub use client::{Config, ScryfallClient};
