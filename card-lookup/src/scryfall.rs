//! Response types of the Scryfall API that are not plain card data.

use serde::Deserialize;

pub const URL: &str = "https://api.scryfall.com";

/// A list of strings, as returned by autocomplete.
#[derive(Debug, Deserialize)]
pub struct Catalog {
    pub data: Vec<String>,
}

/// Error object sent along with unsuccessful responses.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub status: u16,
    pub details: String,
}
