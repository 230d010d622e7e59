use std::io;

use anyhow::Result;
use card_lookup::{CachedLookup, ScryfallClient};
use clap::Parser;
use common::lookup::MemoryLookup;
use log::debug;
use mtg_deck_builder::{
    cli::Args,
    commands,
    config::Config,
    store::{DeckStore, FileStore},
    ui::UiManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_args(&args)?;
    let ui = UiManager::new(config.log_level);

    debug!("Using deck store {}", config.store_path.display());
    let mut store = FileStore::new(&config.store_path);
    let mut out = io::stdout().lock();

    if config.offline {
        // Only cards already used in saved decks can be looked up
        let lookup = MemoryLookup::new(
            store
                .load_all()
                .into_iter()
                .flat_map(|deck| deck.blocks)
                .flat_map(|block| block.cards)
                .map(|entry| entry.card),
        );
        debug!("Offline with {} known cards", lookup.len());
        commands::run(args.command, &lookup, &mut store, Some(&ui), &mut out).await
    } else {
        let lookup = CachedLookup::new(ScryfallClient::new(&config.lookup)?);
        commands::run(args.command, &lookup, &mut store, Some(&ui), &mut out).await
    }
}
