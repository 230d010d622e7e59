use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::LevelFilter;

use crate::cli::Args;

pub const STORE_FILENAME: &str = "decks.json";

/// Settings resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_path: PathBuf,
    pub lookup: card_lookup::Config,
    pub offline: bool,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let store_path = match &args.store {
            Some(path) => path.clone(),
            None => default_store_path()
                .context("Could not determine a data directory, pass --store")?,
        };

        Ok(Self {
            store_path,
            lookup: card_lookup::Config {
                base_url: args.api_url.clone(),
                requests_per_second: args.rate_limit,
            },
            offline: args.offline,
            log_level: if args.verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        })
    }
}

/// `decks.json` in the platform's data directory.
pub fn default_store_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mtg-deck-builder").map(|dirs| dirs.data_dir().join(STORE_FILENAME))
}
