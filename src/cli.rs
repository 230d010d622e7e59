use std::{num::NonZeroU32, path::PathBuf};

use card_lookup::scryfall;
use clap::{value_parser, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(version, about = "Build and manage Magic: The Gathering decks")]
pub struct Args {
    #[arg(long, env = "MTG_DECK_STORE", global = true, help = "File the decks are saved in")]
    pub store: Option<PathBuf>,

    #[arg(
        long,
        env = "SCRYFALL_API_URL",
        default_value = scryfall::URL,
        global = true,
        help = "Base URL of the card database"
    )]
    pub api_url: String,

    #[arg(
        long,
        default_value = "10",
        global = true,
        help = "Maximum card database requests per second"
    )]
    pub rate_limit: NonZeroU32,

    #[arg(long, global = true, help = "Do not contact the card database")]
    pub offline: bool,

    #[arg(short, long, global = true, help = "Show debug output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the card database
    Search {
        query: String,
        #[arg(long, default_value_t = 1, value_parser = value_parser!(u32).range(1..))]
        page: u32,
    },
    /// Suggest card names starting with a prefix
    Autocomplete { prefix: String },
    /// Show a card by exact name
    Card { name: String },
    /// List all printings of a card
    Prints { card_id: String },
    /// Check a deck list for format errors
    Validate { file: PathBuf },
    /// Create a deck from a deck list, or replace the list part of a saved deck
    Import {
        file: PathBuf,
        #[arg(long, help = "Deck name, defaults to the file name")]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        format: Option<String>,
        #[arg(long, value_name = "DECK", help = "Import into a saved deck")]
        into: Option<String>,
    },
    /// Create an empty deck
    New {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        format: Option<String>,
    },
    /// List saved decks
    List,
    /// Show a saved deck with its statistics
    Show { deck: String },
    /// Write a saved deck as deck list
    Export {
        deck: String,
        #[arg(short, long, help = "Output file, defaults to standard output")]
        output: Option<PathBuf>,
    },
    /// Delete a saved deck
    Delete { deck: String },
    /// Add copies of a card to a deck
    Add {
        deck: String,
        card: String,
        #[arg(long, default_value = "nonlands")]
        block: String,
        #[arg(short, long, default_value_t = 1, value_parser = value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Remove copies of a card from a deck
    Remove {
        deck: String,
        card: String,
        #[arg(long, default_value = "nonlands")]
        block: String,
        #[arg(
            short,
            long,
            value_parser = value_parser!(u32).range(1..),
            help = "Copies to remove, defaults to all"
        )]
        quantity: Option<u32>,
    },
    /// Move a card to another block
    Move {
        deck: String,
        card: String,
        from: String,
        to: String,
    },
    /// Manage the blocks of a deck
    Block {
        deck: String,
        #[command(subcommand)]
        action: BlockCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum BlockCommand {
    /// Add an empty block
    Add {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Rename or recolor a block
    Update {
        block: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a block and its cards
    Delete { block: String },
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn valid_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["mtg-deck", "add", "Atraxa", "Sol Ring"]).unwrap();

        assert_eq!(args.rate_limit.get(), 10);
        assert!(!args.offline);
        let Command::Add {
            deck,
            card,
            block,
            quantity,
        } = args.command
        else {
            panic!("expected add command");
        };
        assert_eq!(deck, "Atraxa");
        assert_eq!(card, "Sol Ring");
        assert_eq!(block, "nonlands");
        assert_eq!(quantity, 1);
    }

    #[test]
    fn zero_quantity_rejected() {
        assert!(Args::try_parse_from(["mtg-deck", "add", "Deck", "Sol Ring", "-q", "0"]).is_err());
        assert!(Args::try_parse_from(["mtg-deck", "search", "bolt", "--page", "0"]).is_err());
        assert!(
            Args::try_parse_from(["mtg-deck", "remove", "Deck", "Sol Ring", "-q", "0"]).is_err()
        );
        assert!(Args::try_parse_from(["mtg-deck", "remove", "Deck", "Sol Ring", "-q", "2"]).is_ok());
    }
}
