use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result, bail};
use common::{
    card::{Card, ImageSize},
    deck::{Block, Deck},
    deck_list,
    lookup::CardLookup,
    stats::DeckStats,
};
use console::style;
use indicatif::ProgressBar;
use itertools::Itertools;
use log::info;

use crate::{
    cli::{BlockCommand, Command},
    editor::{BlockUpdate, DeckEditor},
    store::DeckStore,
    ui::{ProgressLookup, UiManager},
};

const UNTITLED_DECK: &str = "Imported Deck";

/// Execute one command, writing its results to `out`.
///
/// Progress bars are drawn only if a [`UiManager`] is given.
pub async fn run(
    command: Command,
    lookup: &(impl CardLookup + Sync),
    store: &mut impl DeckStore,
    ui: Option<&UiManager>,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Search { query, page } => {
            let result = lookup.search_cards(&query, page).await;
            if result.data.is_empty() {
                writeln!(out, "No cards found")?;
                return Ok(());
            }

            for card in &result.data {
                writeln!(out, "{:<40} {}", card.name, card.type_line)?;
            }
            info!(
                "Page {page}: {} of {} cards{}",
                result.data.len(),
                result.total_cards,
                if result.has_more { ", more on the next page" } else { "" }
            );
        }
        Command::Autocomplete { prefix } => {
            for name in lookup.autocomplete(&prefix).await {
                writeln!(out, "{name}")?;
            }
        }
        Command::Card { name } => {
            let card = lookup.get_card_by_name(&name).await?;
            write_card(out, &card)?;
        }
        Command::Prints { card_id } => {
            let prints = lookup.get_card_prints(&card_id).await;
            if prints.is_empty() {
                writeln!(out, "No printings found")?;
            }

            for card in prints {
                write!(
                    out,
                    "{}  {} ({}) {}",
                    card.id,
                    card.set_name,
                    card.set.to_uppercase(),
                    card.rarity
                )?;
                match card.released_at {
                    Some(date) => writeln!(out, "  {date}")?,
                    None => writeln!(out)?,
                }
            }
        }
        Command::Validate { file } => {
            let text = read_list(&file)?;
            let validation = deck_list::validate_deck_format(&text);
            if !validation.is_valid() {
                bail!("Invalid deck list:\n{validation}");
            }
            writeln!(out, "{} is a valid deck list", file.display())?;
        }
        Command::Import {
            file,
            name,
            description,
            format,
            into,
        } => {
            let text = read_list(&file)?;
            let mut editor = match into {
                Some(query) => DeckEditor::from_deck(find_deck(store, &query)?),
                None => DeckEditor::new(deck_name(&file)),
            };
            if let Some(name) = name {
                editor.set_name(name);
            }
            if description.is_some() {
                editor.set_description(description);
            }
            if format.is_some() {
                editor.set_format(format);
            }

            let progress = match ui {
                Some(ui) => ui.lookup_progress(
                    "Resolving cards",
                    deck_list::parse_lines(&text).len(),
                ),
                None => ProgressBar::hidden(),
            };
            let summary = editor
                .import_deck(&text, &ProgressLookup::new(lookup, progress))
                .await?;
            editor.save_deck(store)?;

            writeln!(
                out,
                "Imported {} cards ({} different) into {}",
                summary.total_cards,
                summary.card_types,
                deck_title(editor.deck())
            )?;
        }
        Command::New {
            name,
            description,
            format,
        } => {
            let mut editor = DeckEditor::new(name);
            editor.set_description(description);
            if format.is_some() {
                editor.set_format(format);
            }
            editor.save_deck(store)?;
            writeln!(out, "Created {}", deck_title(editor.deck()))?;
        }
        Command::List => {
            let decks = store.load_all();
            if decks.is_empty() {
                writeln!(out, "No saved decks")?;
            }

            for deck in decks {
                writeln!(
                    out,
                    "{}  {} cards  {}",
                    deck_title(&deck),
                    deck.total_cards,
                    deck.updated_at.format("%Y-%m-%d %H:%M")
                )?;
            }
        }
        Command::Show { deck } => {
            let editor = DeckEditor::from_deck(find_deck(store, &deck)?);
            write_deck(out, editor.deck(), &editor.stats())?;
        }
        Command::Export { deck, output } => {
            let editor = DeckEditor::from_deck(find_deck(store, &deck)?);
            let text = editor.export_deck();
            match output {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("Could not write {}", path.display()))?;
                    info!("Exported {} to {}", editor.deck().name, path.display());
                }
                None => write!(out, "{text}")?,
            }
        }
        Command::Delete { deck } => {
            let deck = find_deck(store, &deck)?;
            if let Some(id) = &deck.id {
                store.delete(id)?;
            }
            writeln!(out, "Deleted {}", deck_title(&deck))?;
        }
        Command::Add {
            deck,
            card,
            block,
            quantity,
        } => {
            let mut editor = DeckEditor::from_deck(find_deck(store, &deck)?);
            let block_id = find_block(editor.deck(), &block)?;
            let card = lookup.get_card_by_name(&card).await?;
            let card_id = card.id.clone();

            editor.add_card_to_block(card, &block_id, quantity);
            editor.save_deck(store)?;
            write_entry_count(out, editor.deck(), &block_id, &card_id)?;
        }
        Command::Remove {
            deck,
            card,
            block,
            quantity,
        } => {
            let mut editor = DeckEditor::from_deck(find_deck(store, &deck)?);
            let block_id = find_block(editor.deck(), &block)?;
            let card_id = find_card(editor.deck(), &block_id, &card)?;

            editor.remove_card_from_block(&card_id, &block_id, quantity);
            editor.save_deck(store)?;
            write_entry_count(out, editor.deck(), &block_id, &card_id)?;
        }
        Command::Move {
            deck,
            card,
            from,
            to,
        } => {
            let mut editor = DeckEditor::from_deck(find_deck(store, &deck)?);
            let from = find_block(editor.deck(), &from)?;
            let to = find_block(editor.deck(), &to)?;
            let card_id = find_card(editor.deck(), &from, &card)?;

            editor.move_card(&card_id, &from, &to);
            editor.save_deck(store)?;
            write_entry_count(out, editor.deck(), &to, &card_id)?;
        }
        Command::Block { deck, action } => {
            let mut editor = DeckEditor::from_deck(find_deck(store, &deck)?);
            match action {
                BlockCommand::Add { name, color } => {
                    let id = editor.add_block();
                    editor.update_block(&id, BlockUpdate { name, color });
                    writeln!(out, "Added block {id}")?;
                }
                BlockCommand::Update { block, name, color } => {
                    let id = find_block(editor.deck(), &block)?;
                    editor.update_block(&id, BlockUpdate { name, color });
                    writeln!(out, "Updated block {id}")?;
                }
                BlockCommand::Delete { block } => {
                    let id = find_block(editor.deck(), &block)?;
                    editor.delete_block(&id);
                    writeln!(out, "Deleted block {id}")?;
                }
            }
            editor.save_deck(store)?;
        }
    }

    Ok(())
}

fn read_list(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))
}

fn deck_name(file: &Path) -> String {
    file.file_stem()
        .map_or_else(|| UNTITLED_DECK.to_owned(), |stem| stem.to_string_lossy().into_owned())
}

fn deck_title(deck: &Deck) -> String {
    let id = deck.id.as_deref().unwrap_or("unsaved");
    format!("{} [{id}]", deck.name)
}

/// Deck by id, unique id prefix or name (ignoring case).
pub fn find_deck(store: &impl DeckStore, query: &str) -> Result<Deck> {
    let mut decks = store.load_all();
    if let Some(idx) = decks
        .iter()
        .position(|deck| deck.id.as_deref() == Some(query))
    {
        return Ok(decks.swap_remove(idx));
    }

    let name = query.to_lowercase();
    decks.retain(|deck| {
        deck.name.to_lowercase() == name
            || deck.id.as_deref().is_some_and(|id| id.starts_with(query))
    });

    match decks.len() {
        0 => bail!("No saved deck matches \"{query}\""),
        1 => Ok(decks.swap_remove(0)),
        _ => bail!(
            "\"{query}\" matches several decks: {}",
            decks.iter().map(deck_title).join(", ")
        ),
    }
}

/// Block id for a block id or name (ignoring case).
pub fn find_block(deck: &Deck, query: &str) -> Result<String> {
    let name = query.to_lowercase();
    deck.blocks
        .iter()
        .find(|block| block.id == query)
        .or_else(|| deck.blocks.iter().find(|block| block.name.to_lowercase() == name))
        .map(|block| block.id.clone())
        .with_context(|| {
            format!(
                "No block \"{query}\" in {}, available: {}",
                deck.name,
                deck.blocks.iter().map(|block| &block.name).join(", ")
            )
        })
}

/// Card id for a card id or name (ignoring case) within a block.
pub fn find_card(deck: &Deck, block_id: &str, query: &str) -> Result<String> {
    let name = query.to_lowercase();
    deck.block(block_id)
        .and_then(|block| {
            block
                .cards
                .iter()
                .find(|entry| entry.card.id == query || entry.card.name.to_lowercase() == name)
        })
        .map(|entry| entry.card.id.clone())
        .with_context(|| format!("No card \"{query}\" in block {block_id}"))
}

fn write_entry_count(
    out: &mut impl Write,
    deck: &Deck,
    block_id: &str,
    card_id: &str,
) -> Result<()> {
    let Some(block) = deck.block(block_id) else {
        return Ok(());
    };

    match block.entry(card_id) {
        Some(entry) => writeln!(
            out,
            "{}x {} in {}",
            entry.quantity, entry.card.name, block.name
        )?,
        None => writeln!(out, "No copies left in {}", block.name)?,
    }
    writeln!(out, "{} now has {} cards", deck.name, deck.total_cards)?;
    Ok(())
}

fn write_card(out: &mut impl Write, card: &Card) -> Result<()> {
    writeln!(
        out,
        "{}  {}",
        style(&card.name).bold(),
        card.mana_cost.as_deref().unwrap_or_default()
    )?;
    writeln!(out, "{}", card.type_line)?;

    if let Some(text) = &card.oracle_text {
        writeln!(out, "{text}")?;
    } else {
        for face in &card.card_faces {
            writeln!(out)?;
            writeln!(
                out,
                "{}  {}",
                style(&face.name).bold(),
                face.mana_cost.as_deref().unwrap_or_default()
            )?;
            writeln!(out, "{}", face.type_line)?;
            if let Some(text) = &face.oracle_text {
                writeln!(out, "{text}")?;
            }
        }
    }

    if let (Some(power), Some(toughness)) = (&card.power, &card.toughness) {
        writeln!(out, "{power}/{toughness}")?;
    }
    if !card.set.is_empty() {
        writeln!(
            out,
            "{} ({}) {}",
            card.set_name,
            card.set.to_uppercase(),
            card.rarity
        )?;
    }
    if let Some(url) = card.image_url(ImageSize::Normal) {
        writeln!(out, "{url}")?;
    }

    Ok(())
}

fn write_block(out: &mut impl Write, block: &Block) -> Result<()> {
    writeln!(
        out,
        "{} ({}, {} cards)",
        style(&block.name).bold().underlined(),
        block.id,
        block.quantity()
    )?;
    for entry in &block.cards {
        writeln!(
            out,
            "{:>3} {:<40} {}",
            entry.quantity, entry.card.name, entry.card.type_line
        )?;
    }
    Ok(())
}

fn write_deck(out: &mut impl Write, deck: &Deck, stats: &DeckStats) -> Result<()> {
    writeln!(out, "{}", style(deck_title(deck)).bold())?;
    if let Some(description) = &deck.description {
        writeln!(out, "{description}")?;
    }
    writeln!(
        out,
        "{}, {} cards, updated {}",
        deck.format.as_deref().unwrap_or("No format"),
        deck.total_cards,
        deck.updated_at.format("%Y-%m-%d %H:%M")
    )?;

    for block in &deck.blocks {
        writeln!(out)?;
        write_block(out, block)?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Creatures {}, Spells {}, Lands {}, Artifacts {}, Planeswalkers {}, Enchantments {}",
        stats.creatures,
        stats.spells,
        stats.lands,
        stats.artifacts,
        stats.planeswalkers,
        stats.enchantments
    )?;
    Ok(())
}

#[cfg(test)]
mod test {
    use common::{card::test_util::make_card, lookup::MemoryLookup};

    use crate::{cli::Command, store::MemoryStore};

    use super::*;

    fn lookup() -> MemoryLookup {
        let mut bolt = make_card("bolt", "Lightning Bolt", "Instant");
        bolt.oracle_text = Some("Lightning Bolt deals 3 damage to any target.".to_owned());
        bolt.mana_cost = Some("{R}".to_owned());

        MemoryLookup::new([
            bolt,
            make_card("sol-ring", "Sol Ring", "Artifact"),
            make_card("forest", "Forest", "Basic Land — Forest"),
        ])
    }

    async fn exec(command: Command, store: &mut MemoryStore) -> Result<String> {
        let mut out = Vec::new();
        run(command, &lookup(), store, None, &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn new_deck(name: &str) -> Command {
        Command::New {
            name: name.to_owned(),
            description: None,
            format: None,
        }
    }

    fn add(deck: &str, card: &str, block: &str, quantity: u32) -> Command {
        Command::Add {
            deck: deck.to_owned(),
            card: card.to_owned(),
            block: block.to_owned(),
            quantity,
        }
    }

    fn stored(store: &MemoryStore, name: &str) -> Deck {
        find_deck(store, name).unwrap()
    }

    #[tokio::test]
    async fn card() {
        let mut store = MemoryStore::new();
        let out = exec(
            Command::Card {
                name: "lightning bolt".to_owned(),
            },
            &mut store,
        )
        .await
        .unwrap();

        assert!(out.contains("{R}"));
        assert!(out.contains("deals 3 damage"));

        let missing = exec(
            Command::Card {
                name: "Mox Lotus".to_owned(),
            },
            &mut store,
        )
        .await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn edit_saved_deck() {
        let mut store = MemoryStore::new();
        exec(new_deck("Burn"), &mut store).await.unwrap();

        exec(add("burn", "Lightning Bolt", "nonlands", 4), &mut store)
            .await
            .unwrap();
        let out = exec(add("Burn", "Forest", "Lands", 20), &mut store)
            .await
            .unwrap();
        assert!(out.contains("20x Forest in Lands"));
        assert_eq!(stored(&store, "Burn").total_cards, 24);

        exec(
            Command::Remove {
                deck: "Burn".to_owned(),
                card: "forest".to_owned(),
                block: "lands".to_owned(),
                quantity: Some(2),
            },
            &mut store,
        )
        .await
        .unwrap();
        exec(
            Command::Move {
                deck: "Burn".to_owned(),
                card: "Lightning Bolt".to_owned(),
                from: "nonlands".to_owned(),
                to: "maybeboard".to_owned(),
            },
            &mut store,
        )
        .await
        .unwrap();

        let deck = stored(&store, "Burn");
        assert_eq!(deck.total_cards, 22);
        assert_eq!(deck.block("maybeboard").unwrap().quantity(), 4);
        assert!(deck.block("nonlands").unwrap().cards.is_empty());
    }

    #[tokio::test]
    async fn unknown_targets() {
        let mut store = MemoryStore::new();
        exec(new_deck("Burn"), &mut store).await.unwrap();

        assert!(exec(add("Control", "Sol Ring", "nonlands", 1), &mut store).await.is_err());
        assert!(exec(add("Burn", "Sol Ring", "sideboard", 1), &mut store).await.is_err());
        assert!(exec(add("Burn", "Mox Lotus", "nonlands", 1), &mut store).await.is_err());
        assert_eq!(stored(&store, "Burn").total_cards, 0);
    }

    #[tokio::test]
    async fn blocks() {
        let mut store = MemoryStore::new();
        exec(new_deck("Burn"), &mut store).await.unwrap();

        exec(
            Command::Block {
                deck: "Burn".to_owned(),
                action: BlockCommand::Add {
                    name: Some("Ramp".to_owned()),
                    color: None,
                },
            },
            &mut store,
        )
        .await
        .unwrap();
        exec(add("Burn", "Sol Ring", "ramp", 1), &mut store).await.unwrap();

        let deck = stored(&store, "Burn");
        let ramp = deck.blocks.last().unwrap();
        assert_eq!(ramp.name, "Ramp");
        assert_eq!(ramp.quantity(), 1);

        exec(
            Command::Block {
                deck: "Burn".to_owned(),
                action: BlockCommand::Delete {
                    block: "Ramp".to_owned(),
                },
            },
            &mut store,
        )
        .await
        .unwrap();
        let deck = stored(&store, "Burn");
        assert_eq!(deck.blocks.len(), 4);
        assert_eq!(deck.total_cards, 0);
    }

    #[tokio::test]
    async fn import_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("burn.txt");
        let exported = dir.path().join("export.txt");
        fs::write(&list, "4 Lightning Bolt\n1 Sol Ring\n// Lands\n16 Forest\n").unwrap();

        let mut store = MemoryStore::new();
        let out = exec(
            Command::Import {
                file: list.clone(),
                name: None,
                description: None,
                format: Some("Modern".to_owned()),
                into: None,
            },
            &mut store,
        )
        .await
        .unwrap();
        assert!(out.starts_with("Imported 21 cards (3 different) into burn"));

        let deck = stored(&store, "burn");
        assert_eq!(deck.format.as_deref(), Some("Modern"));
        assert_eq!(deck.block("lands").unwrap().quantity(), 16);

        exec(
            Command::Export {
                deck: "burn".to_owned(),
                output: Some(exported.clone()),
            },
            &mut store,
        )
        .await
        .unwrap();
        assert_eq!(
            fs::read_to_string(&exported).unwrap(),
            "// burn\n\n// Nonlands\n4 Lightning Bolt\n1 Sol Ring\n\n// Lands\n16 Forest\n\n"
        );

        // Importing into the saved deck replaces its list
        fs::write(&list, "2 Sol Ring\n").unwrap();
        exec(
            Command::Import {
                file: list,
                name: None,
                description: None,
                format: None,
                into: Some("burn".to_owned()),
            },
            &mut store,
        )
        .await
        .unwrap();
        assert_eq!(store.load_all().len(), 1);
        assert_eq!(stored(&store, "burn").total_cards, 2);
    }

    #[tokio::test]
    async fn invalid_list() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("broken.txt");
        fs::write(&list, "4 Lightning Bolt\nSol Ring\n").unwrap();

        let mut store = MemoryStore::new();
        let err = exec(Command::Validate { file: list.clone() }, &mut store)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Line 2: invalid format"));

        let import = Command::Import {
            file: list,
            name: None,
            description: None,
            format: None,
            into: None,
        };
        assert!(exec(import, &mut store).await.is_err());
        assert!(store.load_all().is_empty());
    }

    #[tokio::test]
    async fn list_show_delete() {
        let mut store = MemoryStore::new();
        assert_eq!(exec(Command::List, &mut store).await.unwrap(), "No saved decks\n");

        exec(new_deck("Burn"), &mut store).await.unwrap();
        exec(new_deck("Control"), &mut store).await.unwrap();
        exec(add("Burn", "Lightning Bolt", "nonlands", 4), &mut store)
            .await
            .unwrap();

        let listing = exec(Command::List, &mut store).await.unwrap();
        assert_eq!(listing.lines().count(), 2);

        let shown = exec(
            Command::Show {
                deck: "burn".to_owned(),
            },
            &mut store,
        )
        .await
        .unwrap();
        assert!(shown.contains("Lightning Bolt"));
        assert!(shown.contains("Spells 4"));

        exec(
            Command::Delete {
                deck: "Control".to_owned(),
            },
            &mut store,
        )
        .await
        .unwrap();
        itertools::assert_equal(
            store.load_all().iter().map(|deck| deck.name.as_str()),
            ["Burn"],
        );
    }

    #[test]
    fn find_deck_by_id() {
        let mut store = MemoryStore::new();
        let saved = store.save(&Deck::new("Burn")).unwrap();
        store.save(&Deck::new("Burn")).unwrap();

        let id = saved.id.unwrap();
        assert_eq!(
            find_deck(&store, &id).unwrap().id.as_deref(),
            Some(id.as_str())
        );
        assert_eq!(
            find_deck(&store, &id[..13]).unwrap().id.as_deref(),
            Some(id.as_str())
        );
        // Same name twice
        assert!(find_deck(&store, "burn").is_err());
        assert!(find_deck(&store, "control").is_err());
    }
}
