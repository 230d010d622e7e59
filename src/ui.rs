use std::fmt::Display;

use common::{
    card::Card,
    lookup::{CardLookup, LookupError, SearchPage},
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Crates whose debug output is shown with `--verbose`.
const OWN_TARGETS: [&str; 3] = ["mtg_deck_builder", "card_lookup", "common"];

pub struct UiManager {
    progress_bars: MultiProgress,
    lookup_style: ProgressStyle,
}

impl UiManager {
    fn prefix(level: Level) -> impl Display {
        match level {
            Level::Trace => console::style(".").bold().white(),
            Level::Debug => console::style("?").bold().cyan(),
            Level::Info => console::style(">").bold().blue(),
            Level::Warn => console::style("!").bold().yellow(),
            Level::Error => console::style("X").bold().red(),
        }
    }

    pub fn new(level: LevelFilter) -> Self {
        let lookup_style = format!(
            "{} {{msg}} {{bar:30}} {{human_pos}}/{{human_len}} ({{eta}} remaining)",
            Self::prefix(Level::Info)
        );

        let progress_bars = MultiProgress::new();
        log::set_logger(Box::leak(Logger(progress_bars.clone()).into()))
            .expect("Error setting logger");
        log::set_max_level(level);

        Self {
            progress_bars,
            lookup_style: ProgressStyle::with_template(&lookup_style).unwrap(),
        }
    }

    /// A progress bar for `len` card lookups.
    pub fn lookup_progress(&self, message: &'static str, len: usize) -> ProgressBar {
        let progress = ProgressBar::new(len.try_into().unwrap_or(u64::MAX))
            .with_style(self.lookup_style.clone())
            .with_message(message);
        self.progress_bars.add(progress)
    }
}

/// Advances a progress bar for every card resolved by name.
pub struct ProgressLookup<'a, L> {
    inner: &'a L,
    progress: ProgressBar,
}

impl<'a, L> ProgressLookup<'a, L> {
    pub fn new(inner: &'a L, progress: ProgressBar) -> Self {
        Self { inner, progress }
    }
}

impl<L> Drop for ProgressLookup<'_, L> {
    fn drop(&mut self) {
        self.progress.finish_and_clear();
    }
}

impl<L: CardLookup + Sync> CardLookup for ProgressLookup<'_, L> {
    async fn autocomplete(&self, prefix: &str) -> Vec<String> {
        self.inner.autocomplete(prefix).await
    }

    async fn search_cards(&self, query: &str, page: u32) -> SearchPage {
        self.inner.search_cards(query, page).await
    }

    async fn get_card_by_name(&self, name: &str) -> Result<Card, LookupError> {
        let result = self.inner.get_card_by_name(name).await;
        self.progress.inc(1);
        result
    }

    async fn get_card_by_id(&self, id: &str) -> Result<Card, LookupError> {
        self.inner.get_card_by_id(id).await
    }

    async fn get_card_prints(&self, card_id: &str) -> Vec<Card> {
        self.inner.get_card_prints(card_id).await
    }
}

struct Logger(MultiProgress);

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
            || OWN_TARGETS
                .iter()
                .any(|target| metadata.target().starts_with(target))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = format!("{}", record.args());
        let mut lines = message.lines();

        self.0.suspend(|| {
            if let Some(line) = lines.next() {
                eprintln!("{} {line}", UiManager::prefix(record.level()));
            }

            for line in lines {
                eprintln!("  {line}");
            }
        });
    }

    fn flush(&self) {}
}
