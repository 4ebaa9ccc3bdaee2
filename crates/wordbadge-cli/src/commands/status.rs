//! Status command - show store status and statistics.

use crate::app::App;
use wordbadge_core::{Config, StoreStatus, WordbadgeError};

/// Run the status command.
///
/// Never builds: a missing or stale store is reported, not repaired.
pub fn run(config: Config) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let layout = app.layout();
    let expected = app.manager.expected_tag();

    println!("Wordbadge Store Status");
    println!("======================");
    println!();
    println!(
        "Selected edition:  {} ({})",
        expected.edition.display_name(),
        expected.edition.id()
    );
    println!("Expected tag:      {}", expected);

    let found = match layout.read_tag() {
        Ok(tag) => tag,
        Err(WordbadgeError::StoreNotFound { .. }) => {
            println!();
            println!("No store found. Run 'wordbadge init' to build it.");
            return Ok(());
        }
        Err(e) => {
            println!();
            println!("Store unreadable: {}", e);
            return Ok(());
        }
    };
    println!("Stored tag:        {}", found);

    if found != expected {
        println!();
        println!("Store is stale. Run 'wordbadge rebuild' to update it.");
        return Ok(());
    }

    // Tags match, so this opens the existing store without rebuilding
    if let Err(e) = app.manager.initialize() {
        println!();
        println!("Store could not be opened: {}", e);
        return Ok(());
    }

    if let (StoreStatus::Ready { .. }, Some(stats)) = (app.manager.status(), app.manager.stats()) {
        println!();
        println!("Summary:");
        println!("  Total words:       {}", stats.total_words);
        println!("  Wordle words:      {}", stats.wordle_words);
        println!("  Scrabble words:    {}", stats.scrabble_words);
        println!("  Common words:      {}", stats.common_bongo_words);

        if let Some(built) = stats.built_at {
            println!("  Built:             {}", built.format("%Y-%m-%d %H:%M:%S"));
        }
    }

    println!();
    println!("Data directory:    {}", layout.base_dir().display());
    println!("Resource directory: {}", app.config.resource_dir()?.display());
    println!("Settings file:     {}", app.settings.path().display());

    Ok(())
}
