//! Rebuild command - bring the store in line with the selected edition.

use crate::app::App;
use std::time::Instant;
use wordbadge_core::Config;

/// Run the rebuild command.
pub fn run(config: Config) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let expected = app.manager.expected_tag();

    let start = Instant::now();
    app.manager.rebuild_if_needed()?;
    let elapsed = start.elapsed();

    if app.manager.rebuild_count() == 0 {
        println!("Store is already current ({}).", expected);
        return Ok(());
    }

    println!("Store rebuilt for {}.", expected.edition.display_name());
    if let Some(stats) = app.manager.stats() {
        println!("  Words:    {}", stats.total_words);
        println!("  Wordle:   {}", stats.wordle_words);
        println!("  Scrabble: {}", stats.scrabble_words);
        println!("  Common:   {}", stats.common_bongo_words);
    }
    println!("  Time:     {:.2}s", elapsed.as_secs_f64());

    Ok(())
}
