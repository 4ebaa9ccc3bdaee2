//! Init command - open the store, building it if needed.

use crate::app::App;
use std::time::Instant;
use wordbadge_core::Config;

/// Run the init command.
pub fn run(config: Config) -> anyhow::Result<()> {
    let app = App::new(config)?;

    let start = Instant::now();
    app.manager.initialize()?;
    let elapsed = start.elapsed();

    let rebuilt = app.manager.rebuild_count() > 0;
    println!("Store {}.", if rebuilt { "built" } else { "opened" });

    if let Some(stats) = app.manager.stats() {
        println!("  Words:   {}", stats.total_words);
        println!("  Tag:     {}", stats.tag);
        println!("  Time:    {:.2}s", elapsed.as_secs_f64());
    }

    if rebuilt && app.manager.stats().is_some_and(|s| s.total_words == 0) {
        eprintln!();
        eprintln!(
            "No words were ingested. Place word lists in {}",
            app.config.resource_dir()?.display()
        );
    }

    Ok(())
}
