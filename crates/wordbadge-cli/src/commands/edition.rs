//! Edition command - show or change the selected scrabble edition.

use crate::app::App;
use wordbadge_core::{Config, DictionaryEdition, EditionSelection};

/// Run the edition command.
///
/// Selecting a new edition saves it and rebuilds the store right away.
pub fn run(config: Config, id: Option<&str>) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let current = app.settings.selected_edition();

    let Some(id) = id else {
        for edition in DictionaryEdition::ALL {
            let marker = if edition == current { "*" } else { " " };
            println!(
                "{} {:<12} {} ({})",
                marker,
                edition.id(),
                edition.display_name(),
                app.manager.options().scrabble_resource(edition)
            );
        }
        return Ok(());
    };

    let edition: DictionaryEdition = id.parse()?;
    if edition == current {
        println!("{} is already selected.", edition.display_name());
    } else {
        app.settings.set_edition(edition)?;
        println!("Selected {}.", edition.display_name());
    }

    app.manager.rebuild_if_needed()?;
    if app.manager.rebuild_count() > 0 {
        if let Some(stats) = app.manager.stats() {
            println!("Store rebuilt with {} words.", stats.total_words);
        }
    }

    Ok(())
}
