//! Clear command - remove the store from disk.

use crate::app::App;
use std::io::{self, Write};
use wordbadge_core::Config;

/// Run the clear command.
///
/// The edition selection in the settings file is kept.
pub fn run(config: Config, skip_confirm: bool) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let layout = app.layout();

    if !layout.exists() && !layout.store_dir().exists() {
        println!("No store found. Nothing to clear.");
        return Ok(());
    }

    if !skip_confirm {
        print!("This will delete the word store. Are you sure? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    layout.clear()?;
    println!("Store cleared.");

    Ok(())
}
