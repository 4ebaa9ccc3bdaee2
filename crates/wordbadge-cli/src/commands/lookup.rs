//! Lookup command - show list membership for words.

use crate::app::App;
use crate::OutputFormat;
use std::time::Instant;
use wordbadge_core::{normalize_word, Config, WordFlags};

/// Run the lookup command.
pub fn run(config: Config, words: &[String], output: OutputFormat) -> anyhow::Result<()> {
    let app = App::new(config)?;
    app.manager.initialize()?;

    let start = Instant::now();
    let found = app.manager.lookup_batch(words);
    let elapsed = start.elapsed();

    // Report in argument order, one row per distinct normalized word
    let mut seen = std::collections::HashSet::new();
    let rows: Vec<(String, WordFlags)> = words
        .iter()
        .filter_map(|w| normalize_word(w))
        .filter(|w| seen.insert(w.clone()))
        .map(|w| {
            let flags = found.get(&w).copied().unwrap_or_default();
            (w, flags)
        })
        .collect();

    match output {
        OutputFormat::Text => {
            let width = rows.iter().map(|(w, _)| w.len()).max().unwrap_or(0);
            for (word, flags) in &rows {
                println!("{:<width$}  {}", word, flags, width = width);
            }

            eprintln!();
            eprintln!(
                "{} of {} words found in {:.3}ms",
                found.len(),
                rows.len(),
                elapsed.as_secs_f64() * 1000.0
            );
        }
        OutputFormat::Json => {
            let json_results: Vec<serde_json::Value> = rows
                .iter()
                .map(|(word, flags)| {
                    serde_json::json!({
                        "word": word,
                        "is_wordle": flags.is_wordle,
                        "is_scrabble": flags.is_scrabble,
                        "is_common_bongo": flags.is_common_bongo,
                    })
                })
                .collect();

            println!("{}", serde_json::to_string_pretty(&json_results)?);
        }
    }

    Ok(())
}
