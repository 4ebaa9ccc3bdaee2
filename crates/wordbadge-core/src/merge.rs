//! Merging word list sources into per-word flags.
//!
//! Each source owns exactly one flag. Merging folds every source's tokens
//! into a single `word -> WordFlags` map, OR-ing flags when a word appears
//! in several sources (or several times in one source).

use crate::source::{IngestProgress, ResourceLoader, WordListSource};
use crate::types::{FlagSource, WordEntry, WordFlags};
use rayon::prelude::*;
use std::collections::HashMap;

/// The merged mapping produced by ingestion.
pub type MergedFlags = HashMap<String, WordFlags>;

/// Accumulates sources into a [`MergedFlags`] map.
///
/// ## Example
///
/// ```rust
/// use wordbadge_core::{FlagMerger, FlagSource};
///
/// let merged = FlagMerger::new()
///     .add_words(FlagSource::Wordle, ["apple", "tree"])
///     .add_words(FlagSource::CommonBongo, ["tree"])
///     .finish();
///
/// assert!(merged["tree"].is_wordle && merged["tree"].is_common_bongo);
/// ```
#[derive(Debug, Default)]
pub struct FlagMerger {
    flags: MergedFlags,
}

impl FlagMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one source's words into the map.
    ///
    /// Words are expected to be normalized already (see
    /// [`normalize_word`](crate::types::normalize_word)).
    pub fn add_words<I, S>(mut self, source: FlagSource, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.absorb(source, words);
        self
    }

    /// Like [`add_words`](Self::add_words), returning how many tokens were read.
    pub fn absorb<I, S>(&mut self, source: FlagSource, words: I) -> u64
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        words.into_iter().fold(0u64, |count, word| {
            self.flags.entry(word.into()).or_default().set(source);
            count + 1
        })
    }

    /// Number of distinct words merged so far
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Consume the merger and return the mapping
    pub fn finish(self) -> MergedFlags {
        self.flags
    }
}

/// Read every configured source through `loader` and merge them.
///
/// Missing or unreadable sources contribute zero words; this never fails.
pub fn ingest(
    sources: &[WordListSource],
    loader: &dyn ResourceLoader,
    progress: Option<&dyn IngestProgress>,
) -> MergedFlags {
    let mut merger = FlagMerger::new();

    for source in sources {
        let read = merger.absorb(source.flag, source.tokens(loader));
        if let Some(progress) = progress {
            progress.on_source_complete(source.flag, &source.resource, read);
        }
    }

    if let Some(progress) = progress {
        progress.on_complete(merger.len() as u64);
    }

    merger.finish()
}

/// Flatten a merged map into records sorted by word.
///
/// Sorting runs on the rayon pool; large scrabble editions hold a few
/// hundred thousand words.
pub fn into_sorted_entries(merged: MergedFlags) -> Vec<WordEntry> {
    let mut entries: Vec<WordEntry> = merged
        .into_iter()
        .map(|(word, flags)| WordEntry::new(word, flags))
        .collect();
    entries.par_sort_unstable_by(|a, b| a.word.cmp(&b.word));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryLoader;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_single_source_flags() {
        let merged = FlagMerger::new()
            .add_words(FlagSource::Scrabble, ["zebra"])
            .finish();
        assert_eq!(merged["zebra"], WordFlags::new(false, true, false));
    }

    #[test]
    fn test_or_semantics() {
        let merged = FlagMerger::new()
            .add_words(FlagSource::Wordle, ["apple", "tree"])
            .add_words(FlagSource::Scrabble, ["apple", "zebra"])
            .add_words(FlagSource::CommonBongo, ["tree"])
            .finish();

        assert_eq!(merged.len(), 3);
        assert_eq!(merged["apple"], WordFlags::new(true, true, false));
        assert_eq!(merged["tree"], WordFlags::new(true, false, true));
        assert_eq!(merged["zebra"], WordFlags::new(false, true, false));
    }

    #[test]
    fn test_duplicates_within_source() {
        let mut merger = FlagMerger::new();
        let read = merger.absorb(FlagSource::Wordle, ["crane", "crane", "crane"]);
        assert_eq!(read, 3);
        assert_eq!(merger.len(), 1);
    }

    #[test]
    fn test_ingest_with_missing_source() {
        let loader = MemoryLoader::new()
            .with_words("wordle.txt", &["Apple", "tree"])
            .with_words("bongo.txt", &["TREE"]);
        let sources = vec![
            WordListSource::new(FlagSource::Wordle, "wordle.txt"),
            WordListSource::new(FlagSource::Scrabble, "missing.txt"),
            WordListSource::new(FlagSource::CommonBongo, "bongo.txt"),
        ];

        let merged = ingest(&sources, &loader, None);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["tree"], WordFlags::new(true, false, true));
        assert!(merged.values().all(|f| !f.is_scrabble));
    }

    #[test]
    fn test_ingest_reports_progress() {
        struct Counting {
            sources: AtomicU64,
            total: AtomicU64,
        }
        impl IngestProgress for Counting {
            fn on_source_complete(&self, _: FlagSource, _: &str, _: u64) {
                self.sources.fetch_add(1, Ordering::SeqCst);
            }
            fn on_complete(&self, distinct_words: u64) {
                self.total.store(distinct_words, Ordering::SeqCst);
            }
        }

        let loader = MemoryLoader::new().with_words("w", &["a", "b", "a"]);
        let sources = vec![
            WordListSource::new(FlagSource::Wordle, "w"),
            WordListSource::new(FlagSource::Scrabble, "w"),
        ];
        let progress = Counting {
            sources: AtomicU64::new(0),
            total: AtomicU64::new(0),
        };

        ingest(&sources, &loader, Some(&progress));
        assert_eq!(progress.sources.load(Ordering::SeqCst), 2);
        assert_eq!(progress.total.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sorted_entries() {
        let merged = FlagMerger::new()
            .add_words(FlagSource::Wordle, ["pear", "apple", "mango"])
            .finish();
        let words: Vec<String> = into_sorted_entries(merged)
            .into_iter()
            .map(|e| e.word)
            .collect();
        assert_eq!(words, vec!["apple", "mango", "pear"]);
    }
}
