//! The membership store: an opened, validated word table.
//!
//! A `MembershipStore` is immutable once opened. Rebuilding produces a new
//! store value; the [`StoreManager`](crate::StoreManager) swaps it in.
//!
//! ## Lookups
//!
//! Words are kept sorted in one contiguous string with an offsets array as
//! the index, so a point lookup is a binary search. A batch lookup sorts and
//! de-duplicates its normalized keys first and then walks them against the
//! table with a moving lower bound, touching each region of the index at
//! most once per batch.

use crate::error::{Result, WordbadgeError};
use crate::merge::{into_sorted_entries, MergedFlags};
use crate::persistence::{StoreLayout, StoredTable};
use crate::types::{normalize_word, StoreStats, VersionTag, WordEntry, WordFlags};
use chrono::DateTime;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Options controlling how a store is written
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    /// LZ4-compress the data section
    pub compress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions { compress: true }
    }
}

/// Validated in-memory view of a [`StoredTable`].
struct WordTable {
    text: String,
    offsets: Vec<u32>,
    flags: Vec<u8>,
}

impl WordTable {
    fn from_stored(stored: StoredTable) -> Result<Self> {
        let StoredTable {
            words,
            offsets,
            flags,
            ..
        } = stored;

        if offsets.len() != flags.len() {
            return Err(WordbadgeError::corrupted(format!(
                "{} offsets but {} flag bytes",
                offsets.len(),
                flags.len()
            )));
        }

        let text = String::from_utf8(words)
            .map_err(|_| WordbadgeError::corrupted("Word blob is not valid UTF-8"))?;

        if offsets.first().is_some_and(|&first| first != 0) {
            return Err(WordbadgeError::corrupted("First offset is not zero"));
        }
        for (i, &offset) in offsets.iter().enumerate() {
            let offset = offset as usize;
            if offset >= text.len() || !text.is_char_boundary(offset) {
                return Err(WordbadgeError::corrupted(format!(
                    "Offset {} of word {} is out of range",
                    offset, i
                )));
            }
        }

        if let Some(i) = offsets.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(WordbadgeError::corrupted(format!(
                "Empty or overlapping word at index {}",
                i + 1
            )));
        }

        let table = WordTable {
            text,
            offsets,
            flags,
        };

        // Strictly ascending, or binary search is meaningless.
        for i in 1..table.len() {
            if table.word(i - 1) >= table.word(i) {
                return Err(WordbadgeError::corrupted(format!(
                    "Words out of order at index {}",
                    i
                )));
            }
        }

        Ok(table)
    }

    fn len(&self) -> usize {
        self.offsets.len()
    }

    fn word(&self, i: usize) -> &str {
        let start = self.offsets[i] as usize;
        let end = self
            .offsets
            .get(i + 1)
            .map_or(self.text.len(), |&next| next as usize);
        &self.text[start..end]
    }

    fn flags_at(&self, i: usize) -> WordFlags {
        WordFlags::from_bits(self.flags[i])
    }

    /// Binary search for `key` among words `lo..`.
    fn search_from(&self, key: &str, lo: usize) -> std::result::Result<usize, usize> {
        let (mut lo, mut hi) = (lo, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.word(mid).cmp(key) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(lo)
    }
}

/// A durable word → flags store, opened from disk or freshly built.
///
/// ## Example
///
/// ```rust,ignore
/// use wordbadge_core::{DictionaryEdition, MembershipStore, VersionTag};
///
/// let tag = VersionTag::current(DictionaryEdition::Nwl2023);
/// let store = MembershipStore::open("./data", &tag)?;
///
/// let flags = store.lookup_batch(["Apple", "zebra"]);
/// for (word, flags) in &flags {
///     println!("{}: {}", word, flags);
/// }
/// ```
pub struct MembershipStore {
    layout: StoreLayout,
    tag: VersionTag,
    table: WordTable,
    stats: StoreStats,
}

impl MembershipStore {
    /// Open the store under `base_dir`, requiring it to match `expected`.
    ///
    /// Fails with an error for which
    /// [`requires_rebuild`](WordbadgeError::requires_rebuild) is true when
    /// the store is missing, stale or corrupted.
    #[instrument(skip(base_dir))]
    pub fn open(base_dir: impl AsRef<Path>, expected: &VersionTag) -> Result<Self> {
        let layout = StoreLayout::new(base_dir);

        let found = layout.read_tag()?;
        if found != *expected {
            return Err(WordbadgeError::StoreStale {
                found: found.to_string(),
                expected: expected.to_string(),
            });
        }

        let stored = layout.load_table()?;
        if stored.tag != found.to_string() {
            return Err(WordbadgeError::corrupted(format!(
                "Table built as {} but tag file says {}",
                stored.tag, found
            )));
        }

        let store = Self::from_stored(layout, found, stored)?;
        info!(
            records = store.len(),
            tag = %store.tag,
            "Store opened"
        );
        Ok(store)
    }

    /// Build a new store from merged flags and swap it into place.
    ///
    /// The previous store on disk (if any) is replaced only after the new
    /// table and its tag are fully written.
    #[instrument(skip(base_dir, merged, options), fields(words = merged.len()))]
    pub fn build(
        base_dir: impl AsRef<Path>,
        tag: VersionTag,
        merged: MergedFlags,
        options: BuildOptions,
    ) -> Result<Self> {
        let layout = StoreLayout::new(base_dir);
        let entries: Vec<WordEntry> = into_sorted_entries(merged);

        let stored = layout.write_staged(&tag, &entries, options.compress)?;
        layout.commit_staged()?;

        let store = Self::from_stored(layout, tag, stored)?;
        info!(records = store.len(), tag = %store.tag, "Store built");
        Ok(store)
    }

    /// Check whether a store exists under `base_dir` (without validating it).
    pub fn exists(base_dir: impl AsRef<Path>) -> bool {
        StoreLayout::new(base_dir).exists()
    }

    /// Delete the store and any rebuild leftovers under `base_dir`.
    pub fn remove(base_dir: impl AsRef<Path>) -> Result<()> {
        StoreLayout::new(base_dir).clear()
    }

    fn from_stored(layout: StoreLayout, tag: VersionTag, stored: StoredTable) -> Result<Self> {
        let built_at = DateTime::from_timestamp(stored.built_at, 0);
        let table = WordTable::from_stored(stored)?;

        let mut stats = StoreStats {
            built_at,
            tag: tag.to_string(),
            ..Default::default()
        };
        for &bits in &table.flags {
            stats.record(WordFlags::from_bits(bits));
        }

        Ok(MembershipStore {
            layout,
            tag,
            table,
            stats,
        })
    }

    /// Tag this store was built with
    pub fn tag(&self) -> &VersionTag {
        &self.tag
    }

    /// Directory layout backing this store
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Statistics computed when the store was opened
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Check whether a word is present in any list.
    pub fn contains(&self, word: &str) -> bool {
        normalize_word(word).is_some_and(|key| self.table.search_from(&key, 0).is_ok())
    }

    /// Flags for a single word (case-insensitive); all false if absent.
    pub fn lookup_one(&self, word: &str) -> WordFlags {
        let Some(key) = normalize_word(word) else {
            return WordFlags::NONE;
        };
        match self.table.search_from(&key, 0) {
            Ok(i) => self.table.flags_at(i),
            Err(_) => WordFlags::NONE,
        }
    }

    /// Flags for a batch of words.
    ///
    /// Inputs are normalized (trimmed, lowercased) and de-duplicated. The
    /// result is keyed by the normalized word and contains entries only for
    /// words present in the store; absence means all flags false.
    pub fn lookup_batch<I, S>(&self, words: I) -> HashMap<String, WordFlags>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<String> = words
            .into_iter()
            .filter_map(|w| normalize_word(w.as_ref()))
            .collect();
        keys.sort_unstable();
        keys.dedup();

        let requested = keys.len();
        let mut found = HashMap::with_capacity(requested);
        let mut lo = 0;
        for key in keys {
            match self.table.search_from(&key, lo) {
                Ok(i) => {
                    found.insert(key, self.table.flags_at(i));
                    lo = i + 1;
                }
                Err(i) => lo = i,
            }
        }

        debug!(requested, found = found.len(), "Batch lookup");
        found
    }

    /// Iterate over all stored entries in word order.
    pub fn entries(&self) -> impl Iterator<Item = WordEntry> + '_ {
        (0..self.table.len()).map(|i| WordEntry::new(self.table.word(i), self.table.flags_at(i)))
    }
}

impl std::fmt::Debug for MembershipStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipStore")
            .field("tag", &self.tag.to_string())
            .field("records", &self.len())
            .field("dir", &self.layout.store_dir())
            .finish()
    }
}
