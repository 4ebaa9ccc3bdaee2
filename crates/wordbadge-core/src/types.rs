//! Core data types for Wordbadge.
//!
//! This module defines the fundamental data structures used throughout the
//! ingestion, storage and lookup system. These types are designed to be:
//!
//! - **Serializable**: For persistence to disk and CLI output
//! - **Small**: A word's flags pack into a single byte on disk
//! - **Case-normalized**: Words are always stored and compared in lowercase

use crate::error::{Result, WordbadgeError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Schema version of the store contents.
///
/// Part of every [`VersionTag`]; bump it whenever the on-disk layout or the
/// merge semantics change so existing stores are rebuilt on next launch.
pub const SCHEMA_VERSION: u32 = 1;

/// Normalize a raw word: trim surrounding whitespace and lowercase.
///
/// Returns `None` for blank input.
pub fn normalize_word(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// One of the word lists that contributes a membership flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSource {
    /// The five-letter "wordle" answer list
    Wordle,
    /// The selected scrabble dictionary edition
    Scrabble,
    /// The "common words" list
    CommonBongo,
}

impl FlagSource {
    /// All sources, in ingestion order
    pub const ALL: [FlagSource; 3] = [
        FlagSource::Wordle,
        FlagSource::Scrabble,
        FlagSource::CommonBongo,
    ];

    /// Bit owned by this source in the packed flag byte
    pub const fn bit(self) -> u8 {
        match self {
            FlagSource::Wordle => 0b001,
            FlagSource::Scrabble => 0b010,
            FlagSource::CommonBongo => 0b100,
        }
    }
}

impl fmt::Display for FlagSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagSource::Wordle => write!(f, "wordle"),
            FlagSource::Scrabble => write!(f, "scrabble"),
            FlagSource::CommonBongo => write!(f, "common_bongo"),
        }
    }
}

/// The three independent membership flags of a word.
///
/// A word absent from every list has all flags false, which is also the
/// `Default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordFlags {
    pub is_wordle: bool,
    pub is_scrabble: bool,
    pub is_common_bongo: bool,
}

impl WordFlags {
    /// All flags false
    pub const NONE: WordFlags = WordFlags {
        is_wordle: false,
        is_scrabble: false,
        is_common_bongo: false,
    };

    /// Create flags from explicit values
    pub fn new(is_wordle: bool, is_scrabble: bool, is_common_bongo: bool) -> Self {
        WordFlags {
            is_wordle,
            is_scrabble,
            is_common_bongo,
        }
    }

    /// Set the flag owned by `source`
    pub fn set(&mut self, source: FlagSource) {
        match source {
            FlagSource::Wordle => self.is_wordle = true,
            FlagSource::Scrabble => self.is_scrabble = true,
            FlagSource::CommonBongo => self.is_common_bongo = true,
        }
    }

    /// Check the flag owned by `source`
    pub fn has(&self, source: FlagSource) -> bool {
        match source {
            FlagSource::Wordle => self.is_wordle,
            FlagSource::Scrabble => self.is_scrabble,
            FlagSource::CommonBongo => self.is_common_bongo,
        }
    }

    /// True if no flag is set
    pub fn is_empty(&self) -> bool {
        !(self.is_wordle || self.is_scrabble || self.is_common_bongo)
    }

    /// Logical OR of two flag sets
    pub fn union(self, other: WordFlags) -> WordFlags {
        WordFlags {
            is_wordle: self.is_wordle || other.is_wordle,
            is_scrabble: self.is_scrabble || other.is_scrabble,
            is_common_bongo: self.is_common_bongo || other.is_common_bongo,
        }
    }

    /// Pack into the on-disk byte representation
    pub fn to_bits(self) -> u8 {
        FlagSource::ALL
            .iter()
            .filter(|s| self.has(**s))
            .fold(0, |bits, s| bits | s.bit())
    }

    /// Unpack from the on-disk byte representation (unknown bits ignored)
    pub fn from_bits(bits: u8) -> Self {
        let mut flags = WordFlags::NONE;
        for source in FlagSource::ALL {
            if bits & source.bit() != 0 {
                flags.set(source);
            }
        }
        flags
    }
}

impl fmt::Display for WordFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = FlagSource::ALL
            .iter()
            .filter(|s| self.has(**s))
            .map(|s| s.to_string())
            .collect();
        if names.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", names.join(","))
        }
    }
}

/// One persisted record: a lowercase word and its flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub flags: WordFlags,
}

impl WordEntry {
    pub fn new(word: impl Into<String>, flags: WordFlags) -> Self {
        WordEntry {
            word: word.into(),
            flags,
        }
    }
}

/// A selectable edition of the scrabble word list.
///
/// Exactly one edition is selected at a time; the selection itself lives in
/// user settings, not in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DictionaryEdition {
    /// NASPA Word List 2023
    #[default]
    Nwl2023,
    /// NASPA Word List 2020
    Nwl2020,
    /// Collins Scrabble Words 2019
    Collins2019,
}

impl DictionaryEdition {
    /// Every known edition
    pub const ALL: [DictionaryEdition; 3] = [
        DictionaryEdition::Nwl2023,
        DictionaryEdition::Nwl2020,
        DictionaryEdition::Collins2019,
    ];

    /// Stable identifier used in settings and version tags
    pub fn id(&self) -> &'static str {
        match self {
            DictionaryEdition::Nwl2023 => "nwl2023",
            DictionaryEdition::Nwl2020 => "nwl2020",
            DictionaryEdition::Collins2019 => "collins2019",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            DictionaryEdition::Nwl2023 => "NASPA Word List 2023",
            DictionaryEdition::Nwl2020 => "NASPA Word List 2020",
            DictionaryEdition::Collins2019 => "Collins Scrabble Words 2019",
        }
    }

    /// Default backing resource name for this edition
    pub fn default_resource(&self) -> String {
        format!("scrabble_{}.txt", self.id())
    }

    /// Parse an identifier (case-insensitive)
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.id().eq_ignore_ascii_case(id))
    }

    /// Parse an identifier, falling back to the default edition
    pub fn parse_or_default(id: Option<&str>) -> Self {
        id.and_then(Self::from_id).unwrap_or_default()
    }
}

impl fmt::Display for DictionaryEdition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for DictionaryEdition {
    type Err = WordbadgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_id(s).ok_or_else(|| WordbadgeError::ConfigError {
            reason: format!("unknown dictionary edition: {}", s),
        })
    }
}

/// Identifies the schema version and edition that produced a store.
///
/// Rendered as `"<schemaVersion>-<editionID>"`. Any change to either part
/// makes an existing store stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionTag {
    pub schema_version: u32,
    pub edition: DictionaryEdition,
}

impl VersionTag {
    /// Tag for the current schema and the given edition
    pub fn current(edition: DictionaryEdition) -> Self {
        VersionTag {
            schema_version: SCHEMA_VERSION,
            edition,
        }
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.schema_version, self.edition.id())
    }
}

impl FromStr for VersionTag {
    type Err = WordbadgeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || WordbadgeError::corrupted(format!("invalid version tag: {:?}", s));

        let (version, edition) = s.trim().split_once('-').ok_or_else(invalid)?;
        let schema_version = version.parse::<u32>().map_err(|_| invalid())?;
        let edition = DictionaryEdition::from_id(edition).ok_or_else(invalid)?;

        Ok(VersionTag {
            schema_version,
            edition,
        })
    }
}

/// Statistics about a built store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of distinct words
    pub total_words: u64,

    /// Words carrying the wordle flag
    pub wordle_words: u64,

    /// Words carrying the scrabble flag
    pub scrabble_words: u64,

    /// Words carrying the common-words flag
    pub common_bongo_words: u64,

    /// When the store was built
    pub built_at: Option<DateTime<Utc>>,

    /// Version tag rendered as a string
    pub tag: String,
}

impl StoreStats {
    /// Count one word's flags into the totals
    pub fn record(&mut self, flags: WordFlags) {
        self.total_words += 1;
        if flags.is_wordle {
            self.wordle_words += 1;
        }
        if flags.is_scrabble {
            self.scrabble_words += 1;
        }
        if flags.is_common_bongo {
            self.common_bongo_words += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize_word("  Apple \r"), Some("apple".to_string()));
        assert_eq!(normalize_word("ZEBRA"), Some("zebra".to_string()));
        assert_eq!(normalize_word("   "), None);
        assert_eq!(normalize_word(""), None);
    }

    #[test]
    fn test_flag_bits() {
        let flags = WordFlags::new(true, false, true);
        assert_eq!(flags.to_bits(), 0b101);
        assert_eq!(WordFlags::from_bits(0b101), flags);
        assert_eq!(WordFlags::from_bits(0), WordFlags::NONE);
        // Unknown high bits are ignored
        assert_eq!(WordFlags::from_bits(0b1000_0010), WordFlags::new(false, true, false));
    }

    #[test]
    fn test_flag_union() {
        let a = WordFlags::new(true, false, false);
        let b = WordFlags::new(false, false, true);
        assert_eq!(a.union(b), WordFlags::new(true, false, true));
        assert!(WordFlags::NONE.is_empty());
        assert!(!a.is_empty());
    }

    #[test]
    fn test_flags_display() {
        assert_eq!(WordFlags::new(true, true, false).to_string(), "wordle,scrabble");
        assert_eq!(WordFlags::NONE.to_string(), "-");
    }

    #[test]
    fn test_edition_parsing() {
        assert_eq!(
            DictionaryEdition::from_id("COLLINS2019"),
            Some(DictionaryEdition::Collins2019)
        );
        assert_eq!(DictionaryEdition::from_id("sowpods"), None);
        assert_eq!(
            DictionaryEdition::parse_or_default(Some("sowpods")),
            DictionaryEdition::Nwl2023
        );
        assert_eq!(
            DictionaryEdition::parse_or_default(None),
            DictionaryEdition::Nwl2023
        );
        assert!("bogus".parse::<DictionaryEdition>().is_err());
    }

    #[test]
    fn test_edition_resources_are_distinct() {
        let mut resources: Vec<String> = DictionaryEdition::ALL
            .iter()
            .map(|e| e.default_resource())
            .collect();
        resources.sort();
        resources.dedup();
        assert_eq!(resources.len(), DictionaryEdition::ALL.len());
    }

    #[test]
    fn test_version_tag_format() {
        let tag = VersionTag::current(DictionaryEdition::Nwl2020);
        assert_eq!(tag.to_string(), format!("{}-nwl2020", SCHEMA_VERSION));

        let parsed: VersionTag = "7-collins2019".parse().unwrap();
        assert_eq!(parsed.schema_version, 7);
        assert_eq!(parsed.edition, DictionaryEdition::Collins2019);

        assert!("nwl2023".parse::<VersionTag>().is_err());
        assert!("x-nwl2023".parse::<VersionTag>().is_err());
        assert!("1-unknown".parse::<VersionTag>().is_err());
    }

    #[test]
    fn test_version_tag_changes_with_edition() {
        let a = VersionTag::current(DictionaryEdition::Nwl2023);
        let b = VersionTag::current(DictionaryEdition::Collins2019);
        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_stats_record() {
        let mut stats = StoreStats::default();
        stats.record(WordFlags::new(true, true, false));
        stats.record(WordFlags::new(false, true, true));
        assert_eq!(stats.total_words, 2);
        assert_eq!(stats.wordle_words, 1);
        assert_eq!(stats.scrabble_words, 2);
        assert_eq!(stats.common_bongo_words, 1);
    }
}
