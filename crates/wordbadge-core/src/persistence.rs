//! Persistence layer for the membership store.
//!
//! This module handles writing the word table to disk and reading it back.
//! The on-disk format is designed for:
//!
//! - Fast loading: one read, one optional decompression, no per-word parsing
//! - Versioning: format changes are detected via the header version
//! - Atomic rebuilds: a new store is staged next to the live one and swapped
//!   in with directory renames, so a crash never leaves a half-written store
//!   that looks valid
//! - Integrity: a CRC32 over the data section detects corruption
//!
//! ## Directory Layout
//!
//! ```text
//! <base>/store/words.wbs      live word table
//! <base>/store/version.tag    "<schemaVersion>-<editionID>"
//! <base>/store.staging/       rebuild in progress
//! <base>/store.old/           previous store during the swap
//! ```
//!
//! The tag file is written after the table, and the staging directory is
//! only renamed into place once both are synced. A store directory without
//! a readable tag is treated as absent.
//!
//! ## Store File Format
//!
//! ```text
//! [Header: 32 bytes]
//!   - Magic: "WBDG" (4 bytes)
//!   - Version: u32 (4 bytes)
//!   - Flags: u32 (4 bytes) - compression
//!   - Record count: u64 (8 bytes)
//!   - Reserved: 12 bytes
//!
//! [Data: variable]
//!   - bincode(StoredTable), LZ4 size-prepended when compressed
//!
//! [Footer: 8 bytes]
//!   - CRC32 checksum of data: u32
//!   - Magic: "GDBW" (4 bytes)
//! ```

use crate::error::{Result, WordbadgeError};
use crate::types::{VersionTag, WordEntry};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Magic bytes at the start of store files
pub const MAGIC_HEADER: &[u8; 4] = b"WBDG";
/// Magic bytes at the end of store files (reversed)
pub const MAGIC_FOOTER: &[u8; 4] = b"GDBW";
/// Current store file format version
pub const FORMAT_VERSION: u32 = 1;

/// Word table file name inside the store directory
pub const STORE_FILE: &str = "words.wbs";
/// Version tag sidecar file name inside the store directory
pub const TAG_FILE: &str = "version.tag";

const STORE_DIR: &str = "store";
const STAGING_DIR: &str = "store.staging";
const RETIRED_DIR: &str = "store.old";

const HEADER_LEN: usize = 32;
const FOOTER_LEN: usize = 8;

/// Flags for store file format
#[derive(Debug, Clone, Copy)]
pub struct StoreFlags(u32);

impl StoreFlags {
    /// No compression
    pub const NONE: Self = StoreFlags(0);
    /// LZ4 compression of the data section
    pub const COMPRESSED_LZ4: Self = StoreFlags(1);

    fn is_compressed(&self) -> bool {
        self.0 & 1 != 0
    }
}

/// Header structure for the store file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreHeader {
    magic: [u8; 4],
    version: u32,
    flags: u32,
    record_count: u64,
    reserved: [u8; 12],
}

impl StoreHeader {
    fn new(record_count: u64, flags: StoreFlags) -> Self {
        StoreHeader {
            magic: *MAGIC_HEADER,
            version: FORMAT_VERSION,
            flags: flags.0,
            record_count,
            reserved: [0; 12],
        }
    }

    fn validate(&self) -> Result<()> {
        if self.magic != *MAGIC_HEADER {
            return Err(WordbadgeError::corrupted("Invalid magic bytes in header"));
        }
        if self.version > FORMAT_VERSION {
            return Err(WordbadgeError::StoreVersionMismatch {
                found: self.version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(())
    }
}

/// The word table as serialized in the data section.
///
/// `words` holds every word concatenated in ascending order and `offsets[i]`
/// is where word `i` starts; word `i` ends where word `i + 1` starts. The
/// offsets array is the lookup index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredTable {
    pub built_at: i64,
    pub tag: String,
    pub words: Vec<u8>,
    pub offsets: Vec<u32>,
    pub flags: Vec<u8>,
}

impl StoredTable {
    /// Encode sorted entries. Adjacent duplicates are collapsed by OR-ing
    /// their flags so each word appears once.
    pub fn encode(tag: &VersionTag, entries: &[WordEntry]) -> Result<Self> {
        let mut table = StoredTable {
            built_at: chrono::Utc::now().timestamp(),
            tag: tag.to_string(),
            words: Vec::with_capacity(entries.iter().map(|e| e.word.len()).sum()),
            offsets: Vec::with_capacity(entries.len()),
            flags: Vec::with_capacity(entries.len()),
        };

        let mut previous: Option<&str> = None;
        for entry in entries {
            match previous {
                Some(prev) if prev == entry.word => {
                    if let Some(last) = table.flags.last_mut() {
                        *last |= entry.flags.to_bits();
                    }
                    continue;
                }
                Some(prev) if prev > entry.word.as_str() => {
                    return Err(WordbadgeError::Internal(format!(
                        "entries not sorted: {:?} before {:?}",
                        prev, entry.word
                    )));
                }
                _ => {}
            }

            let offset = u32::try_from(table.words.len()).map_err(|_| {
                WordbadgeError::Internal("word table exceeds 4 GiB".to_string())
            })?;
            table.offsets.push(offset);
            table.flags.push(entry.flags.to_bits());
            table.words.extend_from_slice(entry.word.as_bytes());
            previous = Some(entry.word.as_str());
        }

        Ok(table)
    }

    pub fn record_count(&self) -> u64 {
        self.offsets.len() as u64
    }
}

/// Manages the store's files on disk.
///
/// ## Example
///
/// ```rust,ignore
/// use wordbadge_core::persistence::StoreLayout;
///
/// let layout = StoreLayout::new("./data");
/// if layout.exists() {
///     println!("store built as {}", layout.read_tag()?);
/// }
/// layout.clear()?;
/// ```
#[derive(Debug, Clone)]
pub struct StoreLayout {
    /// Base directory holding the store directories
    base_dir: PathBuf,
}

impl StoreLayout {
    /// Create a layout rooted at `base_dir`. Nothing is created on disk.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        StoreLayout {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory of the live store
    pub fn store_dir(&self) -> PathBuf {
        self.base_dir.join(STORE_DIR)
    }

    fn staging_dir(&self) -> PathBuf {
        self.base_dir.join(STAGING_DIR)
    }

    fn retired_dir(&self) -> PathBuf {
        self.base_dir.join(RETIRED_DIR)
    }

    /// Path to the live word table file
    pub fn store_path(&self) -> PathBuf {
        self.store_dir().join(STORE_FILE)
    }

    /// Path to the live version tag file
    pub fn tag_path(&self) -> PathBuf {
        self.store_dir().join(TAG_FILE)
    }

    /// Check if a live store (table and tag) exists.
    pub fn exists(&self) -> bool {
        self.store_path().exists() && self.tag_path().exists()
    }

    /// Read the live version tag.
    pub fn read_tag(&self) -> Result<VersionTag> {
        let path = self.tag_path();
        match fs::read_to_string(&path) {
            Ok(contents) => contents.parse(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(WordbadgeError::StoreNotFound { path })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write a complete store into the staging directory.
    ///
    /// Any leftovers from an interrupted rebuild are removed first. The live
    /// store is not touched.
    pub(crate) fn write_staged(
        &self,
        tag: &VersionTag,
        entries: &[WordEntry],
        compress: bool,
    ) -> Result<StoredTable> {
        self.remove_leftovers()?;

        let staging = self.staging_dir();
        fs::create_dir_all(&staging)?;

        let table = StoredTable::encode(tag, entries)?;
        let flags = if compress {
            StoreFlags::COMPRESSED_LZ4
        } else {
            StoreFlags::NONE
        };

        let bytes = bincode::serialize(&table)?;
        let data = if flags.is_compressed() {
            lz4_flex::compress_prepend_size(&bytes)
        } else {
            bytes
        };

        info!(
            path = %staging.display(),
            records = table.record_count(),
            bytes = data.len(),
            compressed = flags.is_compressed(),
            tag = %tag,
            "Writing staged store"
        );

        {
            let file = File::create(staging.join(STORE_FILE))?;
            let mut writer = BufWriter::new(file);

            let header = StoreHeader::new(table.record_count(), flags);
            writer.write_all(&bincode::serialize(&header)?)?;
            writer.write_all(&data)?;

            let checksum = crc32fast::hash(&data);
            writer.write_all(&checksum.to_le_bytes())?;
            writer.write_all(MAGIC_FOOTER)?;

            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        // The tag goes last: a staging directory without it is never valid.
        {
            let mut file = File::create(staging.join(TAG_FILE))?;
            file.write_all(tag.to_string().as_bytes())?;
            file.sync_all()?;
        }

        Ok(table)
    }

    /// Swap the staging directory into place as the live store.
    pub fn commit_staged(&self) -> Result<()> {
        let live = self.store_dir();
        let staging = self.staging_dir();
        let retired = self.retired_dir();

        if !staging.join(TAG_FILE).exists() {
            return Err(WordbadgeError::StoreNotFound {
                path: staging.join(TAG_FILE),
            });
        }

        let had_live = live.exists();
        if had_live {
            fs::rename(&live, &retired)?;
        }

        if let Err(e) = fs::rename(&staging, &live) {
            if had_live {
                if let Err(restore) = fs::rename(&retired, &live) {
                    warn!(error = %restore, "Failed to restore previous store after swap error");
                }
            }
            return Err(e.into());
        }

        if had_live {
            if let Err(e) = fs::remove_dir_all(&retired) {
                warn!(path = %retired.display(), error = %e, "Failed to remove retired store");
            }
        }

        debug!(path = %live.display(), "Staged store committed");
        Ok(())
    }

    /// Load and validate the live word table.
    pub(crate) fn load_table(&self) -> Result<StoredTable> {
        let path = self.store_path();
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(WordbadgeError::StoreNotFound { path });
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), bytes = raw.len(), "Loading store table");
        decode_file(&raw)
    }

    /// Remove staging and retired directories left by an interrupted rebuild.
    pub fn remove_leftovers(&self) -> Result<()> {
        for dir in [self.staging_dir(), self.retired_dir()] {
            if dir.exists() {
                warn!(path = %dir.display(), "Removing leftover store directory");
                fs::remove_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    /// Delete all stored data.
    pub fn clear(&self) -> Result<()> {
        self.remove_leftovers()?;
        let live = self.store_dir();
        if live.exists() {
            fs::remove_dir_all(&live)?;
        }
        Ok(())
    }
}

/// Validate framing and decode a complete store file.
fn decode_file(raw: &[u8]) -> Result<StoredTable> {
    if raw.len() < HEADER_LEN + FOOTER_LEN {
        return Err(WordbadgeError::corrupted(format!(
            "File too short: {} bytes",
            raw.len()
        )));
    }

    let header: StoreHeader = bincode::deserialize(&raw[..HEADER_LEN])
        .map_err(|e| WordbadgeError::corrupted(format!("Header unreadable: {}", e)))?;
    header.validate()?;
    let flags = StoreFlags(header.flags);

    let data = &raw[HEADER_LEN..raw.len() - FOOTER_LEN];
    let footer = &raw[raw.len() - FOOTER_LEN..];

    if &footer[4..8] != MAGIC_FOOTER {
        return Err(WordbadgeError::corrupted("Invalid footer magic bytes"));
    }

    let stored_checksum = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
    let computed_checksum = crc32fast::hash(data);
    if stored_checksum != computed_checksum {
        return Err(WordbadgeError::corrupted(format!(
            "Checksum mismatch: expected {:08x}, got {:08x}",
            stored_checksum, computed_checksum
        )));
    }

    let decompressed;
    let bytes = if flags.is_compressed() {
        decompressed = lz4_flex::decompress_size_prepended(data)
            .map_err(|e| WordbadgeError::corrupted(format!("Decompression failed: {}", e)))?;
        decompressed.as_slice()
    } else {
        data
    };

    let table: StoredTable = bincode::deserialize(bytes)
        .map_err(|e| WordbadgeError::corrupted(format!("Deserialization failed: {}", e)))?;

    if table.record_count() != header.record_count {
        return Err(WordbadgeError::corrupted(format!(
            "Record count mismatch: header says {}, table has {}",
            header.record_count,
            table.record_count()
        )));
    }

    Ok(table)
}
