//! Word list sources.
//!
//! This module defines how flat word list resources are located and read.
//! Resources are newline-delimited text blobs delivered by a
//! [`ResourceLoader`]; the store never cares whether they come from a
//! directory on disk, from bytes bundled into the binary, or from a test
//! fixture.
//!
//! A [`WordListSource`] turns one resource into a lazy stream of normalized
//! tokens: surrounding whitespace trimmed, lowercased, blank lines dropped.
//! Duplicates are passed through untouched; the merger collapses them.
//!
//! A missing resource is not an error for ingestion. It is logged and the
//! source simply yields no words.

use crate::error::WordbadgeError;
use crate::types::{normalize_word, FlagSource};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reader over a resource's bytes
pub type ResourceReader = Box<dyn BufRead + Send>;

/// Abstract trait for word list resource providers.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; the store owner calls them from
/// whichever thread performs a rebuild.
///
/// ## Missing Resources
///
/// `open` returns `Ok(None)` when the named resource does not exist. Errors
/// are reserved for resources that exist but cannot be read.
pub trait ResourceLoader: Send + Sync {
    /// Open the named resource for reading.
    fn open(&self, resource: &str) -> anyhow::Result<Option<ResourceReader>>;

    /// Get the loader name (e.g., "directory", "memory")
    fn name(&self) -> &'static str;
}

/// Loads resources from files in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    /// Create a loader rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        DirectoryLoader {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory resources are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLoader for DirectoryLoader {
    fn open(&self, resource: &str) -> anyhow::Result<Option<ResourceReader>> {
        let path = self.root.join(resource);
        match File::open(&path) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("failed to open {}", path.display()))),
        }
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}

/// Serves resources from in-memory text, e.g. bundled with `include_str!`.
///
/// Contents can be replaced at runtime, which makes this loader useful for
/// embedders that download lists and for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    resources: Arc<RwLock<HashMap<String, Arc<str>>>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_resource(self, name: impl Into<String>, contents: impl Into<Arc<str>>) -> Self {
        self.insert(name, contents);
        self
    }

    /// Build a resource from a list of words, one per line
    pub fn with_words(self, name: impl Into<String>, words: &[&str]) -> Self {
        self.with_resource(name, words.join("\n"))
    }

    /// Add or replace a resource
    pub fn insert(&self, name: impl Into<String>, contents: impl Into<Arc<str>>) {
        self.resources.write().insert(name.into(), contents.into());
    }

    /// Remove a resource
    pub fn remove(&self, name: &str) {
        self.resources.write().remove(name);
    }
}

impl ResourceLoader for MemoryLoader {
    fn open(&self, resource: &str) -> anyhow::Result<Option<ResourceReader>> {
        let contents = self.resources.read().get(resource).cloned();
        Ok(contents.map(|text| {
            Box::new(Cursor::new(text.as_bytes().to_vec())) as ResourceReader
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// A configured word list: which resource to read and which flag it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordListSource {
    pub flag: FlagSource,
    pub resource: String,
}

impl WordListSource {
    pub fn new(flag: FlagSource, resource: impl Into<String>) -> Self {
        WordListSource {
            flag,
            resource: resource.into(),
        }
    }

    /// Open the resource and return its normalized tokens.
    ///
    /// Never fails: an absent or unreadable resource yields an empty stream
    /// after logging a warning.
    pub fn tokens(&self, loader: &dyn ResourceLoader) -> WordTokens {
        match loader.open(&self.resource) {
            Ok(Some(reader)) => {
                debug!(
                    source = %self.flag,
                    resource = %self.resource,
                    loader = loader.name(),
                    "Reading word list"
                );
                WordTokens::new(self.resource.clone(), reader)
            }
            Ok(None) => {
                let err = WordbadgeError::SourceMissing {
                    resource: self.resource.clone(),
                };
                warn!(source = %self.flag, error = %err, "Word list contributes no words");
                WordTokens::empty(self.resource.clone())
            }
            Err(e) => {
                warn!(
                    source = %self.flag,
                    resource = %self.resource,
                    error = %e,
                    "Failed to open word list, treating as empty"
                );
                WordTokens::empty(self.resource.clone())
            }
        }
    }
}

/// Lazy stream of normalized tokens from one resource.
///
/// Lines that are not valid UTF-8 are logged and skipped. A read error
/// part-way through ends the stream; words read before the error are kept.
pub struct WordTokens {
    resource: String,
    reader: Option<ResourceReader>,
    buf: Vec<u8>,
    line_no: u64,
}

impl WordTokens {
    fn new(resource: String, reader: ResourceReader) -> Self {
        WordTokens {
            resource,
            reader: Some(reader),
            buf: Vec::new(),
            line_no: 0,
        }
    }

    fn empty(resource: String) -> Self {
        WordTokens {
            resource,
            reader: None,
            buf: Vec::new(),
            line_no: 0,
        }
    }

    /// Tokenize in-memory text (no loader involved)
    pub fn from_text(text: &str) -> Self {
        let reader: ResourceReader = Box::new(Cursor::new(text.as_bytes().to_vec()));
        WordTokens::new(String::from("<text>"), reader)
    }
}

impl Iterator for WordTokens {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let reader = self.reader.as_mut()?;
        loop {
            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.reader = None;
                    return None;
                }
                Ok(_) => {
                    self.line_no += 1;
                    match std::str::from_utf8(&self.buf) {
                        Ok(line) => {
                            if let Some(word) = normalize_word(line) {
                                return Some(word);
                            }
                        }
                        Err(e) => {
                            warn!(
                                resource = %self.resource,
                                line = self.line_no,
                                error = %e,
                                "Skipping word list line that is not valid UTF-8"
                            );
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(
                        resource = %self.resource,
                        error = %e,
                        "Read error in word list, truncating source"
                    );
                    self.reader = None;
                    return None;
                }
            }
        }
    }
}

/// Progress reporting for ingestion
pub trait IngestProgress: Send + Sync {
    /// Called after each source has been fully read
    fn on_source_complete(&self, source: FlagSource, resource: &str, words: u64);

    /// Called when all sources are merged
    fn on_complete(&self, distinct_words: u64);
}

/// A simple progress reporter that logs to tracing
pub struct LoggingProgress {
    label: String,
}

impl LoggingProgress {
    pub fn new(label: impl Into<String>) -> Self {
        LoggingProgress {
            label: label.into(),
        }
    }
}

impl IngestProgress for LoggingProgress {
    fn on_source_complete(&self, source: FlagSource, resource: &str, words: u64) {
        tracing::debug!(
            build = %self.label,
            source = %source,
            resource = %resource,
            words = words,
            "Source ingested"
        );
    }

    fn on_complete(&self, distinct_words: u64) {
        tracing::info!(
            build = %self.label,
            words = distinct_words,
            "Ingestion complete"
        );
    }
}
