//! # Wordbadge Core Library
//!
//! This crate provides word list ingestion, the persistent membership store,
//! and its lifecycle management. Given a word, it answers which lists contain
//! it: the wordle list, the selected scrabble edition, and the common word
//! list.
//!
//! ## Architecture
//!
//! - **Types** (`types`): Flags, editions, version tags and normalization
//! - **Source** (`source`): Resource loaders and lazy word token streams
//! - **Merge** (`merge`): Folding source streams into one flag per word
//! - **Persistence** (`persistence`): On-disk store format and atomic swaps
//! - **Store** (`store`): The opened, immutable membership table
//! - **Lifecycle** (`lifecycle`): Initialization, staleness and rebuilds
//! - **Settings** (`settings`): Persisted dictionary edition selection
//! - **Config** (`config`): Configuration management
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wordbadge_core::{Config, DirectoryLoader, SettingsFile, StoreManager};
//!
//! let config = Config::load()?;
//! let manager = StoreManager::new(
//!     config.store_options()?,
//!     Arc::new(DirectoryLoader::new(config.resource_dir()?)),
//!     Arc::new(SettingsFile::new(config.settings_path()?)),
//! );
//! manager.initialize()?;
//!
//! for (word, flags) in manager.lookup_batch(["apple", "tree"]) {
//!     println!("{}: {}", word, flags);
//! }
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod merge;
pub mod persistence;
pub mod settings;
pub mod source;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, WordbadgeError};
pub use lifecycle::{StoreManager, StoreOptions, StoreStatus};
pub use merge::{ingest, FlagMerger, MergedFlags};
pub use persistence::StoreLayout;
pub use settings::{EditionSelection, FixedEdition, SettingsFile, EDITION_KEY};
pub use source::{
    DirectoryLoader, IngestProgress, LoggingProgress, MemoryLoader, ResourceLoader,
    WordListSource,
};
pub use store::{BuildOptions, MembershipStore};
pub use types::{
    normalize_word, DictionaryEdition, FlagSource, StoreStats, VersionTag, WordEntry, WordFlags,
    SCHEMA_VERSION,
};
