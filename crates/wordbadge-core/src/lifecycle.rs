//! Store lifecycle: initialization, staleness detection and rebuilds.
//!
//! [`StoreManager`] is the single owner of the live [`MembershipStore`]. The
//! application constructs one at its composition root and shares it (for
//! example behind an `Arc`) with everything that needs lookups.
//!
//! ## State Machine
//!
//! ```text
//! Uninitialized --initialize ok--> Ready(tag)
//! Ready(tag) --rebuild_if_needed, tag changed--> Rebuilding --> Ready(new tag)
//! ```
//!
//! A failed initialization leaves the manager `Uninitialized`; a failed
//! rebuild returns it to its previous `Ready(tag)` with the old store still
//! serving lookups.
//!
//! ## Concurrency
//!
//! The live store sits behind a `parking_lot::RwLock`. Lookups take the read
//! lock; initialization and rebuilds take the write lock for their whole
//! duration, so lookups arriving during a rebuild block until the new store
//! is in place and never see a partially built one.
//!
//! Rebuilds are single-flight: after acquiring the write lock, a caller
//! re-checks the expected tag against the live store. A second caller that
//! queued behind an in-flight rebuild for the same tag finds it already
//! satisfied and returns without rebuilding.

use crate::error::{Result, WordbadgeError};
use crate::merge::ingest;
use crate::settings::EditionSelection;
use crate::source::{LoggingProgress, ResourceLoader, WordListSource};
use crate::store::{BuildOptions, MembershipStore};
use crate::types::{DictionaryEdition, FlagSource, StoreStats, VersionTag, WordFlags};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Where the store lives and which resources feed it.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Base directory for the store files
    pub data_dir: PathBuf,

    /// Wordle list resource name
    pub wordle: String,

    /// Common words list resource name
    pub common_bongo: String,

    /// Scrabble resource overrides; editions not listed use their default
    pub editions: HashMap<DictionaryEdition, String>,

    /// LZ4-compress the store file
    pub compress: bool,
}

impl StoreOptions {
    /// Options with default resource names
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StoreOptions {
            data_dir: data_dir.into(),
            wordle: "wordle.txt".to_string(),
            common_bongo: "common_bongo.txt".to_string(),
            editions: HashMap::new(),
            compress: true,
        }
    }

    /// Resource name backing the given scrabble edition
    pub fn scrabble_resource(&self, edition: DictionaryEdition) -> String {
        self.editions
            .get(&edition)
            .cloned()
            .unwrap_or_else(|| edition.default_resource())
    }

    /// The three configured sources for an edition, in ingestion order
    pub fn sources(&self, edition: DictionaryEdition) -> Vec<WordListSource> {
        vec![
            WordListSource::new(FlagSource::Wordle, self.wordle.clone()),
            WordListSource::new(FlagSource::Scrabble, self.scrabble_resource(edition)),
            WordListSource::new(FlagSource::CommonBongo, self.common_bongo.clone()),
        ]
    }

    fn build_options(&self) -> BuildOptions {
        BuildOptions {
            compress: self.compress,
        }
    }
}

/// Observable state of a [`StoreManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    /// No store has been opened or built yet
    Uninitialized,
    /// A store built with `tag` is serving lookups
    Ready { tag: VersionTag },
    /// A store for `target` is being built; lookups wait
    Rebuilding { target: VersionTag },
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreStatus::Uninitialized => write!(f, "uninitialized"),
            StoreStatus::Ready { tag } => write!(f, "ready ({})", tag),
            StoreStatus::Rebuilding { target } => write!(f, "rebuilding ({})", target),
        }
    }
}

/// Owns the live membership store and serializes access to it.
///
/// ## Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use wordbadge_core::{DirectoryLoader, SettingsFile, StoreManager, StoreOptions};
///
/// let manager = StoreManager::new(
///     StoreOptions::new("./data"),
///     Arc::new(DirectoryLoader::new("./lists")),
///     Arc::new(SettingsFile::new("./settings.json")),
/// );
/// manager.initialize()?;
///
/// let badges = manager.lookup_batch(["apple", "zebra"]);
/// ```
pub struct StoreManager {
    options: StoreOptions,
    loader: Arc<dyn ResourceLoader>,
    editions: Arc<dyn EditionSelection>,

    /// The live store; `None` until the first successful initialize
    store: RwLock<Option<MembershipStore>>,

    /// Status snapshot, readable without waiting on `store`
    status: Mutex<StoreStatus>,

    /// Number of physical rebuilds performed
    rebuilds: AtomicU64,
}

impl StoreManager {
    /// Create a manager. Nothing is read or written until [`initialize`](Self::initialize).
    pub fn new(
        options: StoreOptions,
        loader: Arc<dyn ResourceLoader>,
        editions: Arc<dyn EditionSelection>,
    ) -> Self {
        StoreManager {
            options,
            loader,
            editions,
            store: RwLock::new(None),
            status: Mutex::new(StoreStatus::Uninitialized),
            rebuilds: AtomicU64::new(0),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Tag a current store must carry, given the selected edition.
    pub fn expected_tag(&self) -> VersionTag {
        VersionTag::current(self.editions.selected_edition())
    }

    /// Current state. Never blocks on an in-flight rebuild.
    pub fn status(&self) -> StoreStatus {
        *self.status.lock()
    }

    /// Number of rebuilds this manager has performed.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::Acquire)
    }

    /// Statistics of the live store, if any.
    pub fn stats(&self) -> Option<StoreStats> {
        self.store.read().as_ref().map(|store| store.stats().clone())
    }

    /// Open the store, building it first if it is missing or stale.
    ///
    /// Idempotent: a no-op when already ready with the expected tag.
    #[instrument(skip(self))]
    pub fn initialize(&self) -> Result<()> {
        self.ensure_current("initialize").map(|_| ())
    }

    /// Rebuild if the schema version or selected edition changed.
    ///
    /// Call after the user changes the dictionary edition setting.
    #[instrument(skip(self))]
    pub fn rebuild_if_needed(&self) -> Result<()> {
        self.ensure_current("rebuild_if_needed").map(|_| ())
    }

    /// Bring the live store in line with the expected tag.
    ///
    /// Returns whether a rebuild happened.
    fn ensure_current(&self, operation: &'static str) -> Result<bool> {
        let expected = self.expected_tag();
        if self.is_current(&expected) {
            debug!(operation, tag = %expected, "Store already current");
            return Ok(false);
        }

        let mut live = self.store.write();

        // Re-check under the write lock: a rebuild that finished while we
        // waited may already have produced this tag.
        let expected = self.expected_tag();
        if live.as_ref().is_some_and(|store| *store.tag() == expected) {
            debug!(operation, tag = %expected, "Store became current while waiting");
            return Ok(false);
        }

        match MembershipStore::open(&self.options.data_dir, &expected) {
            Ok(store) => {
                *live = Some(store);
                self.set_status(StoreStatus::Ready { tag: expected });
                return Ok(false);
            }
            Err(e) if e.requires_rebuild() => {
                info!(operation, reason = %e, "Store needs rebuild");
            }
            Err(e) => {
                warn!(operation, error = %e, "Existing store unreadable, rebuilding");
            }
        }

        let previous = self.status();
        self.set_status(StoreStatus::Rebuilding { target: expected });

        let start = Instant::now();
        match self.rebuild(expected) {
            Ok(store) => {
                info!(
                    operation,
                    tag = %expected,
                    records = store.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Store rebuilt"
                );
                *live = Some(store);
                self.rebuilds.fetch_add(1, Ordering::AcqRel);
                self.set_status(StoreStatus::Ready { tag: expected });
                Ok(true)
            }
            Err(e) => {
                error!(operation, tag = %expected, error = %e, "Store rebuild failed");
                self.set_status(previous);
                Err(match e {
                    err @ WordbadgeError::StorageInit { .. } => err,
                    other => WordbadgeError::storage_init(&self.options.data_dir, other),
                })
            }
        }
    }

    fn is_current(&self, expected: &VersionTag) -> bool {
        self.store
            .read()
            .as_ref()
            .is_some_and(|store| store.tag() == expected)
    }

    /// Ingest all sources and build a new store. Caller holds the write lock.
    fn rebuild(&self, tag: VersionTag) -> Result<MembershipStore> {
        let sources = self.options.sources(tag.edition);
        let progress = LoggingProgress::new(tag.to_string());

        info!(
            tag = %tag,
            loader = self.loader.name(),
            data_dir = %self.options.data_dir.display(),
            "Rebuilding store"
        );
        let merged = ingest(&sources, self.loader.as_ref(), Some(&progress));

        MembershipStore::build(&self.options.data_dir, tag, merged, self.options.build_options())
    }

    fn set_status(&self, status: StoreStatus) {
        *self.status.lock() = status;
    }

    /// Flags for one word; all false if absent or not initialized.
    pub fn lookup_one(&self, word: &str) -> WordFlags {
        self.store
            .read()
            .as_ref()
            .map(|store| store.lookup_one(word))
            .unwrap_or_default()
    }

    /// Flags for a batch of words, or a lookup error if no store is live.
    pub fn try_lookup_batch<I, S>(&self, words: I) -> Result<HashMap<String, WordFlags>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match self.store.read().as_ref() {
            Some(store) => Ok(store.lookup_batch(words)),
            None => Err(WordbadgeError::Lookup {
                reason: "store not initialized".to_string(),
            }),
        }
    }

    /// Flags for a batch of words, keyed by normalized word.
    ///
    /// Never fails: words absent from the store, and every word when no
    /// store is live, are simply missing from the result.
    pub fn lookup_batch<I, S>(&self, words: I) -> HashMap<String, WordFlags>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.try_lookup_batch(words).unwrap_or_else(|e| {
            debug!(error = %e, "Batch lookup degraded to empty");
            HashMap::new()
        })
    }
}

impl fmt::Debug for StoreManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreManager")
            .field("status", &self.status())
            .field("rebuilds", &self.rebuild_count())
            .field("data_dir", &self.options.data_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::FixedEdition;
    use crate::source::{MemoryLoader, ResourceReader};
    use crate::types::SCHEMA_VERSION;
    use std::fs;
    use std::sync::atomic::AtomicBool;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Loader that can be told to stall inside a rebuild.
    struct SlowLoader {
        inner: MemoryLoader,
        delay: Mutex<Option<Duration>>,
        entered: AtomicBool,
    }

    impl SlowLoader {
        fn new(inner: MemoryLoader) -> Self {
            SlowLoader {
                inner,
                delay: Mutex::new(None),
                entered: AtomicBool::new(false),
            }
        }
    }

    impl ResourceLoader for SlowLoader {
        fn open(&self, resource: &str) -> anyhow::Result<Option<ResourceReader>> {
            self.entered.store(true, Ordering::SeqCst);
            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
            self.inner.open(resource)
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn scenario_loader() -> MemoryLoader {
        MemoryLoader::new()
            .with_words("wordle.txt", &["apple", "tree"])
            .with_words("scrabble_nwl2023.txt", &["apple", "zebra"])
            .with_words("scrabble_collins2019.txt", &["qi", "zebra"])
            .with_words("common_bongo.txt", &["tree"])
    }

    fn manager_with(
        dir: &TempDir,
        loader: Arc<dyn ResourceLoader>,
    ) -> (StoreManager, Arc<FixedEdition>) {
        let editions = Arc::new(FixedEdition::new(DictionaryEdition::Nwl2023));
        let manager = StoreManager::new(StoreOptions::new(dir.path()), loader, editions.clone());
        (manager, editions)
    }

    fn manager(dir: &TempDir) -> (StoreManager, Arc<FixedEdition>) {
        manager_with(dir, Arc::new(scenario_loader()))
    }

    #[test]
    fn test_uninitialized_lookups_are_empty() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, _) = manager(&temp_dir);

        assert_eq!(manager.status(), StoreStatus::Uninitialized);
        assert_eq!(manager.lookup_one("apple"), WordFlags::NONE);
        assert!(manager.lookup_batch(["apple"]).is_empty());
        assert!(matches!(
            manager.try_lookup_batch(["apple"]),
            Err(WordbadgeError::Lookup { .. })
        ));
        assert!(manager.stats().is_none());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, _) = manager(&temp_dir);

        manager.initialize().unwrap();
        assert_eq!(
            manager.status(),
            StoreStatus::Ready {
                tag: VersionTag::current(DictionaryEdition::Nwl2023)
            }
        );

        let result = manager.lookup_batch(["apple", "tree", "zebra", "dog"]);
        assert_eq!(result.len(), 3);
        assert_eq!(result["apple"], WordFlags::new(true, true, false));
        assert_eq!(result["tree"], WordFlags::new(true, false, true));
        assert_eq!(result["zebra"], WordFlags::new(false, true, false));
        assert!(!result.contains_key("dog"));

        assert_eq!(manager.lookup_one("Dog"), WordFlags::NONE);
        assert_eq!(manager.lookup_batch(["Apple"]), manager.lookup_batch(["apple"]));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, _) = manager(&temp_dir);

        manager.initialize().unwrap();
        manager.initialize().unwrap();
        assert_eq!(manager.rebuild_count(), 1);
    }

    #[test]
    fn test_initialize_reuses_store_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        {
            let (manager, _) = manager(&temp_dir);
            manager.initialize().unwrap();
            assert_eq!(manager.rebuild_count(), 1);
        }

        // A fresh process with no word lists at all still serves the old store
        let (manager, _) = manager_with(&temp_dir, Arc::new(MemoryLoader::new()));
        manager.initialize().unwrap();
        assert_eq!(manager.rebuild_count(), 0);
        assert_eq!(manager.lookup_one("zebra"), WordFlags::new(false, true, false));
    }

    #[test]
    fn test_rebuild_if_needed_twice_rebuilds_once() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, _) = manager(&temp_dir);

        manager.rebuild_if_needed().unwrap();
        manager.rebuild_if_needed().unwrap();
        assert_eq!(manager.rebuild_count(), 1);
    }

    #[test]
    fn test_edition_switch_rebuilds_once() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, editions) = manager(&temp_dir);

        manager.initialize().unwrap();
        assert!(manager.lookup_one("apple").is_scrabble);
        assert!(!manager.lookup_one("qi").is_scrabble);

        editions.select(DictionaryEdition::Collins2019);
        manager.rebuild_if_needed().unwrap();
        manager.rebuild_if_needed().unwrap();
        assert_eq!(manager.rebuild_count(), 2);

        assert_eq!(manager.lookup_one("apple"), WordFlags::new(true, false, false));
        assert_eq!(manager.lookup_one("qi"), WordFlags::new(false, true, false));
        assert_eq!(
            manager.status(),
            StoreStatus::Ready {
                tag: VersionTag::current(DictionaryEdition::Collins2019)
            }
        );
        assert_eq!(
            manager.stats().unwrap().tag,
            VersionTag::current(DictionaryEdition::Collins2019).to_string()
        );
    }

    #[test]
    fn test_missing_source_does_not_abort_rebuild() {
        let temp_dir = TempDir::new().unwrap();
        let loader = scenario_loader();
        loader.remove("common_bongo.txt");
        let (manager, _) = manager_with(&temp_dir, Arc::new(loader));

        manager.initialize().unwrap();
        assert_eq!(manager.lookup_one("tree"), WordFlags::new(true, false, false));
        assert_eq!(manager.lookup_one("apple"), WordFlags::new(true, true, false));
    }

    #[test]
    fn test_corrupted_store_is_rebuilt() {
        let temp_dir = TempDir::new().unwrap();
        {
            let (manager, _) = manager(&temp_dir);
            manager.initialize().unwrap();
        }

        let store_path = temp_dir.path().join("store").join("words.wbs");
        fs::write(&store_path, b"garbage").unwrap();

        let (manager, _) = manager(&temp_dir);
        manager.initialize().unwrap();
        assert_eq!(manager.rebuild_count(), 1);
        assert!(manager.lookup_one("zebra").is_scrabble);
    }

    #[test]
    fn test_missing_tag_forces_rebuild() {
        let temp_dir = TempDir::new().unwrap();
        {
            let (manager, _) = manager(&temp_dir);
            manager.initialize().unwrap();
        }

        fs::remove_file(temp_dir.path().join("store").join("version.tag")).unwrap();

        let (manager, _) = manager(&temp_dir);
        manager.initialize().unwrap();
        assert_eq!(manager.rebuild_count(), 1);
    }

    #[test]
    fn test_schema_version_change_forces_rebuild() {
        let temp_dir = TempDir::new().unwrap();
        {
            let (manager, _) = manager(&temp_dir);
            manager.initialize().unwrap();
        }

        let tag_path = temp_dir.path().join("store").join("version.tag");
        let current = VersionTag::current(DictionaryEdition::Nwl2023);
        let foreign = VersionTag {
            schema_version: SCHEMA_VERSION + 1,
            ..current
        };
        fs::write(&tag_path, foreign.to_string()).unwrap();

        let (manager, _) = manager(&temp_dir);
        manager.initialize().unwrap();
        assert_eq!(manager.rebuild_count(), 1);
        assert_eq!(manager.status(), StoreStatus::Ready { tag: current });
        assert_eq!(fs::read_to_string(&tag_path).unwrap(), current.to_string());
        assert_eq!(manager.lookup_one("apple"), WordFlags::new(true, true, false));
    }

    #[test]
    fn test_initialize_failure_is_storage_init() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();

        let editions = Arc::new(FixedEdition::new(DictionaryEdition::Nwl2023));
        let manager = StoreManager::new(
            StoreOptions::new(blocker.join("data")),
            Arc::new(scenario_loader()),
            editions,
        );

        let err = manager.initialize().unwrap_err();
        assert!(matches!(err, WordbadgeError::StorageInit { .. }));
        assert_eq!(manager.status(), StoreStatus::Uninitialized);
        assert!(manager.lookup_batch(["apple"]).is_empty());
        assert_eq!(manager.lookup_one("apple"), WordFlags::NONE);
        assert_eq!(manager.rebuild_count(), 0);
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_store() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, editions) = manager(&temp_dir);
        manager.initialize().unwrap();

        // A regular file where the staging directory goes makes the build fail
        fs::write(temp_dir.path().join("store.staging"), b"in the way").unwrap();

        editions.select(DictionaryEdition::Collins2019);
        let err = manager.rebuild_if_needed().unwrap_err();
        assert!(matches!(err, WordbadgeError::StorageInit { .. }));

        let old_tag = VersionTag::current(DictionaryEdition::Nwl2023);
        assert_eq!(manager.status(), StoreStatus::Ready { tag: old_tag });
        assert!(manager.lookup_one("apple").is_scrabble);
        assert_eq!(manager.rebuild_count(), 1);

        // Once the obstruction is gone, the next check retries
        fs::remove_file(temp_dir.path().join("store.staging")).unwrap();
        manager.rebuild_if_needed().unwrap();
        assert!(manager.lookup_one("qi").is_scrabble);
        assert_eq!(manager.rebuild_count(), 2);
    }

    #[test]
    fn test_concurrent_rebuilds_are_single_flight() {
        let temp_dir = TempDir::new().unwrap();
        let loader = Arc::new(SlowLoader::new(scenario_loader()));
        let (manager, editions) = manager_with(&temp_dir, loader.clone());
        manager.initialize().unwrap();

        editions.select(DictionaryEdition::Collins2019);
        *loader.delay.lock() = Some(Duration::from_millis(20));

        let manager = Arc::new(manager);
        let barrier = Arc::new(Barrier::new(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let manager = manager.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    manager.rebuild_if_needed()
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(manager.rebuild_count(), 2);
        assert!(manager.lookup_one("qi").is_scrabble);
    }

    #[test]
    fn test_lookups_block_during_rebuild() {
        let temp_dir = TempDir::new().unwrap();
        let loader = Arc::new(SlowLoader::new(scenario_loader()));
        let (manager, editions) = manager_with(&temp_dir, loader.clone());
        manager.initialize().unwrap();

        let query = ["apple", "qi", "tree", "zebra"];
        let old_view = manager.lookup_batch(query);

        editions.select(DictionaryEdition::Collins2019);
        loader.entered.store(false, Ordering::SeqCst);
        *loader.delay.lock() = Some(Duration::from_millis(30));

        let manager = Arc::new(manager);
        let rebuild = {
            let manager = manager.clone();
            thread::spawn(move || manager.rebuild_if_needed())
        };

        // Wait until the rebuild is inside ingestion, holding the write lock
        while !loader.entered.load(Ordering::SeqCst) {
            thread::yield_now();
        }

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                thread::spawn(move || manager.lookup_batch(query))
            })
            .collect();

        rebuild.join().unwrap().unwrap();
        let new_view = manager.lookup_batch(query);
        assert_ne!(old_view, new_view);

        for reader in readers {
            assert_eq!(reader.join().unwrap(), new_view);
        }
    }

    #[test]
    fn test_status_visible_during_rebuild() {
        let temp_dir = TempDir::new().unwrap();
        let loader = Arc::new(SlowLoader::new(scenario_loader()));
        let (manager, _) = manager_with(&temp_dir, loader.clone());
        *loader.delay.lock() = Some(Duration::from_millis(30));

        let manager = Arc::new(manager);
        let init = {
            let manager = manager.clone();
            thread::spawn(move || manager.initialize())
        };

        while !loader.entered.load(Ordering::SeqCst) {
            thread::yield_now();
        }
        assert_eq!(
            manager.status(),
            StoreStatus::Rebuilding {
                target: VersionTag::current(DictionaryEdition::Nwl2023)
            }
        );

        init.join().unwrap().unwrap();
        assert!(matches!(manager.status(), StoreStatus::Ready { .. }));
    }
}
