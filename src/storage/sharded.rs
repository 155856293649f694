/// Sharded term store
///
/// Partitions one logical dictionary into N independent term stores laid out
/// as `<root>/1.ldx` … `<root>/N.ldx`. Routing is a pure function of the id,
/// so an entry is always written to and read from the same shard.
use crate::error::{DicoError, Result};
use crate::storage::term_store::{StoreMode, StoreOptions, Term, TermStore};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Shard count used for the EggNog cross-reference index
pub const DEFAULT_SHARD_COUNT: usize = 99;

/// Routes an id to a 1-based shard number
pub trait ShardKey: Send + Sync {
    fn shard_count(&self) -> usize;

    /// Shard owning `id`, in `1..=shard_count()`
    fn shard_of(&self, id: &str) -> Result<usize>;
}

/// Shards by the two leading digits of the id, which must be a numeric taxon code
#[derive(Debug, Clone, Copy)]
pub struct TaxonPrefixShardKey {
    shard_count: usize,
}

impl TaxonPrefixShardKey {
    pub fn new(shard_count: usize) -> Self {
        Self {
            shard_count: shard_count.max(1),
        }
    }
}

impl Default for TaxonPrefixShardKey {
    fn default() -> Self {
        Self::new(DEFAULT_SHARD_COUNT)
    }
}

impl ShardKey for TaxonPrefixShardKey {
    fn shard_count(&self) -> usize {
        self.shard_count
    }

    fn shard_of(&self, id: &str) -> Result<usize> {
        let prefix = id.as_bytes().get(..2).ok_or_else(|| {
            DicoError::InvalidShardKey(format!("'{}' is shorter than a 2-digit taxon code", id))
        })?;
        if !prefix.iter().all(u8::is_ascii_digit) {
            return Err(DicoError::InvalidShardKey(format!(
                "'{}' does not start with a 2-digit taxon code",
                id
            )));
        }

        let code = usize::from(prefix[0] - b'0') * 10 + usize::from(prefix[1] - b'0');
        if code == 0 {
            return Err(DicoError::InvalidShardKey(format!(
                "'{}' starts with taxon code 00",
                id
            )));
        }
        Ok((code - 1) % self.shard_count + 1)
    }
}

/// Progress of a fan-out operation over shards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardProgress {
    /// Shard that just finished (1-based)
    pub shard: usize,
    /// Shards finished so far
    pub completed: usize,
    pub total: usize,
}

/// Observer for long-running bulk shard operations; shared across worker threads
pub trait ShardMonitor: Sync {
    /// Polled before each shard is processed
    fn should_abort(&self) -> bool {
        false
    }

    fn shard_done(&self, _progress: ShardProgress) {}
}

/// Monitor that never aborts and reports nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMonitor;

impl ShardMonitor for NoopMonitor {}

pub struct ShardedStore {
    root: PathBuf,
    mode: StoreMode,
    key: Box<dyn ShardKey>,
    shards: Vec<TermStore>,
    parallel: bool,
}

impl std::fmt::Debug for ShardedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedStore")
            .field("root", &self.root)
            .field("mode", &self.mode)
            .field("shards", &self.shards.len())
            .field("parallel", &self.parallel)
            .finish()
    }
}

/// Directory of shard `n` under `root`
pub fn shard_dir(root: &Path, n: usize) -> PathBuf {
    root.join(format!("{}.ldx", n))
}

/// Shard numbers present on disk under `root`, ascending
pub fn shards_on_disk(root: &Path) -> Result<Vec<usize>> {
    let mut shards = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let number = name
            .to_str()
            .and_then(|name| name.strip_suffix(".ldx"))
            .and_then(|n| n.parse::<usize>().ok());
        if let Some(n) = number {
            shards.push(n);
        }
    }
    shards.sort_unstable();
    Ok(shards)
}

impl ShardedStore {
    /// Open every shard under `root`
    pub fn open(
        root: impl AsRef<Path>,
        mode: StoreMode,
        options: StoreOptions,
        key: impl ShardKey + 'static,
        parallel: bool,
    ) -> Result<Self> {
        Self::open_with_monitor(root, mode, options, key, parallel, &NoopMonitor)
    }

    pub fn open_with_monitor(
        root: impl AsRef<Path>,
        mode: StoreMode,
        options: StoreOptions,
        key: impl ShardKey + 'static,
        parallel: bool,
        monitor: &dyn ShardMonitor,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let total = key.shard_count();

        if mode == StoreMode::Read && !root.is_dir() {
            return Err(DicoError::NotFound(format!(
                "sharded store {}",
                root.display()
            )));
        }
        std::fs::create_dir_all(&root)?;

        let existing = shards_on_disk(&root)?;
        match mode {
            StoreMode::Read => {
                let expected: Vec<usize> = (1..=total).collect();
                if existing != expected {
                    return Err(DicoError::Config(format!(
                        "sharded store {} holds {} shards on disk, configured for {}",
                        root.display(),
                        existing.len(),
                        total
                    )));
                }
            }
            StoreMode::Write => {
                for n in existing.into_iter().filter(|n| *n > total) {
                    debug!("Removing stale shard {} from {}", n, root.display());
                    std::fs::remove_dir_all(shard_dir(&root, n))?;
                }
            }
        }

        let completed = AtomicUsize::new(0);
        let open_shard = |n: usize| -> Result<TermStore> {
            if monitor.should_abort() {
                return Err(DicoError::Aborted);
            }
            let store = TermStore::open(shard_dir(&root, n), mode, options.clone())?;
            monitor.shard_done(ShardProgress {
                shard: n,
                completed: completed.fetch_add(1, Ordering::SeqCst) + 1,
                total,
            });
            Ok(store)
        };

        let shards = if parallel {
            (1..=total).into_par_iter().map(open_shard).collect::<Result<Vec<_>>>()?
        } else {
            (1..=total).map(open_shard).collect::<Result<Vec<_>>>()?
        };

        info!(
            "Opened sharded store {} ({} shards, {:?})",
            root.display(),
            total,
            mode
        );

        Ok(Self {
            root,
            mode,
            key: Box::new(key),
            shards,
            parallel,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard number owning `id`
    pub fn shard_of(&self, id: &str) -> Result<usize> {
        self.key.shard_of(id)
    }

    fn shard(&self, id: &str) -> Result<&TermStore> {
        let n = self.key.shard_of(id)?;
        self.shards.get(n - 1).ok_or(DicoError::NotInitialized)
    }

    fn shard_mut(&mut self, id: &str) -> Result<&mut TermStore> {
        let n = self.key.shard_of(id)?;
        self.shards.get_mut(n - 1).ok_or(DicoError::NotInitialized)
    }

    pub fn add(&mut self, id: &str, value: &str) -> Result<()> {
        self.shard_mut(id)?.add_entry(id, value)
    }

    /// All entries for `id`, using a doubling result window starting at `expected_approx_count`
    pub fn get_by_id(&self, id: &str, expected_approx_count: usize) -> Result<Vec<Term>> {
        self.shard(id)?.get_by_id(id, expected_approx_count)
    }

    /// Total number of entries across shards
    pub fn size(&self) -> Result<u64> {
        self.shards
            .iter()
            .map(|shard| shard.size())
            .sum::<Result<u64>>()
    }

    /// Number of entries in the shard owning `id`
    pub fn size_of(&self, id: &str) -> Result<u64> {
        self.shard(id)?.size()
    }

    /// Close every shard, reporting per-shard progress. Idempotent.
    pub fn close(&mut self, monitor: &dyn ShardMonitor) -> Result<()> {
        let total = self.shards.len();
        let completed = AtomicUsize::new(0);

        let close_shard = |(i, shard): (usize, &mut TermStore)| -> Result<()> {
            if monitor.should_abort() {
                return Err(DicoError::Aborted);
            }
            shard.close()?;
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            debug!("Closed shard {} ({}/{})", i + 1, done, total);
            monitor.shard_done(ShardProgress {
                shard: i + 1,
                completed: done,
                total,
            });
            Ok(())
        };

        if self.parallel {
            self.shards
                .par_iter_mut()
                .enumerate()
                .try_for_each(close_shard)?;
        } else {
            self.shards.iter_mut().enumerate().try_for_each(close_shard)?;
        }

        info!("Closed sharded store {}", self.root.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_taxon_prefix_shard_key() {
        let key = TaxonPrefixShardKey::default();
        assert_eq!(key.shard_of("9606.ENSP00000269305").unwrap(), 96);
        assert_eq!(key.shard_of("10090.ENSMUSP01").unwrap(), 10);
        assert_eq!(key.shard_of("99").unwrap(), 99);
        assert_eq!(key.shard_of("01abc").unwrap(), 1);

        assert!(matches!(key.shard_of("7"), Err(DicoError::InvalidShardKey(_))));
        assert!(matches!(key.shard_of("7.P1"), Err(DicoError::InvalidShardKey(_))));
        assert!(matches!(key.shard_of("AB123"), Err(DicoError::InvalidShardKey(_))));
        assert!(matches!(key.shard_of("00123"), Err(DicoError::InvalidShardKey(_))));
    }

    #[test]
    fn test_shard_dir_layout() {
        let root = Path::new("/data/eggnog");
        assert_eq!(shard_dir(root, 1), PathBuf::from("/data/eggnog/1.ldx"));
        assert_eq!(shard_dir(root, 99), PathBuf::from("/data/eggnog/99.ldx"));
    }

    #[test]
    fn test_shards_on_disk_ignores_other_entries() {
        let temp = tempfile::TempDir::new().unwrap();
        for n in [3, 1, 12] {
            std::fs::create_dir(shard_dir(temp.path(), n)).unwrap();
        }
        std::fs::create_dir(temp.path().join("tmp.ldx")).unwrap();
        std::fs::write(temp.path().join("2.ldx"), b"not a shard").unwrap();

        assert_eq!(shards_on_disk(temp.path()).unwrap(), vec![1, 3, 12]);
    }

    proptest! {
        #[test]
        fn prop_shard_of_is_pure_and_in_range(code in 1u32..100, suffix in "[A-Za-z0-9._]{0,12}", count in 1usize..120) {
            let id = format!("{:02}{}", code, suffix);
            let key = TaxonPrefixShardKey::new(count);
            let first = key.shard_of(&id).unwrap();
            let second = key.shard_of(&id).unwrap();
            prop_assert_eq!(first, second);
            prop_assert!(first >= 1 && first <= count);
        }
    }
}
