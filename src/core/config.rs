use crate::core::dico::{BackendSpec, DicoKind};
use crate::core::paths;
use crate::error::{DicoError, Result};
use crate::storage::{StoreOptions, DEFAULT_SHARD_COUNT};
use crate::storage::query::DEFAULT_FUZZINESS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DicoConfig {
    /// Directory holding one store directory per dictionary
    pub root_dir: Option<PathBuf>,
    /// Per-dictionary store directory overrides, keyed by dictionary name
    pub dicos: BTreeMap<String, PathBuf>,
    pub store: StoreConfig,
    pub shards: ShardConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Copy read-mode stores into RAM when opening them
    pub load_in_memory: bool,
    /// Entries added between two commits while indexing
    pub commit_threshold: usize,
    pub writer_heap_bytes: usize,
    /// Ceiling on parent-chain walks
    pub max_hops: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardConfig {
    pub shard_count: usize,
    /// Open and close shards on the rayon pool
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Similarity used when a search gives no fuzziness
    pub approximate_fuzziness: f32,
    pub max_terms: usize,
}

impl Default for DicoConfig {
    fn default() -> Self {
        Self {
            root_dir: None, // Will default to ~/.dicoterm/dicos
            dicos: BTreeMap::new(),
            store: StoreConfig::default(),
            shards: ShardConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        let options = StoreOptions::default();
        Self {
            load_in_memory: options.load_in_memory,
            commit_threshold: options.commit_threshold,
            writer_heap_bytes: options.writer_heap_bytes,
            max_hops: options.max_hops,
        }
    }
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            parallel: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            approximate_fuzziness: DEFAULT_FUZZINESS,
            max_terms: 10,
        }
    }
}

impl DicoConfig {
    /// Configuration rooted at `root_dir`
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: Some(root_dir.into()),
            ..Self::default()
        }
    }

    pub fn dicos_root(&self) -> PathBuf {
        self.root_dir.clone().unwrap_or_else(paths::dicos_dir)
    }

    /// Store directory of a dictionary
    pub fn dico_dir(&self, kind: DicoKind) -> PathBuf {
        self.dicos
            .get(kind.name())
            .cloned()
            .unwrap_or_else(|| self.dicos_root().join(kind.name()))
    }

    /// Directory of one backend of a dictionary
    pub fn backend_dir(&self, kind: DicoKind, spec: &BackendSpec) -> PathBuf {
        let dir = self.dico_dir(kind);
        match spec.subdir {
            Some(subdir) => dir.join(subdir),
            None => dir,
        }
    }

    /// Store options for a dictionary
    pub fn store_options(&self, kind: DicoKind) -> StoreOptions {
        StoreOptions {
            load_in_memory: self.store.load_in_memory,
            commit_threshold: self.store.commit_threshold,
            writer_heap_bytes: self.store.writer_heap_bytes,
            max_hops: self.store.max_hops,
            name_prefix: kind.name_prefix().to_string(),
            redirect_prefix: kind.redirect_prefix().to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.commit_threshold == 0 {
            return Err(DicoError::Config("commit_threshold must be positive".to_string()));
        }
        if self.store.max_hops == 0 {
            return Err(DicoError::Config("max_hops must be positive".to_string()));
        }
        if self.shards.shard_count == 0 || self.shards.shard_count > 99 {
            return Err(DicoError::Config(format!(
                "shard_count must be within 1..=99, got {}",
                self.shards.shard_count
            )));
        }
        if !(0.0..=1.0).contains(&self.search.approximate_fuzziness) {
            return Err(DicoError::Config(format!(
                "approximate_fuzziness must be within [0, 1], got {}",
                self.search.approximate_fuzziness
            )));
        }
        for name in self.dicos.keys() {
            name.parse::<DicoKind>()
                .map_err(|_| DicoError::Config(format!("unknown dictionary '{}' in [dicos]", name)))?;
        }
        Ok(())
    }
}

pub fn default_config() -> DicoConfig {
    DicoConfig::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DicoConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: DicoConfig = toml::from_str(&contents)
        .map_err(|e| DicoError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &DicoConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| DicoError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}
