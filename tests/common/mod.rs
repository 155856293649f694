#![allow(dead_code)]

/// Common test utilities for dicoterm integration tests
///
/// Builds small dictionaries on disk under a temporary root so tests can open
/// them through the same paths the query system uses.
use dicoterm::core::dico::{BackendRole, DicoKind};
use dicoterm::processing::{self, TermSink};
use dicoterm::storage::{StoreMode, TermStore};
use dicoterm::DicoConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment that owns a temporary dictionary root
pub struct TestEnvironment {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub config: DicoConfig,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("dicos");
        fs::create_dir_all(&root).expect("Failed to create dictionary root");

        let mut config = DicoConfig::with_root(&root);
        config.shards.shard_count = 3;
        config.store.writer_heap_bytes = 15_000_000;

        TestEnvironment {
            _temp_dir: temp_dir,
            root,
            config,
        }
    }

    /// Get a path within the test environment
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Open the term store of `kind` for writing, run `fill`, then close it
    pub fn build<F>(&self, kind: DicoKind, fill: F)
    where
        F: FnOnce(&mut dyn TermSink),
    {
        let spec = kind.backend(BackendRole::Terms).unwrap();
        let dir = self.config.backend_dir(kind, spec);
        let mut store =
            TermStore::open(&dir, StoreMode::Write, self.config.store_options(kind)).unwrap();
        fill(&mut store);
        store.close().unwrap();
    }

    /// Write `(id, text)` entries into the term store of `kind`
    pub fn build_entries(&self, kind: DicoKind, entries: &[(&str, &str)]) {
        self.build(kind, |sink| {
            for (id, text) in entries {
                sink.emit(id, text).unwrap();
            }
        });
    }

    /// Write a taxdump directory from `(taxid, parent, rank, name)` rows and
    /// `(old, new)` merges, then index it
    pub fn build_taxonomy(&self, nodes: &[(&str, &str, &str, &str)], merged: &[(&str, &str)]) {
        let dump = self.root.join("taxdump");
        fs::create_dir_all(&dump).unwrap();

        let names: String = nodes
            .iter()
            .map(|(id, _, _, name)| format!("{}\t|\t{}\t|\t\t|\tscientific name\t|\n", id, name))
            .collect();
        let tree: String = nodes
            .iter()
            .map(|(id, parent, rank, _)| format!("{}\t|\t{}\t|\t{}\t|\t\t|\n", id, parent, rank))
            .collect();
        let merges: String = merged
            .iter()
            .map(|(old, new)| format!("{}\t|\t{}\t|\n", old, new))
            .collect();

        fs::write(dump.join("names.dmp"), names).unwrap();
        fs::write(dump.join("nodes.dmp"), tree).unwrap();
        fs::write(dump.join("merged.dmp"), merges).unwrap();

        self.build(DicoKind::NcbiTaxonomy, |sink| {
            processing::load_taxdump(&dump, sink).unwrap();
        });
    }

    /// Index an OBO document into the GO store
    pub fn build_go(&self, obo: &str) {
        self.build(DicoKind::GeneOntology, |sink| {
            processing::load_obo(obo.as_bytes(), sink).unwrap();
        });
    }
}

/// Write a single term store at `dir`
pub fn write_store(dir: &Path, entries: &[(&str, &str)]) {
    let mut store = TermStore::open(dir, StoreMode::Write, Default::default()).unwrap();
    for (id, text) in entries {
        store.add_entry(id, text).unwrap();
    }
    store.close().unwrap();
}
