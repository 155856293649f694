/// Producer-side contract between flat-file loaders and dictionary stores
use crate::bio::ontology::GoTerm;
use crate::error::{DicoError, Result};
use crate::storage::{ShardedStore, TermStore};

/// Destination for parsed dictionary entries
pub trait TermSink {
    /// Store a text entry
    fn emit(&mut self, id: &str, text: &str) -> Result<()>;

    /// Store a GO term as a binary entry
    fn emit_binary(&mut self, id: &str, term: &GoTerm) -> Result<()>;
}

impl TermSink for TermStore {
    fn emit(&mut self, id: &str, text: &str) -> Result<()> {
        self.add_entry(id, text)
    }

    fn emit_binary(&mut self, id: &str, term: &GoTerm) -> Result<()> {
        self.add_binary_entry(id, term)
    }
}

impl TermSink for ShardedStore {
    fn emit(&mut self, id: &str, text: &str) -> Result<()> {
        self.add(id, text)
    }

    fn emit_binary(&mut self, id: &str, _term: &GoTerm) -> Result<()> {
        Err(DicoError::Config(format!(
            "sharded store {} only holds text entries (got binary entry {})",
            self.root().display(),
            id
        )))
    }
}

/// Counts reported by a loader
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub emitted: u64,
    /// Malformed records that were logged and skipped
    pub skipped: u64,
}

impl LoadStats {
    pub fn merge(&mut self, other: LoadStats) {
        self.emitted += other.emitted;
        self.skipped += other.skipped;
    }
}
