pub mod commands;
pub mod output;

use crate::core::config::{load_config, DicoConfig};
use crate::core::paths;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "dicoterm",
    version,
    about = "Index and query biological reference dictionaries",
    long_about = "Dicoterm indexes reference vocabularies (NCBI Taxonomy, Gene Ontology, Enzyme, \
                  InterPro, Pfam, CDD, EggNog) into term stores and resolves ids into names, \
                  taxonomic lineages, GO paths and enzyme class paths."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of threads to use (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,

    /// Configuration file (defaults to $DICOTERM_HOME/config.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Dictionary root directory, overriding the configuration
    #[arg(long, global = true, value_name = "DIR", env = "DICOTERM_ROOT")]
    pub root: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build dictionary stores from flat files
    Index(commands::index::IndexArgs),

    /// Look up one term by id
    Term(commands::term::TermArgs),

    /// Resolve the lineage of a taxon
    TaxPath(commands::tax_path::TaxPathArgs),

    /// Enumerate the GO paths of a term
    GoPath(commands::go_path::GoPathArgs),

    /// Resolve the class hierarchy of an EC number
    EnzymePath(commands::enzyme_path::EnzymePathArgs),

    /// Fuzzy name search
    Search(commands::search::SearchArgs),

    /// Show configured dictionaries and their sizes
    Info(commands::info::InfoArgs),
}

/// Resolve the effective configuration from the global options
pub fn resolve_config(config: Option<&Path>, root: Option<&Path>) -> anyhow::Result<DicoConfig> {
    let mut resolved = match config {
        Some(path) => load_config(path)?,
        None => {
            let default_path = paths::config_path();
            if default_path.is_file() {
                load_config(default_path)?
            } else {
                DicoConfig::default()
            }
        }
    };
    if let Some(root) = root {
        resolved.root_dir = Some(root.to_path_buf());
    }
    Ok(resolved)
}
