use crate::cli::output::{format_number, print_success, print_warning};
use crate::core::config::DicoConfig;
use crate::core::dico::{BackendRole, DicoKind};
use crate::processing::{self, LoadStats};
use crate::storage::{ShardedStore, StoreMode, TaxonPrefixShardKey, TermStore};
use crate::utils::progress::{create_spinner, ShardProgressBar};
use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub command: IndexCommand,
}

#[derive(Subcommand)]
pub enum IndexCommand {
    /// Load `id<TAB>text` lines into a dictionary
    Tsv {
        /// Dictionary to build
        #[arg(value_enum)]
        kind: DicoKind,
        /// Input file
        file: PathBuf,
    },

    /// Load an NCBI taxdump directory (names.dmp, nodes.dmp, merged.dmp)
    Taxonomy {
        /// Directory holding the .dmp files
        dir: PathBuf,
    },

    /// Build the Gene Ontology graph from an OBO file
    Go {
        /// go-basic.obo or go.obo
        file: PathBuf,
    },

    /// Load EggNog cross references into the sharded store
    Eggnog {
        /// `protein<TAB>record` lines; protein ids start with a taxon code
        file: PathBuf,
        /// Optional `id<TAB>description` lines for the description store
        #[arg(long, value_name = "FILE")]
        descriptions: Option<PathBuf>,
    },
}

pub fn run(args: IndexArgs, config: DicoConfig) -> anyhow::Result<()> {
    match args.command {
        IndexCommand::Tsv { kind, file } => {
            let stats = index_single(&config, kind, &file, |path, store| {
                processing::load_tsv_file(path, store)
            })?;
            report(kind, stats);
        }
        IndexCommand::Taxonomy { dir } => {
            let stats = index_single(&config, DicoKind::NcbiTaxonomy, &dir, |path, store| {
                processing::load_taxdump(path, store)
            })?;
            report(DicoKind::NcbiTaxonomy, stats);
        }
        IndexCommand::Go { file } => {
            let stats = index_single(&config, DicoKind::GeneOntology, &file, |path, store| {
                processing::load_obo_file(path, store)
            })?;
            report(DicoKind::GeneOntology, stats);
        }
        IndexCommand::Eggnog { file, descriptions } => {
            if let Some(descriptions) = descriptions {
                let stats = index_single(&config, DicoKind::EggNog, &descriptions, |path, store| {
                    processing::load_tsv_file(path, store)
                })?;
                report(DicoKind::EggNog, stats);
            }
            let stats = index_xrefs(&config, &file)?;
            report(DicoKind::EggNog, stats);
        }
    }
    Ok(())
}

fn index_single<F>(config: &DicoConfig, kind: DicoKind, input: &Path, load: F) -> anyhow::Result<LoadStats>
where
    F: FnOnce(&Path, &mut TermStore) -> crate::Result<LoadStats>,
{
    let spec = kind
        .backend(BackendRole::Terms)
        .with_context(|| format!("{} has no term store", kind))?;
    let dir = config.backend_dir(kind, spec);

    let spinner = create_spinner(&format!("Indexing {} into {}", input.display(), dir.display()));
    let mut store = TermStore::open(&dir, StoreMode::Write, config.store_options(kind))
        .with_context(|| format!("Failed to create store at {}", dir.display()))?;

    let stats = load(input, &mut store)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    spinner.set_message(format!("Compacting {}", dir.display()));
    store.close()?;
    spinner.finish_and_clear();
    Ok(stats)
}

fn index_xrefs(config: &DicoConfig, input: &Path) -> anyhow::Result<LoadStats> {
    let kind = DicoKind::EggNog;
    let spec = kind
        .backend(BackendRole::CrossReferences)
        .with_context(|| format!("{} has no cross-reference store", kind))?;
    let dir = config.backend_dir(kind, spec);
    let shard_count = config.shards.shard_count;

    let opening = ShardProgressBar::new(shard_count, "Opening shards");
    let mut store = ShardedStore::open_with_monitor(
        &dir,
        StoreMode::Write,
        config.store_options(kind),
        TaxonPrefixShardKey::new(shard_count),
        config.shards.parallel,
        &opening,
    )?;
    opening.finish("Shards ready");

    let spinner = create_spinner(&format!("Indexing {}", input.display()));
    let stats = processing::load_tsv_file(input, &mut store)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    spinner.finish_and_clear();

    let closing = ShardProgressBar::new(shard_count, "Compacting shards");
    store.close(&closing)?;
    closing.finish("Shards compacted");
    Ok(stats)
}

fn report(kind: DicoKind, stats: LoadStats) {
    print_success(&format!(
        "Indexed {} {} entries",
        format_number(stats.emitted),
        kind
    ));
    if stats.skipped > 0 {
        print_warning(&format!(
            "{} malformed records skipped",
            format_number(stats.skipped)
        ));
    }
}
