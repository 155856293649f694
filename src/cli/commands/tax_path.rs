use crate::bio::taxonomy::TaxPathOptions;
use crate::cli::output::{print_table, print_warning};
use crate::core::config::DicoConfig;
use crate::core::query_system;
use clap::Args;

#[derive(Args)]
pub struct TaxPathArgs {
    /// NCBI taxon id
    pub taxid: String,

    /// Fold rank synonyms onto the nine canonical ranks
    #[arg(long)]
    pub simplified: bool,

    /// Leave the queried organism out of the lineage
    #[arg(long)]
    pub no_organism: bool,

    /// Emit all nine ranks, with "unknown" for missing ones
    #[arg(long)]
    pub tag_missing: bool,

    /// Show ranks, names and taxon ids as a table
    #[arg(long)]
    pub table: bool,
}

pub fn run(args: TaxPathArgs, config: DicoConfig) -> anyhow::Result<()> {
    let system = query_system::open(config)?;
    let options = TaxPathOptions {
        simplified: args.simplified,
        include_organism: !args.no_organism,
        tag_missing_rank: args.tag_missing,
    };

    let Some(path) = system.get_tax_path(&args.taxid, options)? else {
        print_warning(&format!("No lineage for taxon {}", args.taxid));
        return Ok(());
    };

    if args.table {
        let rows = path
            .ranked
            .iter()
            .map(|entry| {
                vec![
                    entry.rank.to_string(),
                    entry.label().to_string(),
                    entry
                        .node
                        .as_ref()
                        .map(|node| node.taxon_id.clone())
                        .unwrap_or_default(),
                ]
            })
            .collect();
        print_table(&["Rank", "Name", "Taxon"], rows);
    } else {
        println!("{}", path.render());
    }

    if !path.dropped.is_empty() {
        let dropped: Vec<String> = path
            .dropped
            .iter()
            .map(|node| format!("{} ({})", node.name, node.rank_name))
            .collect();
        print_warning(&format!("No rank assigned to: {}", dropped.join(", ")));
    }
    Ok(())
}
