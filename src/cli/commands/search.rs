use crate::cli::output::{print_table, print_warning};
use crate::core::config::DicoConfig;
use crate::core::dico::DicoKind;
use crate::core::query_system;
use clap::Args;
use serde_json::json;

#[derive(Args)]
pub struct SearchArgs {
    /// Name to look for; a leading or trailing `*` is a wildcard
    pub text: String,

    /// Dictionary to search
    #[arg(long, value_enum, default_value = "taxonomy")]
    pub kind: DicoKind,

    /// Similarity in [0, 1] for fuzzy matching
    #[arg(long)]
    pub fuzziness: Option<String>,

    /// Maximum number of results
    #[arg(long)]
    pub max: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SearchArgs, config: DicoConfig) -> anyhow::Result<()> {
    let max = args.max.unwrap_or(config.search.max_terms);
    let system = query_system::open(config)?;

    let hits = system.get_approximate_terms(args.kind, &args.text, args.fuzziness.as_deref(), max)?;

    if args.json {
        let results: Vec<_> = hits
            .iter()
            .map(|(term, score)| {
                json!({
                    "id": args.kind.decode_id(&term.id),
                    "name": term.data_field,
                    "score": score,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if hits.is_empty() {
        print_warning(&format!("No {} names match '{}'", args.kind, args.text));
        return Ok(());
    }

    let rows = hits
        .into_iter()
        .map(|(term, score)| {
            vec![
                args.kind.decode_id(&term.id).to_string(),
                term.data_field,
                format!("{:.3}", score),
            ]
        })
        .collect();
    print_table(&["Id", "Name", "Score"], rows);
    Ok(())
}
