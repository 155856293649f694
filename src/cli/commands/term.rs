use crate::cli::output::print_warning;
use crate::core::config::DicoConfig;
use crate::core::dico::DicoKind;
use crate::core::query_system;
use clap::Args;
use colored::*;

#[derive(Args)]
pub struct TermArgs {
    /// Dictionary to query
    #[arg(value_enum)]
    pub kind: DicoKind,

    /// Term id (or label with --reverse)
    pub id: String,

    /// Look the id up from an exact label
    #[arg(long)]
    pub reverse: bool,
}

pub fn run(args: TermArgs, config: DicoConfig) -> anyhow::Result<()> {
    let system = query_system::open(config)?;
    if !system.has_dico_available(args.kind) {
        print_warning(&format!("{} is not indexed", args.kind));
        return Ok(());
    }

    if args.reverse {
        match system.get_id(args.kind, &args.id)? {
            Some(id) => println!("{}\t{}", id.bold(), args.id),
            None => print_warning(&format!("No {} term labelled '{}'", args.kind, args.id)),
        }
        return Ok(());
    }

    match system.get_term(args.kind, &args.id)? {
        Some(term) => println!("{}\t{}", args.id.bold(), term.data_field),
        None => print_warning(&format!("No {} term '{}'", args.kind, args.id)),
    }
    Ok(())
}
