use crate::cli::output::print_warning;
use crate::core::config::DicoConfig;
use crate::core::query_system;
use clap::Args;

#[derive(Args)]
pub struct EnzymePathArgs {
    /// EC number, e.g. 1.1.1.1 or 3.4.-.-
    pub id: String,
}

pub fn run(args: EnzymePathArgs, config: DicoConfig) -> anyhow::Result<()> {
    let system = query_system::open(config)?;
    match system.get_enzyme_path(&args.id)? {
        Some(path) => println!("{}", path.render()),
        None => print_warning(&format!("No enzyme class found for {}", args.id)),
    }
    Ok(())
}
