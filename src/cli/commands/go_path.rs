use crate::cli::output::print_warning;
use crate::core::config::DicoConfig;
use crate::core::query_system;
use clap::Args;

#[derive(Args)]
pub struct GoPathArgs {
    /// GO id, e.g. GO:0006915
    pub id: String,

    /// Print ids only
    #[arg(long)]
    pub ids: bool,
}

pub fn run(args: GoPathArgs, config: DicoConfig) -> anyhow::Result<()> {
    let system = query_system::open(config)?;
    let paths = if args.ids {
        system.get_go_path_id(&args.id)?
    } else {
        system.get_go_path(&args.id)?
    };

    match paths {
        Some(paths) => {
            for path in paths {
                println!("{}", path);
            }
        }
        None => print_warning(&format!("No GO term {}", args.id)),
    }
    Ok(())
}
