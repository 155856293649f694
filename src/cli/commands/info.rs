use crate::cli::output::{format_number, print_section, print_stats_table, print_warning};
use crate::core::config::DicoConfig;
use crate::core::paths;
use crate::core::query_system;
use clap::Args;

#[derive(Args)]
pub struct InfoArgs {
    /// Also print the resolved configuration as TOML
    #[arg(long)]
    pub show_config: bool,
}

pub fn run(args: InfoArgs, config: DicoConfig) -> anyhow::Result<()> {
    print_section("Locations");
    println!("{}", paths::describe_paths());
    println!("  Root in use: {}", config.dicos_root().display());

    if args.show_config {
        print_section("Configuration");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    let system = query_system::open(config)?;
    let sizes = system.sizes()?;
    if sizes.is_empty() {
        print_warning("No dictionary is indexed yet");
        return Ok(());
    }

    let rows = sizes
        .into_iter()
        .map(|(kind, reader, size)| (format!("{} ({})", kind, reader), format_number(size)))
        .collect();
    print_stats_table("Dictionaries", rows);
    Ok(())
}
