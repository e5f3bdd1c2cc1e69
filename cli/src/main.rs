mod argparse;
mod utils;

use argparse::{parse_args, Commands, PresetArg};
use criteria_cli::{commands, load_store, parse_today, read_json_input, CliError, PresetKind};
use std::sync::Arc;
use ticket_criteria::CriteriaCompiler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_args();
    utils::init_logger(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
    Ok(())
}

async fn run(cli: argparse::Cli) -> Result<(), CliError> {
    let store = load_store(cli.store.as_deref())?;
    let mut compiler = CriteriaCompiler::new(Arc::new(store));
    if let Some(today) = &cli.today {
        compiler = compiler.with_fixed_now(parse_today(today)?);
    }

    let output = match cli.command {
        Commands::Compile(args) => {
            let input = read_json_input(&args.input)?;
            commands::compile(&compiler, &input, args.all).await?
        }
        Commands::Search(args) => {
            let input = read_json_input(&args.input)?;
            let preset = args.preset.map(|p| match p {
                PresetArg::HaveOrg => PresetKind::HaveOrg,
                PresetArg::Organization => PresetKind::Organization,
                PresetArg::Department => PresetKind::Department,
            });
            commands::search(&compiler, &input, preset).await?
        }
        Commands::Report(args) => {
            let input = read_json_input(&args.input)?;
            commands::report(&compiler, &input)?
        }
        Commands::Keys => commands::keys(),
    };

    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::Output(anyhow::Error::new(e)))?;
    println!("{}", rendered);
    Ok(())
}
