use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tcc",
    about = "Ticket search criteria compiler",
    version = "0.1.0",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log lookups and ignored keys
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// YAML or JSON fixture with the records ids are resolved against
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    pub today: Option<String>,

    /// Pick which subcommand to use
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a criteria object into filter clauses
    Compile(CompileArgs),
    /// Validate a search request and print its plan
    Search(SearchArgs),
    /// Validate a statistics report window
    Report(InputArgs),
    /// List the criteria keys the compiler understands
    Keys,
}

#[derive(Args)]
pub struct InputArgs {
    /// Inline JSON, a path to a JSON file, or "-" for stdin
    pub input: String,
}

#[derive(Args)]
pub struct CompileArgs {
    /// Inline JSON, a path to a JSON file, or "-" for stdin
    pub input: String,

    /// Report every invalid key instead of stopping at the first
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Inline JSON, a path to a JSON file, or "-" for stdin
    pub input: String,

    /// Prepend a preset filter; organization and department read org_id / dept_id
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PresetArg {
    HaveOrg,
    Organization,
    Department,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
