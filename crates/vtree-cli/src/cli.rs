use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vtree",
    about = "Variant tree reconciliation: diff snapshots and build save payloads",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Payload configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the changes between the edited and the server tree
    Diff(DiffArgs),
    /// Build the save payload for a snapshot
    Prepare(PrepareArgs),
    /// List the parts of an encoded multipart body
    Inspect(InspectArgs),
    /// Print the effective payload configuration
    Config,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Snapshot file with `current` and `initial` trees
    pub snapshot: PathBuf,
}

#[derive(Args)]
pub struct PrepareArgs {
    pub snapshot: PathBuf,
    #[arg(long)]
    pub product_id: String,
    /// Write the encoded multipart body here
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct InspectArgs {
    pub body: PathBuf,
    /// Boundary used to encode the body; defaults to the configured one
    #[arg(long)]
    pub boundary: Option<String>,
}
