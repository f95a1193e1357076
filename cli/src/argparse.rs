use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fql",
    about = "Filter query language compiler",
    version = "0.1.0",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Pretty-print the emitted JSON
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Pick which subcommand to use
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a filter spec into a native engine query
    Compile(CompileArgs),
    /// Compile a free-text query over a field list
    Text(TextArgs),
    /// Compile an aggregation spec into a native aggregation request
    Aggregate(AggregateArgs),
    /// Extract the flat searchable field list from an index mapping
    Fields(FieldsArgs),
}

#[derive(Args)]
pub struct CompileArgs {
    /// Path to the filter spec JSON, '-' for stdin
    #[arg(default_value = "-")]
    pub spec: String,
}

#[derive(Args)]
pub struct TextArgs {
    /// The free-text query
    pub query: String,

    /// Field names to search over, dotted paths allowed
    #[arg(long, required = true, value_delimiter = ',')]
    pub fields: Vec<String>,
}

#[derive(Args)]
pub struct AggregateArgs {
    /// Path to the aggregation spec JSON, '-' for stdin
    #[arg(default_value = "-")]
    pub spec: String,

    /// Cap on the number of term buckets requested
    #[arg(long)]
    pub terms_bucket_cap: Option<u32>,
}

#[derive(Args)]
pub struct FieldsArgs {
    /// Path to the index mapping JSON, '-' for stdin
    #[arg(default_value = "-")]
    pub mappings: String,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
