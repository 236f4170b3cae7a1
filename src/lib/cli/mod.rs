use clap::Parser;
use std::path::PathBuf;

/// Runtime settings come from the environment; the command line only selects
/// which environment file to load first.
#[derive(Parser, Debug, Default)]
#[command(
    name = "azure-agent-mcp",
    version,
    about = "MCP server exposing Azure AI Foundry agents as tools"
)]
pub struct Cli {
    /// Environment file to load instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}
