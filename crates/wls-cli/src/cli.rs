use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "wls",
    about = "WorldLine Store: versioned object history with branching time travel",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store root (defaults to `.wls`). Settings are read from `<root>/wls.toml`
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty world-line
    Create(CreateArgs),
    /// List world-lines
    List,
    /// Rename a world-line
    Rename(RenameArgs),
    /// Delete a world-line (payloads stay in the content store)
    Delete(WorldLineArg),
    /// Record a new value for an object
    Record(RecordArgs),
    /// Print the current value of an object
    Get(GetArgs),
    /// Print every pointer in the world at the cursor (or at a node)
    State(StateArgs),
    /// Show history nodes
    Log(LogArgs),
    /// Show the world at a node and what that node changed
    Show(NodeArgs),
    /// Move the cursor to a node
    Goto(NodeArgs),
    /// Move the cursor to its parent
    Back(WorldLineArg),
    /// Move the cursor to the remembered child
    Forward(WorldLineArg),
    /// Move the cursor to the most recent node
    Latest(WorldLineArg),
}

#[derive(Args)]
pub struct WorldLineArg {
    pub worldline: String,
}

#[derive(Args)]
pub struct CreateArgs {
    pub id: String,
    /// Display name (defaults to the id)
    pub name: Option<String>,
}

#[derive(Args)]
pub struct RenameArgs {
    pub worldline: String,
    pub name: String,
}

#[derive(Args)]
pub struct RecordArgs {
    pub worldline: String,
    /// Object key, `type:id`
    pub key: String,
    /// Value as JSON; text that is not valid JSON is recorded as a string
    pub value: String,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    pub worldline: String,
    /// Object key, `type:id`
    pub key: String,
}

#[derive(Args)]
pub struct StateArgs {
    pub worldline: String,
    /// Node id or unique prefix
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Args)]
pub struct LogArgs {
    pub worldline: String,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub graph: bool,
}

#[derive(Args)]
pub struct NodeArgs {
    pub worldline: String,
    /// Node id or unique prefix
    pub node: String,
}
