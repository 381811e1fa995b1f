use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hasura-provider")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative management of Hasura remote schemas", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Manifest describing the provider and its remote schemas
    #[arg(
        short = 'f',
        long,
        global = true,
        env = "HASURA_PROVIDER_MANIFEST",
        default_value = crate::manifest::DEFAULT_MANIFEST
    )]
    pub manifest: PathBuf,

    /// State file (default: ~/.local/state/hasura-provider/state.json)
    #[arg(long, global = true, env = "HASURA_PROVIDER_STATE")]
    pub state: Option<PathBuf>,

    /// Overall deadline for the run, in seconds
    #[arg(long, global = true, default_value = "120")]
    pub timeout: u64,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Preview what apply would change
    Diff(TargetArgs),

    /// Make the registered remote schemas match the manifest
    Apply(ApplyArgs),

    /// Refresh stored state from the Hasura metadata
    Refresh(JobsArgs),

    /// Remove remote schemas recorded in state
    Destroy(DestroyArgs),

    /// Inspect stored state
    #[command(subcommand)]
    State(StateCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct TargetArgs {
    /// Only consider the remote schema with this name
    pub target: Option<String>,

    #[command(flatten)]
    pub jobs: JobsArgs,
}

#[derive(Parser)]
pub struct JobsArgs {
    /// Number of remote schemas processed in parallel
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

#[derive(Parser)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Show what would be done without calling the admin API for changes
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Only destroy the remote schema with this name
    pub name: Option<String>,

    #[command(flatten)]
    pub jobs: JobsArgs,

    /// Show what would be done without calling the admin API
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum StateCommand {
    /// Print every resource recorded in state
    Show {
        /// Only show the remote schema with this name
        name: Option<String>,
    },

    /// Forget a remote schema without calling the admin API
    Rm {
        /// Name of the remote schema to forget
        name: String,
    },
}
