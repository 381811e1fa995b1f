mod cli;
mod commands;
mod engine;
mod manifest;
mod provider;
mod resource;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, StateCommand};
use declarative::CallContext;
use state::ProviderState;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub manifest: PathBuf,
    pub state_path: PathBuf,
    /// One deadline for the whole run, shared by every lifecycle call
    pub call: CallContext,
}

impl Context {
    pub fn new(
        verbose: u8,
        quiet: bool,
        manifest: PathBuf,
        state_path: PathBuf,
        timeout: Duration,
    ) -> Self {
        Self {
            verbose,
            quiet,
            manifest,
            state_path,
            call: CallContext::with_timeout(timeout),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let state_path = match &cli.state {
        Some(path) => manifest::expand(path),
        None => ProviderState::default_path()?,
    };

    let ctx = Context::new(
        cli.verbose,
        cli.quiet,
        manifest::expand(&cli.manifest),
        state_path,
        Duration::from_secs(cli.timeout),
    );
    log::debug!(
        "manifest {}, state {}, verbosity {}",
        ctx.manifest.display(),
        ctx.state_path.display(),
        ctx.verbose
    );

    match cli.command {
        Command::Diff(args) => commands::lifecycle::diff(&ctx, &args),
        Command::Apply(args) => commands::lifecycle::apply(&ctx, &args),
        Command::Refresh(args) => commands::lifecycle::refresh_command(&ctx, &args),
        Command::Destroy(args) => commands::lifecycle::destroy(&ctx, &args),
        Command::State(cmd) => match cmd {
            StateCommand::Show { name } => commands::state::show(&ctx, name.as_deref()),
            StateCommand::Rm { name } => commands::state::rm(&ctx, &name),
        },
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "hasura-provider", &mut io::stdout());
            Ok(())
        }
    }
}
