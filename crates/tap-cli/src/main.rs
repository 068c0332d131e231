//! tap - install tools from a formula tap

use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use tap_cli::cmd::{self, Context};
use tap_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            let code = tap_cli::exit_code(&err);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::from_cli(&cli)?;

    match cli.command {
        Commands::Install {
            formulas,
            force,
            platform,
        } => cmd::install::install(&ctx, &formulas, force, platform).await,
        Commands::Test { formula } => cmd::test::test(&ctx, &formula).await,
        Commands::Uninstall { formulas } => cmd::uninstall::uninstall(&ctx, &formulas),
        Commands::Info { formula } => cmd::info::info(&ctx, &formula),
        Commands::Resolve { formula, platform } => {
            cmd::resolve::resolve(&ctx, &formula, platform)
        }
        Commands::List { available } => cmd::list::list(&ctx, available),
        Commands::Check { paths } => cmd::check::check(&ctx, &paths),
        Commands::Hash { files } => cmd::hash::hash(&files),
        Commands::Render { formula } => cmd::render::render(&ctx, &formula),
    }
}
