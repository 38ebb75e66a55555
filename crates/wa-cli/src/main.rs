use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wa_cli::commands::{run, schedule, status};
use wa_cli::{App, Cli, Commands, Config};

/// Actor key for runs started from this process's terminal.
const CLI_ACTOR: &str = "cli";

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Run { days_ago, user }) => {
            let config = load_config(cli.config.as_deref())?;
            let app = App::build(&config, user.as_deref())?;
            run::run(&app, CLI_ACTOR, *days_ago).await?;
        }
        Some(Commands::Schedule) => {
            let config = load_config(cli.config.as_deref())?;
            let app = App::build(&config, None)?;
            schedule::run(app).await?;
        }
        Some(Commands::Status) => {
            let config = load_config(cli.config.as_deref())?;
            let app = App::build(&config, None)?;
            status::run(&app);
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
