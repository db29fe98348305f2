use clap::Parser;
use tracing_subscriber::EnvFilter;

use memoir_cli::cli::{self, Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_cli_tracing();

    let (config, config_path) = cli::load_config(cli.config_path.as_deref())?;

    match cli.command {
        Command::Config(ConfigCommand::Validate) => {
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => cli::config::show(&config),
        Command::Show { identity, json } => {
            let manager = cli::open_manager(&config, &config_path)?;
            cli::history::show(&manager, &config, &identity, json).await
        }
        Command::Append {
            identity,
            text,
            role,
            detailed,
        } => {
            let manager = cli::open_manager(&config, &config_path)?;
            cli::history::append(&manager, &identity, role, text, detailed).await
        }
        Command::Review { identity } => {
            let manager = cli::open_manager(&config, &config_path)?;
            cli::history::review(&manager, &identity).await
        }
    }
}

/// Compact stderr logging. `RUST_LOG=info` surfaces the history events.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
