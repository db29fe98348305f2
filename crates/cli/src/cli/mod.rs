pub mod config;
pub mod history;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use memoir_domain::config::{Config, ConfigSource, FileConfigSource};
use memoir_domain::message::Role;
use memoir_history::{HistoryManager, JsonFileLog};
use memoir_providers::ConfiguredSummarizerFactory;

/// memoir: rolling, self-summarizing conversation history.
#[derive(Debug, Parser)]
#[command(name = "memoir", version, about)]
pub struct Cli {
    /// Config file (defaults to $MEMOIR_CONFIG, then ./config.toml).
    #[arg(long = "config", global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the stored history for an identity.
    Show {
        identity: String,
        /// Print the raw JSON record instead of a transcript.
        #[arg(long)]
        json: bool,
    },
    /// Append one message, compacting older turns when over the cap.
    Append {
        identity: String,
        /// Message text.
        text: String,
        #[arg(long, value_enum, default_value = "user")]
        role: RoleArg,
        /// Use the detail-preserving summary template if compaction runs.
        #[arg(long)]
        detailed: bool,
    },
    /// Run a consistency review pass. Ctrl-C cancels it.
    Review { identity: String },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    User,
    Assistant,
    System,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => Role::User,
            RoleArg::Assistant => Role::Assistant,
            RoleArg::System => Role::System,
        }
    }
}

// ── Config loading helper ─────────────────────────────────────────────

/// Resolve the config path (`--config`, then `MEMOIR_CONFIG`, then
/// `config.toml`) and parse it. A missing file yields defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, PathBuf)> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => std::env::var_os("MEMOIR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml")),
    };

    let config = FileConfigSource::new(&config_path)
        .current()
        .map_err(|e| anyhow::anyhow!("loading {}: {e}", config_path.display()))?;

    Ok((config, config_path))
}

/// Wire a [`HistoryManager`] to the file-backed log. Models, credentials
/// and the auto-review toggle are re-read from `config_path` on use.
pub fn open_manager(config: &Config, config_path: &Path) -> anyhow::Result<HistoryManager> {
    let log = JsonFileLog::from_config(config);
    let source: Arc<dyn ConfigSource> = Arc::new(FileConfigSource::new(config_path));
    let factory = ConfiguredSummarizerFactory::new(source.clone());
    let manager = HistoryManager::new(config, Arc::new(log), Arc::new(factory))?;
    Ok(manager.with_config_source(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_append() {
        let cli = Cli::parse_from([
            "memoir", "append", "lanlan", "hello", "--role", "assistant", "--detailed",
        ]);
        match cli.command {
            Command::Append {
                identity,
                text,
                role,
                detailed,
            } => {
                assert_eq!(identity, "lanlan");
                assert_eq!(text, "hello");
                assert_eq!(Role::from(role), Role::Assistant);
                assert!(detailed);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_config_flag() {
        let cli = Cli::parse_from(["memoir", "config", "validate", "--config", "/tmp/m.toml"]);
        assert_eq!(cli.config_path, Some(PathBuf::from("/tmp/m.toml")));
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Validate)));
    }

    #[test]
    fn explicit_path_wins_and_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let (config, used) = load_config(Some(&path)).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.history.max_history_length, 10);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "history = 3").unwrap();
        let err = load_config(Some(&path)).unwrap_err().to_string();
        assert!(err.contains("bad.toml"));
    }
}
