mod history;
mod identity;
mod llm;
mod source;

pub use history::*;
pub use identity::*;
pub use llm::*;
pub use source::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub names: NameMapping,
    /// Per-identity overrides (key = identity name).
    #[serde(default)]
    pub identities: HashMap<String, IdentityConfig>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        // At least one recent turn must survive next to the memo.
        if self.history.max_history_length < 2 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "history.max_history_length".into(),
                message: "must be at least 2".into(),
            });
        }

        if self.history.max_retries == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "history.max_retries".into(),
                message: "retry budget must allow at least one attempt".into(),
            });
        }

        if self.llm.summary_model.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.summary_model".into(),
                message: "summary model must not be empty".into(),
            });
        }

        if self.llm.correction_model.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.correction_model".into(),
                message: "correction model must not be empty".into(),
            });
        }

        if self.llm.base_url.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.base_url".into(),
                message: "base_url must not be empty".into(),
            });
        }

        if self.llm.auth.key.is_some() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm.auth.key".into(),
                message: "API key stored in plaintext; prefer `env`".into(),
            });
        }

        for (name, identity) in &self.identities {
            if let Some(path) = &identity.log_path {
                if path.as_os_str().is_empty() {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Error,
                        field: format!("identities.{name}.log_path"),
                        message: "log_path must not be empty when set".into(),
                    });
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn tiny_history_cap_is_an_error() {
        let mut config = Config::default();
        config.history.max_history_length = 1;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ConfigSeverity::Error);
        assert_eq!(issues[0].field, "history.max_history_length");
    }

    #[test]
    fn plaintext_key_is_a_warning() {
        let mut config = Config::default();
        config.llm.auth.key = Some("sk-test".into());
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ConfigSeverity::Warning);
        assert!(issues[0].to_string().starts_with("[WARN] llm.auth.key"));
    }
}
