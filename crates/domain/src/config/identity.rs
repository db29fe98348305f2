use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Display names used when a history is rendered into a prompt.
///
/// The assistant side is always shown under the identity's own name, so
/// only the human and system speakers are configured here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMapping {
    #[serde(default = "d_human")]
    pub human: String,
    #[serde(default = "d_system")]
    pub system: String,
}

impl Default for NameMapping {
    fn default() -> Self {
        Self {
            human: d_human(),
            system: d_system(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdentityConfig {
    /// Overrides `<state_dir>/<identity>.json`.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

fn d_human() -> String {
    "User".into()
}
fn d_system() -> String {
    "System".into()
}
