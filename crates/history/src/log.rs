//! Durable per-identity history logs.
//!
//! Each identity owns one record holding its whole message sequence.
//! `save` always replaces the full record; there are no deltas.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use memoir_domain::config::Config;
use memoir_domain::error::{Error, Result};
use memoir_domain::message::Message;
use parking_lot::RwLock;

#[async_trait::async_trait]
pub trait IdentityLog: Send + Sync {
    /// The durable sequence, or `None` when the identity has no record yet.
    async fn load(&self, identity: &str) -> Result<Option<Vec<Message>>>;

    /// Overwrite the identity's record with `messages`.
    async fn save(&self, identity: &str, messages: &[Message]) -> Result<()>;

    async fn exists(&self, identity: &str) -> Result<bool> {
        Ok(self.load(identity).await?.is_some())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// JSON files
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One pretty-printed UTF-8 JSON array per identity.
///
/// Writes land in a sibling `.tmp` file first and are renamed into place,
/// so readers never observe a half-written log.
pub struct JsonFileLog {
    base_dir: PathBuf,
    overrides: HashMap<String, PathBuf>,
}

impl JsonFileLog {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            overrides: HashMap::new(),
        }
    }

    /// Use `state_dir` plus every per-identity `log_path` from the config.
    pub fn from_config(config: &Config) -> Self {
        let mut log = Self::new(&config.history.state_dir);
        for (identity, settings) in &config.identities {
            if let Some(path) = &settings.log_path {
                log.overrides.insert(identity.clone(), path.clone());
            }
        }
        log
    }

    pub fn with_override(mut self, identity: &str, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(identity.to_owned(), path.into());
        self
    }

    /// Sanitize an identity name for use as a filename.
    pub fn identity_to_filename(identity: &str) -> String {
        identity
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c => c,
            })
            .collect()
    }

    pub fn path_for(&self, identity: &str) -> PathBuf {
        match self.overrides.get(identity) {
            Some(path) => path.clone(),
            None => self
                .base_dir
                .join(format!("{}.json", Self::identity_to_filename(identity))),
        }
    }
}

#[async_trait::async_trait]
impl IdentityLog for JsonFileLog {
    async fn load(&self, identity: &str) -> Result<Option<Vec<Message>>> {
        let path = self.path_for(identity);
        tokio::task::spawn_blocking(move || read_log(&path))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
    }

    async fn save(&self, identity: &str, messages: &[Message]) -> Result<()> {
        let path = self.path_for(identity);
        let json = serde_json::to_string_pretty(messages)?;
        tokio::task::spawn_blocking(move || write_log(&path, &json))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
    }

    async fn exists(&self, identity: &str) -> Result<bool> {
        let path = self.path_for(identity);
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

fn read_log(path: &Path) -> Result<Option<Vec<Message>>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

fn write_log(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    if let Err(e) = std::fs::write(&tmp, json) {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::Io(e));
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-local log for embedding and tests.
#[derive(Default)]
pub struct InMemoryLog {
    records: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a record directly, as another process sharing the log would.
    pub fn put(&self, identity: &str, messages: Vec<Message>) {
        self.records.write().insert(identity.to_owned(), messages);
    }

    pub fn get(&self, identity: &str) -> Option<Vec<Message>> {
        self.records.read().get(identity).cloned()
    }
}

#[async_trait::async_trait]
impl IdentityLog for InMemoryLog {
    async fn load(&self, identity: &str) -> Result<Option<Vec<Message>>> {
        Ok(self.get(identity))
    }

    async fn save(&self, identity: &str, messages: &[Message]) -> Result<()> {
        self.put(identity, messages.to_vec());
        Ok(())
    }
}
