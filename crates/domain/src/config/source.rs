//! Hot-reloadable configuration sources.
//!
//! Consumers hold an `Arc<dyn ConfigSource>` and call [`ConfigSource::current`]
//! each time they need settings, never caching the result across calls.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Config;
use crate::error::Result;

pub trait ConfigSource: Send + Sync {
    /// The configuration as of right now.
    fn current(&self) -> Result<Config>;
}

/// Re-reads a TOML file on every call. A missing file yields defaults.
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSource for FileConfigSource {
    fn current(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// In-process config that can be swapped at runtime.
#[derive(Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn replace(&self, config: Config) {
        *self.inner.write() = config;
    }

    /// Edit the live config in place.
    pub fn update(&self, f: impl FnOnce(&mut Config)) {
        f(&mut self.inner.write());
    }
}

impl ConfigSource for SharedConfig {
    fn current(&self) -> Result<Config> {
        Ok(self.inner.read().clone())
    }
}
