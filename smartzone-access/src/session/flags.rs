//! Flag Storage - Persistence layer for demo-bypass flags
//!
//! The resolver reads these flags during every resolution; the login
//! flow writes them. Both stores implement the same injected seam so
//! tests and non-persistent deployments can run fully in memory.

use async_trait::async_trait;
use smartzone_core::{ErrorContext, FlagStore, SmartzoneError, SmartzoneResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Flag granting demo access when set to the literal string "true"
pub const DEMO_ACCESS: &str = "demo_access";
/// Role the demo identity carries, "manager" or "worker"
pub const DEMO_ROLE: &str = "demo_role";
/// Display name of the demo identity
pub const DEMO_NAME: &str = "demo_name";
/// Department of the demo identity
pub const DEMO_DEPARTMENT: &str = "demo_department";

/// Every flag the bypass path reads; teardown removes the gate first
pub const DEMO_KEYS: [&str; 4] = [DEMO_ACCESS, DEMO_ROLE, DEMO_NAME, DEMO_DEPARTMENT];

/// In-memory flag store for tests and non-persistent deployments
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> SmartzoneResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> SmartzoneResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Flag store persisted as a flat JSON map
///
/// The file is read once at open; mutations write the full map back so
/// a later process sees the same flags (process-wide lifetime and
/// beyond).
#[derive(Debug)]
pub struct JsonFileFlagStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, String>>,
}

impl JsonFileFlagStore {
    /// Open a flag store at the given path, creating parent directories
    pub fn open<P: AsRef<Path>>(path: P) -> SmartzoneResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SmartzoneError::Io)?;
        }

        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(SmartzoneError::Io)?;
            serde_json::from_str(&raw).map_err(|e| SmartzoneError::Storage {
                message: format!("Failed to parse flag file {}: {}", path.display(), e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("flag-store")
                    .with_operation("open")
                    .with_metadata("path", &path.display().to_string())
                    .with_suggestion("Delete the flag file to reset persisted flags"),
            })?
        } else {
            HashMap::new()
        };

        info!("Flag store initialized at: {}", path.display());

        Ok(Self {
            path,
            cache: RwLock::new(entries),
        })
    }

    async fn persist(&self) -> SmartzoneResult<()> {
        let snapshot = self.cache.read().await.clone();
        let json = serde_json::to_string_pretty(&snapshot).map_err(SmartzoneError::Serialization)?;
        std::fs::write(&self.path, json).map_err(SmartzoneError::Io)?;
        Ok(())
    }
}

#[async_trait]
impl FlagStore for JsonFileFlagStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.cache.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> SmartzoneResult<()> {
        {
            let mut cache = self.cache.write().await;
            cache.insert(key.to_string(), value.to_string());
        }
        self.persist().await?;
        debug!(key, "Flag persisted");
        Ok(())
    }

    async fn remove(&self, key: &str) -> SmartzoneResult<()> {
        let removed = {
            let mut cache = self.cache.write().await;
            cache.remove(key).is_some()
        };

        // Removing an absent flag is a no-op, not an error.
        if removed {
            self.persist().await?;
            debug!(key, "Flag removed");
        }
        Ok(())
    }
}
