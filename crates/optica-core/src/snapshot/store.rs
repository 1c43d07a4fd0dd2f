use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

use super::crypto;
use super::OfflineSnapshot;

/// Snapshot file name in cache directory
const SNAPSHOT_FILE: &str = "offline_snapshot.json";

/// File-backed offline snapshot, optionally sealed with a passphrase.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    passphrase: Option<String>,
}

impl SnapshotStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(SNAPSHOT_FILE),
            passphrase: None,
        }
    }

    /// Seal on save and require the passphrase on load.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<Option<OfflineSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;

        let plaintext = if crypto::is_sealed(&bytes) {
            let Some(ref passphrase) = self.passphrase else {
                bail!("Snapshot is sealed; a passphrase is required");
            };
            crypto::open(&bytes, passphrase)?
        } else {
            bytes
        };

        let snapshot: OfflineSnapshot =
            serde_json::from_slice(&plaintext).context("Failed to parse snapshot")?;
        debug!(
            products = snapshot.products.len(),
            appointments = snapshot.appointments.len(),
            age = %snapshot.age_display(),
            "Offline snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    /// Write the snapshot, replacing the previous one in a single rename.
    pub fn save(&self, snapshot: &OfflineSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(snapshot)?;
        let bytes = match self.passphrase {
            Some(ref passphrase) => crypto::seal(&json, passphrase)?,
            None => json,
        };

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)
            .with_context(|| format!("Failed to write snapshot: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace snapshot")?;
        debug!(path = %self.path.display(), "Offline snapshot saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove snapshot")?;
        }
        Ok(())
    }
}
