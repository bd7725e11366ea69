//! Policy Checkpointing
//!
//! Save and load policy parameters for persistence.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, StockRlError};
use crate::rl::policy::Policy;

const CHECKPOINT_EXT: &str = "json";

/// Checkpointer for saving and loading policies
#[derive(Debug, Clone)]
pub struct Checkpointer {
    /// Directory for checkpoints
    checkpoint_dir: PathBuf,
    /// Maximum episode snapshots to keep per prefix
    max_checkpoints: usize,
}

impl Checkpointer {
    /// Create a new checkpointer
    pub fn new<P: AsRef<Path>>(checkpoint_dir: P, max_checkpoints: usize) -> Self {
        let checkpoint_dir = checkpoint_dir.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        if !checkpoint_dir.exists() {
            if let Err(e) = fs::create_dir_all(&checkpoint_dir) {
                warn!("Failed to create checkpoint directory: {}", e);
            }
        }

        Self {
            checkpoint_dir,
            max_checkpoints,
        }
    }

    /// Get checkpoint path for a given name
    pub fn checkpoint_path(&self, name: &str) -> PathBuf {
        self.checkpoint_dir.join(format!("{}.{}", name, CHECKPOINT_EXT))
    }

    /// Save a policy under `name`, replacing any previous checkpoint
    pub fn save<P: Policy + ?Sized>(&self, policy: &P, name: &str) -> Result<PathBuf> {
        let path = self.checkpoint_path(name);
        policy.save(&path)?;
        info!("Saved checkpoint to {:?}", path);
        Ok(path)
    }

    /// Save an episode-numbered snapshot and prune old ones with the same prefix
    pub fn save_snapshot<P: Policy + ?Sized>(
        &self,
        policy: &P,
        prefix: &str,
        episode: usize,
    ) -> Result<PathBuf> {
        let path = self.save(policy, &episode_name(prefix, episode))?;
        self.cleanup_old_snapshots(prefix);
        Ok(path)
    }

    /// Load the checkpoint `name` into `policy`
    pub fn load<P: Policy + ?Sized>(&self, policy: &mut P, name: &str) -> Result<()> {
        let path = self.checkpoint_path(name);

        if !path.exists() {
            return Err(StockRlError::Validation(format!(
                "Checkpoint not found: {:?}",
                path
            )));
        }

        policy.load(&path)
    }

    /// List available checkpoints
    pub fn list_checkpoints(&self) -> Vec<String> {
        let suffix = format!(".{}", CHECKPOINT_EXT);
        let mut checkpoints = Vec::new();

        if let Ok(entries) = fs::read_dir(&self.checkpoint_dir) {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Some(stem) = name.strip_suffix(&suffix) {
                        checkpoints.push(stem.to_string());
                    }
                }
            }
        }

        checkpoints.sort();
        checkpoints
    }

    /// Get latest episode snapshot for `prefix`
    pub fn latest_snapshot(&self, prefix: &str) -> Option<String> {
        self.snapshots(prefix).into_iter().last()
    }

    fn snapshots(&self, prefix: &str) -> Vec<String> {
        let marker = format!("{}_ep", prefix);
        self.list_checkpoints()
            .into_iter()
            .filter(|name| name.starts_with(&marker))
            .collect()
    }

    /// Remove the oldest snapshots of `prefix` beyond max_checkpoints
    fn cleanup_old_snapshots(&self, prefix: &str) {
        let snapshots = self.snapshots(prefix);

        if snapshots.len() <= self.max_checkpoints {
            return;
        }

        let to_remove = snapshots.len() - self.max_checkpoints;
        for name in snapshots.into_iter().take(to_remove) {
            let path = self.checkpoint_path(&name);
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove old checkpoint {:?}: {}", path, e);
            } else {
                info!("Removed old checkpoint: {}", name);
            }
        }
    }

    /// Check if a checkpoint exists
    pub fn exists(&self, name: &str) -> bool {
        self.checkpoint_path(name).exists()
    }
}

impl Default for Checkpointer {
    fn default() -> Self {
        Self::new("./checkpoints", 5)
    }
}

/// Generate a checkpoint name with episode number
pub fn episode_name(prefix: &str, episode: usize) -> String {
    format!("{}_ep{:06}", prefix, episode)
}
