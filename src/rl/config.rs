//! RL Configuration
//!
//! Configuration structs for the episode driver, evaluation runs and the
//! baseline policy.

use serde::{Deserialize, Serialize};

/// Training loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Total environment steps to run
    pub iterations: usize,
    /// Steps of uniform random actions before the policy takes over
    pub warmup_steps: usize,
    /// Mini-batch size passed to the policy on each update
    pub batch_size: usize,
    /// Exploration noise std as a fraction of the action bound
    pub exploration_noise: f64,
    /// Replay buffer capacity
    pub buffer_size: usize,
    /// Directory for policy checkpoints
    pub checkpoint_dir: String,
    /// Checkpoint overwritten at the end of every episode
    pub checkpoint_name: String,
    /// Also keep an episode-numbered snapshot every N episodes (0 = off)
    pub checkpoint_every: usize,
    /// Maximum episode-numbered snapshots to keep
    pub max_checkpoints: usize,
    /// Steps between progress log lines
    pub log_every: usize,
    /// Seed for exploration sampling
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            iterations: 50_000,
            warmup_steps: 2_500,
            batch_size: 128,
            exploration_noise: 0.1,
            buffer_size: 1_000_000,
            checkpoint_dir: "./checkpoints".to_string(),
            checkpoint_name: "initial_policy".to_string(),
            checkpoint_every: 0,
            max_checkpoints: 5,
            log_every: 50,
            seed: None,
        }
    }
}

/// Evaluation run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Exploration noise std as a fraction of the action bound
    pub exploration_noise: f64,
    /// Keep updating the policy while evaluating
    pub train_during_eval: bool,
    /// Mini-batch size for updates during evaluation
    pub batch_size: usize,
    /// Portfolio value CSV destination
    pub output: String,
    /// Evaluation window start; the environment's own window when unset
    pub start_date: Option<String>,
    /// Evaluation window end
    pub end_date: Option<String>,
    /// Seed for exploration sampling
    pub seed: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            exploration_noise: 0.1,
            train_during_eval: true,
            batch_size: 128,
            output: "results/test_results.csv".to_string(),
            start_date: None,
            end_date: None,
            seed: None,
        }
    }
}

/// Baseline linear policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Step size of the reward-weighted regression update
    pub learning_rate: f64,
    /// Seed for replay sampling inside the policy
    pub seed: Option<u64>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            seed: None,
        }
    }
}
