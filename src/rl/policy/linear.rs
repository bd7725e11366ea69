//! Linear baseline policy
//!
//! `action = max_action * tanh(W * phi(state) + b)` with the signed log
//! feature map `phi(x) = sign(x) * ln(1 + |x|)`, which keeps cash balances
//! and share prices on a comparable scale. Training is a reward-weighted
//! regression toward the actions stored in the replay buffer, using
//! batch-standardised rewards as weights.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info};

use super::Policy;
use crate::error::{Result, StockRlError};
use crate::rl::memory::ReplayBuffer;

/// Persisted parameters of a [`LinearPolicy`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyWeights {
    pub state_dim: usize,
    pub action_dim: usize,
    pub max_action: f64,
    /// `action_dim` rows of `state_dim` weights
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    /// Number of updates applied so far
    pub updates: u64,
}

/// Deterministic linear policy with tanh squashing
#[derive(Debug, Clone)]
pub struct LinearPolicy {
    params: PolicyWeights,
    learning_rate: f64,
    rng: StdRng,
}

fn feature(x: f64) -> f64 {
    x.signum() * x.abs().ln_1p()
}

impl LinearPolicy {
    pub fn new(
        state_dim: usize,
        action_dim: usize,
        max_action: f64,
        learning_rate: f64,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            params: PolicyWeights {
                state_dim,
                action_dim,
                max_action,
                weights: vec![vec![0.0; state_dim]; action_dim],
                bias: vec![0.0; action_dim],
                updates: 0,
            },
            learning_rate,
            rng,
        }
    }

    pub fn weights(&self) -> &PolicyWeights {
        &self.params
    }

    pub fn updates(&self) -> u64 {
        self.params.updates
    }

    /// Pre-activation outputs for already-mapped features
    fn logits(&self, features: &[f64]) -> Vec<f64> {
        self.params
            .weights
            .iter()
            .zip(&self.params.bias)
            .map(|(row, bias)| bias + row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>())
            .collect()
    }
}

impl Policy for LinearPolicy {
    fn select_action(&self, state: &[f64]) -> Vec<f64> {
        let features: Vec<f64> = state.iter().copied().map(feature).collect();
        self.logits(&features)
            .into_iter()
            .map(|z| self.params.max_action * z.tanh())
            .collect()
    }

    fn train(&mut self, replay: &ReplayBuffer, batch_size: usize) -> Result<()> {
        if replay.len() < 2 || batch_size == 0 {
            return Ok(());
        }

        let batch = replay.sample_with(&mut self.rng, batch_size);
        let n = batch.len() as f64;
        let mean = batch.iter().map(|t| t.reward).sum::<f64>() / n;
        let var = batch.iter().map(|t| (t.reward - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        if std < 1e-8 {
            // Nothing to prefer between equally rewarded actions
            return Ok(());
        }

        let mut grad_w = vec![vec![0.0; self.params.state_dim]; self.params.action_dim];
        let mut grad_b = vec![0.0; self.params.action_dim];

        for transition in &batch {
            if transition.state.len() != self.params.state_dim
                || transition.action.len() != self.params.action_dim
            {
                return Err(StockRlError::Policy(format!(
                    "transition shape ({}, {}) does not match policy ({}, {})",
                    transition.state.len(),
                    transition.action.len(),
                    self.params.state_dim,
                    self.params.action_dim
                )));
            }

            let advantage = (transition.reward - mean) / std;
            let features: Vec<f64> = transition.state.iter().copied().map(feature).collect();
            for (j, z) in self.logits(&features).into_iter().enumerate() {
                let predicted = z.tanh();
                let target = (transition.action[j] / self.params.max_action).clamp(-1.0, 1.0);
                let g = advantage * (target - predicted) * (1.0 - predicted * predicted);
                for (acc, x) in grad_w[j].iter_mut().zip(&features) {
                    *acc += g * x;
                }
                grad_b[j] += g;
            }
        }

        let step = self.learning_rate / n;
        for (row, grad_row) in self.params.weights.iter_mut().zip(&grad_w) {
            for (w, g) in row.iter_mut().zip(grad_row) {
                *w += step * g;
            }
        }
        for (b, g) in self.params.bias.iter_mut().zip(&grad_b) {
            *b += step * g;
        }
        self.params.updates += 1;

        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.params)?;
        debug!(path = %path.display(), updates = self.params.updates, "Saved policy");
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        let params: PolicyWeights = serde_json::from_reader(reader)?;

        if params.state_dim != self.params.state_dim || params.action_dim != self.params.action_dim
        {
            return Err(StockRlError::Policy(format!(
                "checkpoint {} has shape ({}, {}), expected ({}, {})",
                path.display(),
                params.state_dim,
                params.action_dim,
                self.params.state_dim,
                self.params.action_dim
            )));
        }
        if params.weights.len() != params.action_dim
            || params.bias.len() != params.action_dim
            || params.weights.iter().any(|row| row.len() != params.state_dim)
        {
            return Err(StockRlError::Policy(format!(
                "checkpoint {} has inconsistent weight matrix",
                path.display()
            )));
        }

        info!(path = %path.display(), updates = params.updates, "Loaded policy");
        self.params = params;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    #[test]
    fn test_zero_policy_outputs_zero() {
        let policy = LinearPolicy::new(5, 2, 10.0, 0.01, Some(1));
        assert_eq!(policy.select_action(&[1000.0, 0.0, 0.0, 10.0, 20.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_output_bounded_by_max_action() {
        let mut policy = LinearPolicy::new(1, 1, 10.0, 0.01, Some(1));
        policy.params.weights = vec![vec![100.0]];

        let action = policy.select_action(&[1e6]);
        assert!(action[0] <= 10.0 && action[0] > 9.99);
    }

    #[test]
    fn test_training_moves_toward_rewarded_action() {
        let mut policy = LinearPolicy::new(1, 1, 10.0, 0.5, Some(5));
        let mut replay = ReplayBuffer::new(100);
        for _ in 0..20 {
            replay.add(&[1.0], &[10], &[1.0], 1.0, 0.0);
            replay.add(&[1.0], &[-10], &[1.0], -1.0, 0.0);
        }

        for _ in 0..50 {
            policy.train(&replay, 16).unwrap();
        }

        assert!(policy.select_action(&[1.0])[0] > 0.0);
        assert!(policy.updates() > 0);
    }

    #[test]
    fn test_constant_rewards_skip_update() {
        let mut policy = LinearPolicy::new(1, 1, 10.0, 0.5, Some(5));
        let mut replay = ReplayBuffer::new(10);
        for _ in 0..5 {
            replay.add(&[1.0], &[3], &[1.0], 2.0, 0.0);
        }

        policy.train(&replay, 4).unwrap();
        assert_eq!(policy.updates(), 0);
    }

    #[test]
    fn test_train_rejects_mismatched_transitions() {
        let mut policy = LinearPolicy::new(3, 1, 10.0, 0.5, Some(5));
        let mut replay = ReplayBuffer::new(10);
        replay.add(&[1.0], &[3], &[1.0], 2.0, 0.0);
        replay.add(&[1.0], &[3], &[1.0], 4.0, 0.0);

        assert!(matches!(
            policy.train(&replay, 2),
            Err(StockRlError::Policy(_))
        ));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let path = temp_dir()
            .join(format!("stockrl_policy_{}", std::process::id()))
            .join("policy.json");

        let mut trained = LinearPolicy::new(2, 1, 10.0, 0.1, Some(9));
        trained.params.weights = vec![vec![0.25, -0.5]];
        trained.params.bias = vec![0.1];
        trained.save(&path).unwrap();

        let mut restored = LinearPolicy::new(2, 1, 10.0, 0.1, Some(9));
        restored.load(&path).unwrap();
        assert_eq!(restored.weights(), trained.weights());

        let mut wrong_shape = LinearPolicy::new(3, 1, 10.0, 0.1, Some(9));
        assert!(wrong_shape.load(&path).is_err());

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
