//! Replay Buffer
//!
//! Experience replay buffer for off-policy learning.

use rand::seq::index;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A single transition in the environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State before the action
    pub state: Vec<f64>,
    /// Integer share quantities, stored as floats for learners
    pub action: Vec<f64>,
    /// State after the action
    pub next_state: Vec<f64>,
    /// Reward received
    pub reward: f64,
    /// 1.0 for a true terminal transition, 0.0 otherwise
    pub done: f64,
}

impl Transition {
    /// Create a new transition
    pub fn new(
        state: Vec<f64>,
        action: Vec<f64>,
        next_state: Vec<f64>,
        reward: f64,
        done: f64,
    ) -> Self {
        Self {
            state,
            action,
            next_state,
            reward,
            done,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.done != 0.0
    }
}

/// Replay buffer for experience storage
#[derive(Debug)]
pub struct ReplayBuffer {
    /// Storage for transitions
    buffer: VecDeque<Transition>,
    /// Maximum capacity
    capacity: usize,
}

impl ReplayBuffer {
    /// Create a new replay buffer with given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity.min(65_536)),
            capacity,
        }
    }

    /// Store one transition; the oldest entry is evicted when full
    pub fn add(
        &mut self,
        state: &[f64],
        action: &[i64],
        next_state: &[f64],
        reward: f64,
        done: f64,
    ) {
        self.push(Transition::new(
            state.to_vec(),
            action.iter().map(|&a| a as f64).collect(),
            next_state.to_vec(),
            reward,
            done,
        ));
    }

    /// Add a transition to the buffer
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Sample a random batch of distinct transitions
    pub fn sample(&self, batch_size: usize) -> Vec<Transition> {
        self.sample_with(&mut thread_rng(), batch_size)
    }

    /// Sample a random batch with a caller-supplied RNG
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R, batch_size: usize) -> Vec<Transition> {
        let amount = batch_size.min(self.buffer.len());
        index::sample(rng, self.buffer.len(), amount)
            .into_iter()
            .map(|i| self.buffer[i].clone())
            .collect()
    }

    /// Most recently added transition
    pub fn last(&self) -> Option<&Transition> {
        self.buffer.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    /// Get current number of transitions
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if buffer has enough samples for training
    pub fn has_enough_samples(&self, min_samples: usize) -> bool {
        self.buffer.len() >= min_samples
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new(1_000_000)
    }
}
