//! Policy collaborator
//!
//! The episode driver only needs a policy that proposes continuous actions,
//! learns from the replay buffer and persists itself. The optimisation
//! algorithm behind it is the implementation's business.

mod linear;

use std::path::Path;

use crate::error::Result;
use crate::rl::memory::ReplayBuffer;

pub use linear::{LinearPolicy, PolicyWeights};

/// Contract between the episode driver and a learning policy
#[cfg_attr(test, mockall::automock)]
pub trait Policy: Send {
    /// Continuous action for `state`, one entry per instrument
    fn select_action(&self, state: &[f64]) -> Vec<f64>;

    /// Run one update from experience in `replay`
    fn train(&mut self, replay: &ReplayBuffer, batch_size: usize) -> Result<()>;

    /// Persist parameters to `path`
    fn save(&self, path: &Path) -> Result<()>;

    /// Restore parameters from `path`
    fn load(&mut self, path: &Path) -> Result<()>;
}
