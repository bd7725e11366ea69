//! Core RL abstractions
//!
//! Fundamental types for state representation, actions, and rewards.

pub mod action;
pub mod reward;
pub mod state;

pub use action::{apply_trades, ActionSpace, MAX_LIMIT};
pub use reward::{episode_gain, portfolio_value};
pub use state::StateVector;
