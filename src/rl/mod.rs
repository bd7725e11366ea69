//! Reinforcement Learning Module
//!
//! A gym-style environment over historical stock prices and the episode
//! driver that trains a policy against it.
//!
//! # Features
//!
//! - **State Representation**: `[cash, holdings.., prices..]` vectors
//! - **Action Space**: Integer share counts per instrument, bounded by `max_action`
//! - **Calendar**: Non-trading days are skipped as the clock advances
//! - **Training**: Warm-up exploration, replay memory and checkpointing

pub mod config;
pub mod core;
pub mod environment;
pub mod memory;
pub mod policy;
pub mod training;

// Config exports
pub use config::{EvaluationConfig, PolicyConfig, TrainingConfig};

// Core exports
pub use core::{apply_trades, episode_gain, portfolio_value, ActionSpace, StateVector, MAX_LIMIT};

// Memory exports
pub use memory::{ReplayBuffer, Transition};

// Policy exports
pub use policy::{LinearPolicy, Policy};

// Environment exports
pub use environment::{SimClock, StepInfo, StepResult, StockEnvConfig, StockEnvironment};

// Training exports
pub use training::{
    evaluate, Checkpointer, EvaluationReport, PortfolioValueLog, TrainingLoop, TrainingReport,
};
