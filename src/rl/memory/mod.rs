//! Experience replay storage

pub mod replay_buffer;

pub use replay_buffer::{ReplayBuffer, Transition};
