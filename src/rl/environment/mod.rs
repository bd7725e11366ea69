//! Historical Trading Environment for RL Training
//!
//! A gym-like environment that replays daily open/close prices, skipping
//! non-trading dates as the simulation clock advances.

mod clock;
mod stock;

pub use clock::{SimClock, MAX_CALENDAR_SEARCH};
pub use stock::{
    StepInfo, StepResult, StockEnvConfig, StockEnvironment, MAX_START_HOLDING,
    RANDOM_START_FRACTION,
};
