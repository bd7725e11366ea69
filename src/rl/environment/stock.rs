//! Stock Trading Environment for RL Training
//!
//! Replays historical open/close prices for a fixed basket of instruments and
//! provides a gym-like interface with step/reset.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::clock::SimClock;
use crate::data::{parse_date, PriceSeries, PriceSource, Session};
use crate::error::EnvError;
use crate::rl::core::{apply_trades, episode_gain, ActionSpace, StateVector, MAX_LIMIT};

/// Upper bound (inclusive) of randomised starting holdings per instrument
pub const MAX_START_HOLDING: i64 = 10;

/// Random starts are drawn from the first fifth of the date range
pub const RANDOM_START_FRACTION: f64 = 0.2;

/// Stock environment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockEnvConfig {
    /// Tickers in state-vector order; the first one drives calendar skips
    pub tickers: Vec<String>,
    /// First simulated date (`MM-DD-YYYY` or `YYYY-MM-DD`)
    pub start_date: String,
    /// Last simulated date, not before `start_date`
    pub end_date: String,
    /// Lower bound of the random starting cash
    pub starting_cash_lower: u64,
    /// Upper bound of the random starting cash; the fixed cash otherwise
    pub starting_cash_upper: u64,
    /// Randomise starting cash, holdings and tick on reset
    pub random_start: bool,
    /// Per-instrument action bound
    pub max_action: i64,
    /// RNG seed for reproducible random starts
    pub seed: Option<u64>,
}

impl Default for StockEnvConfig {
    fn default() -> Self {
        Self {
            tickers: vec!["SPY".to_string()],
            start_date: "01-02-2015".to_string(),
            end_date: "12-31-2018".to_string(),
            starting_cash_lower: 10_000,
            starting_cash_upper: 50_000,
            random_start: false,
            max_action: MAX_LIMIT,
            seed: None,
        }
    }
}

/// Result of taking a step in the environment
#[derive(Debug, Clone)]
pub struct StepResult {
    /// New state `[cash, holdings.., prices..]`
    pub state: Vec<f64>,
    /// Portfolio gain since reset
    pub reward: f64,
    /// Whether the episode's tick bound was reached
    pub done: bool,
    /// Additional info
    pub info: StepInfo,
}

/// Additional step information
#[derive(Debug, Clone)]
pub struct StepInfo {
    pub date: NaiveDate,
    pub session: Session,
    pub tick: i64,
    /// Ticks advanced by this step (more than 1 across non-trading days)
    pub tick_delta: i64,
    pub portfolio_value: f64,
}

/// Trading environment over historical prices.
///
/// Stepping past `max_ticks` is allowed; the environment keeps advancing
/// until the price data runs out, at which point `step` fails with
/// `CalendarSearchExhausted` or `PriceUnavailable`.
pub struct StockEnvironment {
    config: StockEnvConfig,
    series: Vec<Arc<PriceSeries>>,
    clock: SimClock,
    action_space: ActionSpace,
    state: StateVector,
    reference_value: f64,
    rng: StdRng,
}

impl StockEnvironment {
    /// Create a new environment and perform the initial reset
    pub fn new(config: StockEnvConfig, source: &dyn PriceSource) -> Result<Self, EnvError> {
        if config.tickers.is_empty() {
            return Err(EnvError::NoInstruments);
        }
        if config.starting_cash_lower > config.starting_cash_upper {
            return Err(EnvError::InvalidCashRange {
                lower: config.starting_cash_lower,
                upper: config.starting_cash_upper,
            });
        }
        if config.max_action <= 0 {
            return Err(EnvError::InvalidActionBound(config.max_action));
        }

        let series = config
            .tickers
            .iter()
            .map(|ticker| source.load(ticker))
            .collect::<Result<Vec<_>, _>>()?;

        let start = parse_date(&config.start_date)?;
        let end = parse_date(&config.end_date)?;
        let clock = SimClock::new(start, end)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let num_instruments = config.tickers.len();
        let mut env = Self {
            action_space: ActionSpace::symmetric(num_instruments, config.max_action),
            state: StateVector::zeros(num_instruments),
            reference_value: 0.0,
            config,
            series,
            clock,
            rng,
        };
        env.reset()?;

        info!(
            tickers = ?env.config.tickers,
            %start,
            %end,
            max_ticks = env.max_ticks(),
            random_start = env.config.random_start,
            "Environment initialized"
        );

        Ok(env)
    }

    /// Reset the environment for a new episode.
    ///
    /// Random-start mode draws cash, holdings and a starting tick; otherwise
    /// the episode starts at the first trading date with the upper cash bound
    /// and no holdings.
    pub fn reset(&mut self) -> Result<Vec<f64>, EnvError> {
        let n = self.num_instruments();
        let (cash, holdings, start_tick) = if self.config.random_start {
            let cash = self
                .rng
                .gen_range(self.config.starting_cash_lower..=self.config.starting_cash_upper)
                as f64;
            let holdings: Vec<f64> = (0..n)
                .map(|_| self.rng.gen_range(0..=MAX_START_HOLDING) as f64)
                .collect();
            let latest = (self.clock.total_days() as f64 * RANDOM_START_FRACTION).floor() as i64;
            let tick = self.rng.gen_range(-1..=latest);
            (cash, holdings, tick)
        } else {
            (self.config.starting_cash_upper as f64, vec![0.0; n], -1)
        };

        // Land on the first valid trading date at or after the drawn tick
        let mut clock = self.clock;
        clock.set_tick(start_tick);
        clock.advance(&self.series[0])?;
        let prices = self.prices_at(&clock)?;

        let state = StateVector::assemble(cash, &holdings, &prices);
        self.reference_value = state.portfolio_value();
        self.state = state;
        self.clock = clock;

        debug!(
            date = %self.clock.date(),
            session = %self.clock.session(),
            tick = self.clock.tick(),
            cash,
            reference_value = self.reference_value,
            "Environment reset"
        );

        Ok(self.state.to_vec())
    }

    /// Take a step in the environment.
    ///
    /// Trades execute at the current prices, the clock advances to the next
    /// trading tick, and the reward is the portfolio gain since reset at the
    /// new prices. A failed step leaves the environment unchanged.
    pub fn step(&mut self, action: &[i64]) -> Result<StepResult, EnvError> {
        self.validate_action(action)?;

        let prices_old = self.prices_at(&self.clock)?;
        let (holdings, cash) =
            apply_trades(action, self.state.holdings(), self.state.cash(), &prices_old);

        let mut clock = self.clock;
        let tick_delta = clock.advance(&self.series[0])?;
        let prices_new = self.prices_at(&clock)?;

        let reward = episode_gain(cash, &holdings, &prices_new, self.reference_value);
        let state = StateVector::assemble(cash, &holdings, &prices_new);

        self.clock = clock;
        self.state = state;

        let (date, session) = self.clock.date_and_time();
        Ok(StepResult {
            state: self.state.to_vec(),
            reward,
            done: self.is_done(),
            info: StepInfo {
                date,
                session,
                tick: self.clock.tick(),
                tick_delta,
                portfolio_value: self.state.portfolio_value(),
            },
        })
    }

    fn validate_action(&self, action: &[i64]) -> Result<(), EnvError> {
        if action.len() != self.num_instruments() {
            return Err(EnvError::ActionDimensionMismatch {
                expected: self.num_instruments(),
                got: action.len(),
            });
        }
        let max = self.config.max_action;
        if let Some((index, &value)) = action.iter().enumerate().find(|(_, a)| a.abs() > max) {
            return Err(EnvError::ActionOutOfRange { index, value, max });
        }
        Ok(())
    }

    /// Prices of every instrument at the clock's tick, in ticker order
    fn prices_at(&self, clock: &SimClock) -> Result<Vec<f64>, EnvError> {
        let (date, session) = clock.date_and_time();
        self.series
            .iter()
            .map(|series| {
                series
                    .price(date, session)
                    .ok_or_else(|| EnvError::PriceUnavailable {
                        ticker: series.ticker().to_string(),
                        date,
                        session,
                    })
            })
            .collect()
    }

    /// Current prices looked up from the price tables
    pub fn prices(&self) -> Result<Vec<f64>, EnvError> {
        self.prices_at(&self.clock)
    }

    /// Whether the current tick reached the episode bound
    pub fn is_done(&self) -> bool {
        self.clock.is_done()
    }

    /// Cash plus market value of holdings at the current prices
    pub fn portfolio_value(&self) -> f64 {
        self.state.portfolio_value()
    }

    pub fn date_and_time(&self) -> (NaiveDate, Session) {
        self.clock.date_and_time()
    }

    pub fn state(&self) -> &StateVector {
        &self.state
    }

    pub fn cash(&self) -> f64 {
        self.state.cash()
    }

    pub fn holdings(&self) -> &[f64] {
        self.state.holdings()
    }

    /// Portfolio value captured at the last reset
    pub fn reference_value(&self) -> f64 {
        self.reference_value
    }

    pub fn tick(&self) -> i64 {
        self.clock.tick()
    }

    pub fn max_ticks(&self) -> i64 {
        self.clock.max_ticks()
    }

    pub fn tickers(&self) -> &[String] {
        &self.config.tickers
    }

    pub fn config(&self) -> &StockEnvConfig {
        &self.config
    }

    pub fn num_instruments(&self) -> usize {
        self.series.len()
    }

    pub fn action_space(&self) -> ActionSpace {
        self.action_space
    }

    /// Get observation dimension
    pub fn state_dim(&self) -> usize {
        StateVector::dim(self.num_instruments())
    }

    /// Get action dimension
    pub fn action_dim(&self) -> usize {
        self.num_instruments()
    }
}
