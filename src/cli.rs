//! Command line interface

use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "stockrl")]
#[command(version = "0.1.0")]
#[command(about = "Train and evaluate trading policies on historical stock prices", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the policy and save checkpoints
    Train {
        /// Total environment steps
        #[arg(long)]
        iterations: Option<usize>,
    },
    /// Evaluate a saved policy and write the portfolio value CSV
    Test {
        /// Output CSV path
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Train, then evaluate over the test window
    Run {
        /// Total environment steps
        #[arg(long)]
        iterations: Option<usize>,
        /// First date of the test window
        #[arg(long)]
        test_start: Option<String>,
        /// Last date of the test window
        #[arg(long)]
        test_end: Option<String>,
        /// Output CSV path
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Flags shared by every command, applied on top of the loaded configuration
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Config directory
    #[arg(short, long, global = true, default_value = "config")]
    pub config: String,

    /// Comma-separated tickers, e.g. AAPL,MSFT
    #[arg(long, global = true, value_delimiter = ',')]
    pub tickers: Option<Vec<String>>,

    /// First simulated date (MM-DD-YYYY or YYYY-MM-DD)
    #[arg(long, global = true)]
    pub start: Option<String>,

    /// Last simulated date
    #[arg(long, global = true)]
    pub end: Option<String>,

    /// Seed for environment, exploration and policy RNGs
    #[arg(long, global = true, env = "STOCKRL_SEED")]
    pub seed: Option<u64>,

    /// Directory with one {TICKER}.csv per instrument
    #[arg(long, global = true)]
    pub price_dir: Option<String>,
}

impl Overrides {
    /// Apply the flags that were given to `config`
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(tickers) = &self.tickers {
            config.env.tickers = tickers.clone();
        }
        if let Some(start) = &self.start {
            config.env.start_date = start.clone();
        }
        if let Some(end) = &self.end {
            config.env.end_date = end.clone();
        }
        if let Some(seed) = self.seed {
            config.env.seed = Some(seed);
            config.training.seed = Some(seed);
            config.evaluation.seed = Some(seed);
            config.policy.seed = Some(seed);
        }
        if let Some(price_dir) = &self.price_dir {
            config.data.price_dir = price_dir.clone();
        }
    }
}

impl Commands {
    /// Apply command-specific flags to `config`
    pub fn apply(&self, config: &mut AppConfig) {
        match self {
            Commands::Train { iterations } => {
                if let Some(iterations) = iterations {
                    config.training.iterations = *iterations;
                }
            }
            Commands::Test { output } => {
                if let Some(output) = output {
                    config.evaluation.output = output.clone();
                }
            }
            Commands::Run {
                iterations,
                test_start,
                test_end,
                output,
            } => {
                if let Some(iterations) = iterations {
                    config.training.iterations = *iterations;
                }
                if let Some(start) = test_start {
                    config.evaluation.start_date = Some(start.clone());
                }
                if let Some(end) = test_end {
                    config.evaluation.end_date = Some(end.clone());
                }
                if let Some(output) = output {
                    config.evaluation.output = output.clone();
                }
            }
        }
    }
}
