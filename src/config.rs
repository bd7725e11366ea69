use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::rl::config::{EvaluationConfig, PolicyConfig, TrainingConfig};
use crate::rl::environment::StockEnvConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Instruments, date window and starting portfolio
    pub env: StockEnvConfig,
    pub training: TrainingConfig,
    pub evaluation: EvaluationConfig,
    pub policy: PolicyConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding one `{TICKER}.csv` file per instrument
    pub price_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            price_dir: "data/price_data".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rolling log files
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("STOCKRL_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (STOCKRL__ENV__TICKERS=AAPL,MSFT etc.)
            .add_source(
                Environment::with_prefix("STOCKRL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("env.tickers")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Environment used for training runs.
    ///
    /// `env.random_start` is the only random-start switch; evaluation always
    /// rebuilds the environment with it turned off.
    pub fn training_env(&self) -> StockEnvConfig {
        self.env.clone()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.env.tickers.is_empty() {
            errors.push("env.tickers must name at least one instrument".to_string());
        }
        if self.env.starting_cash_lower > self.env.starting_cash_upper {
            errors.push(format!(
                "env.starting_cash_lower ({}) exceeds env.starting_cash_upper ({})",
                self.env.starting_cash_lower, self.env.starting_cash_upper
            ));
        }
        if self.env.max_action <= 0 {
            errors.push("env.max_action must be positive".to_string());
        }
        if self.training.batch_size == 0 {
            errors.push("training.batch_size must be positive".to_string());
        }
        if self.training.buffer_size == 0 {
            errors.push("training.buffer_size must be positive".to_string());
        }
        if self.training.exploration_noise < 0.0 {
            errors.push("training.exploration_noise must be non-negative".to_string());
        }
        if self.evaluation.exploration_noise < 0.0 {
            errors.push("evaluation.exploration_noise must be non-negative".to_string());
        }
        if self.policy.learning_rate <= 0.0 {
            errors.push("policy.learning_rate must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use std::fs;

    #[test]
    fn test_missing_files_give_defaults() {
        let dir = temp_dir().join(format!("stockrl_config_empty_{}", std::process::id()));
        let config = AppConfig::load_from(&dir).unwrap();

        assert_eq!(config.env, StockEnvConfig::default());
        assert_eq!(config.training.iterations, 50_000);
        assert_eq!(config.data.price_dir, "data/price_data");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_toml_overrides_sections() {
        let dir = temp_dir().join(format!("stockrl_config_toml_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("default.toml"),
            r#"
[env]
tickers = ["AAPL", "MSFT"]
start_date = "01-02-2019"
random_start = true

[training]
iterations = 1000
checkpoint_every = 10
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&dir).unwrap();
        assert_eq!(config.env.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(config.env.start_date, "01-02-2019");
        assert!(config.env.random_start);
        assert_eq!(config.env.end_date, "12-31-2018");
        assert_eq!(config.training.iterations, 1000);
        assert_eq!(config.training.checkpoint_every, 10);
        assert_eq!(config.training.warmup_steps, 2_500);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_env_section_controls_random_start() {
        let dir = temp_dir().join(format!("stockrl_config_random_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("default.toml"),
            r#"
[env]
random_start = false

[training]
random_start = true
iterations = 10
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&dir).unwrap();
        assert_eq!(config.training.iterations, 10);
        assert!(!config.training_env().random_start);

        let mut enabled = config.clone();
        enabled.env.random_start = true;
        assert!(enabled.training_env().random_start);
        assert_eq!(enabled.training_env().tickers, config.env.tickers);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_validate_collects_errors() {
        let mut config = AppConfig::default();
        config.env.tickers.clear();
        config.env.starting_cash_lower = 100;
        config.env.starting_cash_upper = 10;
        config.training.batch_size = 0;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
