use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stockrl::cli::{Cli, Commands};
use stockrl::config::{AppConfig, LoggingConfig};
use stockrl::data::CsvPriceSource;
use stockrl::error::{Result, StockRlError};
use stockrl::rl::{
    evaluate, Checkpointer, LinearPolicy, ReplayBuffer, StateVector, StockEnvironment,
    TrainingLoop,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.overrides.config)?;
    cli.overrides.apply(&mut config);
    cli.command.apply(&mut config);

    init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("Invalid configuration: {}", e);
        }
        return Err(StockRlError::Validation(errors.join("; ")));
    }

    let stop = Arc::new(AtomicBool::new(false));
    let worker_stop = Arc::clone(&stop);
    let command = cli.command;

    // The training loop is synchronous; keep it off the async workers
    let mut handle =
        tokio::task::spawn_blocking(move || run_command(&command, &config, worker_stop));

    let joined = tokio::select! {
        joined = &mut handle => joined,
        _ = shutdown_signal() => {
            println!("\n\x1b[33mShutting down, saving policy...\x1b[0m");
            stop.store(true, Ordering::Relaxed);
            handle.await
        }
    };

    joined.map_err(|e| StockRlError::Other(e.into()))?
}

fn run_command(command: &Commands, config: &AppConfig, stop: Arc<AtomicBool>) -> Result<()> {
    let source = CsvPriceSource::new(&config.data.price_dir);
    let mut policy = build_policy(config);
    let mut replay = ReplayBuffer::new(config.training.buffer_size);

    match command {
        Commands::Train { .. } => {
            train(config, &source, &mut policy, &mut replay, stop)?;
        }
        Commands::Test { .. } => {
            let checkpointer =
                Checkpointer::new(&config.training.checkpoint_dir, config.training.max_checkpoints);
            checkpointer.load(&mut policy, &config.training.checkpoint_name)?;
            info!("Loaded policy '{}'", config.training.checkpoint_name);
            test(config, &source, &mut policy, &replay)?;
        }
        Commands::Run { .. } => {
            if train(config, &source, &mut policy, &mut replay, Arc::clone(&stop))? {
                warn!("Training was interrupted, skipping evaluation");
                return Ok(());
            }
            test(config, &source, &mut policy, &replay)?;
        }
    }

    Ok(())
}

fn build_policy(config: &AppConfig) -> LinearPolicy {
    let num_instruments = config.env.tickers.len();
    LinearPolicy::new(
        StateVector::dim(num_instruments),
        num_instruments,
        config.env.max_action as f64,
        config.policy.learning_rate,
        config.policy.seed,
    )
}

/// Returns whether training was stopped early
fn train(
    config: &AppConfig,
    source: &CsvPriceSource,
    policy: &mut LinearPolicy,
    replay: &mut ReplayBuffer,
    stop: Arc<AtomicBool>,
) -> Result<bool> {
    let mut env = StockEnvironment::new(config.training_env(), source)?;

    println!("\x1b[36m");
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                   STOCKRL - Training Mode                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!("\x1b[0m");
    println!("  Tickers: {}", config.env.tickers.join(", "));
    println!("  Window: {} to {}", config.env.start_date, config.env.end_date);
    println!("  Iterations: {}", config.training.iterations);
    println!("  Random start: {}", config.env.random_start);

    let mut trainer = TrainingLoop::new(config.training.clone()).with_stop_signal(stop);
    let report = trainer.train(&mut env, policy, replay)?;

    println!("\x1b[32m✓ Training complete\x1b[0m");
    println!("  Episodes: {}", report.stats.episodes);
    println!("  Steps: {}", report.stats.steps);
    println!("  Avg episode reward: {:.2}", report.stats.avg_episode_reward);

    Ok(report.stopped_early)
}

fn test(
    config: &AppConfig,
    source: &CsvPriceSource,
    policy: &mut LinearPolicy,
    replay: &ReplayBuffer,
) -> Result<()> {
    let report = evaluate(&config.env, source, policy, replay, &config.evaluation)?;
    report.log.write_csv(&config.evaluation.output)?;

    println!("\x1b[32m✓ Evaluation complete\x1b[0m");
    println!("  Steps: {}", report.steps);
    if let Some(value) = report.log.final_value() {
        println!("  Final portfolio value: {:.2}", value);
    }
    println!("  Results: {}", config.evaluation.output);

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},stockrl=debug", logging.level)));

    // File logging only when a directory is configured (STOCKRL_LOG_DIR wins)
    let log_dir = std::env::var("STOCKRL_LOG_DIR")
        .ok()
        .or_else(|| logging.dir.clone());

    // `tracing_appender::rolling::daily` panics if it can't create the initial
    // log file, so the directory is checked first.
    let file_layer = log_dir.as_ref().and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "Warning: Could not create log directory {} ({}), file logging disabled",
                dir, e
            );
            return None;
        }

        let file_appender = tracing_appender::rolling::daily(dir, "stockrl.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Keep the guard alive for the life of the process
        Box::leak(Box::new(guard));

        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
    });

    let console_layer = if logging.json {
        tracing_subscriber::fmt::layer().json().with_target(true).boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    };

    let file_logging_enabled = file_layer.is_some();
    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let (true, Some(dir)) = (file_logging_enabled, log_dir) {
        eprintln!("Logging to: {}/stockrl.log", dir);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
