use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::fs;
use std::path::{Path, PathBuf};
use stockrl::data::CsvPriceSource;
use stockrl::rl::{
    evaluate, Checkpointer, EvaluationConfig, LinearPolicy, ReplayBuffer, StateVector,
    StockEnvConfig, StockEnvironment, TrainingConfig, TrainingLoop,
};

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("stockrl_pipeline_{}_{}", name, std::process::id()))
}

/// Write a Yahoo-style price file covering the weekdays of Jan-Feb 2020
fn write_prices(dir: &Path, ticker: &str, base: f64) {
    let mut out = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    let mut date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut i = 0.0;
    while date.month() <= 2 {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            let open = base + (i * 0.7_f64).sin() * 2.0;
            let close = open + 0.25;
            out.push_str(&format!(
                "{},{:.2},{:.2},{:.2},{:.2},{:.2},1000\n",
                date.format("%Y-%m-%d"),
                open,
                close + 1.0,
                open - 1.0,
                close,
                close
            ));
            i += 1.0;
        }
        date += Duration::days(1);
    }
    fs::write(dir.join(format!("{}.csv", ticker)), out).unwrap();
}

fn env_config() -> StockEnvConfig {
    StockEnvConfig {
        tickers: vec!["AAA".to_string(), "BBB".to_string()],
        start_date: "01-02-2020".to_string(),
        end_date: "01-31-2020".to_string(),
        starting_cash_lower: 500,
        starting_cash_upper: 2000,
        random_start: true,
        max_action: 10,
        seed: Some(21),
    }
}

#[test]
fn train_then_evaluate_from_csv_prices() {
    let root = scratch("full");
    let price_dir = root.join("prices");
    fs::create_dir_all(&price_dir).unwrap();
    write_prices(&price_dir, "AAA", 30.0);
    write_prices(&price_dir, "BBB", 55.0);

    let source = CsvPriceSource::new(&price_dir);
    let mut env = StockEnvironment::new(env_config(), &source).unwrap();
    let mut policy = LinearPolicy::new(StateVector::dim(2), 2, 10.0, 0.01, Some(4));
    let mut replay = ReplayBuffer::new(10_000);

    let training = TrainingConfig {
        iterations: 200,
        warmup_steps: 50,
        batch_size: 16,
        checkpoint_dir: root.join("checkpoints").to_string_lossy().into_owned(),
        checkpoint_every: 2,
        max_checkpoints: 2,
        seed: Some(8),
        ..Default::default()
    };
    let mut trainer = TrainingLoop::new(training.clone());
    let report = trainer.train(&mut env, &mut policy, &mut replay).unwrap();

    assert_eq!(report.stats.steps, 200);
    assert_eq!(report.stats.updates, 150);
    assert_eq!(replay.len(), 200);
    assert!(report.stats.episodes >= 1);
    assert!(policy.updates() > 0);

    let checkpointer = Checkpointer::new(&training.checkpoint_dir, training.max_checkpoints);
    assert!(checkpointer.exists("initial_policy"));
    if report.stats.episodes >= 2 {
        assert!(checkpointer.latest_snapshot("initial_policy").is_some());
    }

    let output = root.join("results").join("test_results.csv");
    let evaluation = EvaluationConfig {
        output: output.to_string_lossy().into_owned(),
        start_date: Some("02-03-2020".to_string()),
        end_date: Some("02-14-2020".to_string()),
        batch_size: 16,
        seed: Some(8),
        ..Default::default()
    };
    let eval = evaluate(&env_config(), &source, &mut policy, &replay, &evaluation).unwrap();
    eval.log.write_csv(&evaluation.output).unwrap();

    // Feb 3 (Mon) to Feb 14 (Fri): 22 ticks, one weekend skip of 4 extra ticks
    assert_eq!(eval.steps, 18);
    assert_eq!(eval.log.len(), 19);

    let written = fs::read_to_string(&output).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("Date,Portfolio Value"));
    assert!(lines.next().unwrap().starts_with("2020-02-03 09:30AM,2000"));
    assert!(written.trim_end().lines().last().unwrap().starts_with("2020-02-14 09:30AM,"));

    fs::remove_dir_all(root).ok();
}

#[test]
fn resumed_training_loads_saved_policy() {
    let root = scratch("resume");
    let price_dir = root.join("prices");
    fs::create_dir_all(&price_dir).unwrap();
    write_prices(&price_dir, "AAA", 30.0);
    write_prices(&price_dir, "BBB", 55.0);
    let source = CsvPriceSource::new(&price_dir);

    let training = TrainingConfig {
        iterations: 120,
        warmup_steps: 10,
        batch_size: 8,
        checkpoint_dir: root.join("checkpoints").to_string_lossy().into_owned(),
        seed: Some(1),
        ..Default::default()
    };

    let mut env = StockEnvironment::new(env_config(), &source).unwrap();
    let mut policy = LinearPolicy::new(StateVector::dim(2), 2, 10.0, 0.01, Some(4));
    let mut replay = ReplayBuffer::new(1000);
    TrainingLoop::new(training.clone())
        .train(&mut env, &mut policy, &mut replay)
        .unwrap();

    let checkpointer = Checkpointer::new(&training.checkpoint_dir, training.max_checkpoints);
    let mut saved = LinearPolicy::new(StateVector::dim(2), 2, 10.0, 0.01, Some(4));
    checkpointer.load(&mut saved, "initial_policy").unwrap();
    assert!(saved.updates() > 0);

    // A fresh policy picks the checkpoint up before its first step
    let mut fresh = LinearPolicy::new(StateVector::dim(2), 2, 10.0, 0.01, Some(4));
    let resume = TrainingConfig {
        iterations: 1,
        warmup_steps: 10,
        ..training
    };
    TrainingLoop::new(resume)
        .train(&mut env, &mut fresh, &mut ReplayBuffer::new(10))
        .unwrap();
    assert_eq!(fresh.updates(), saved.updates());

    fs::remove_dir_all(root).ok();
}
