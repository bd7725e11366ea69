//! Training Loop
//!
//! Drives a policy against the stock environment: a warm-up phase of uniform
//! random actions, then noisy policy actions, with every transition handed to
//! the replay buffer and a policy update after each post-warm-up step.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::checkpointing::Checkpointer;
use super::report::PortfolioValueLog;
use crate::data::PriceSource;
use crate::error::{Result, StockRlError};
use crate::rl::config::{EvaluationConfig, TrainingConfig};
use crate::rl::core::ActionSpace;
use crate::rl::environment::{StockEnvConfig, StockEnvironment};
use crate::rl::memory::ReplayBuffer;
use crate::rl::policy::Policy;

/// Training statistics, accumulated over every `train` call on one loop
#[derive(Debug, Clone, Default)]
pub struct TrainingStats {
    /// Total episodes completed
    pub episodes: usize,
    /// Total steps taken
    pub steps: usize,
    /// Total policy updates performed
    pub updates: usize,
    /// Average episode reward
    pub avg_episode_reward: f64,
    /// Average episode length
    pub avg_episode_length: f64,
}

/// Summary of one completed episode
#[derive(Debug, Clone)]
pub struct EpisodeResult {
    /// Sum of per-step rewards
    pub total_reward: f64,
    /// Episode length in steps
    pub length: usize,
    /// Portfolio value at the terminal tick
    pub final_portfolio_value: f64,
    /// Portfolio value at the episode's reset
    pub reference_value: f64,
}

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub stats: TrainingStats,
    pub episodes: Vec<EpisodeResult>,
    /// Whether the run ended on a stop request
    pub stopped_early: bool,
}

/// Outcome of an evaluation run
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub total_reward: f64,
    pub steps: usize,
    pub log: PortfolioValueLog,
}

fn exploration_noise(space: &ActionSpace, fraction: f64) -> Result<Normal<f64>> {
    let std_dev = space.max_magnitude() as f64 * fraction;
    Normal::new(0.0, std_dev).map_err(|e| {
        StockRlError::Validation(format!("invalid exploration noise {}: {}", fraction, e))
    })
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Policy action plus Gaussian noise, clipped and truncated to whole shares
fn noisy_action<P: Policy + ?Sized>(
    policy: &P,
    state: &[f64],
    space: &ActionSpace,
    noise: &Normal<f64>,
    rng: &mut StdRng,
) -> Vec<i64> {
    let raw: Vec<f64> = policy
        .select_action(state)
        .into_iter()
        .map(|a| a + noise.sample(&mut *rng))
        .collect();
    space.clip_and_truncate(&raw)
}

/// Training loop for RL agents
pub struct TrainingLoop {
    /// Training configuration
    config: TrainingConfig,
    /// Policy persistence
    checkpointer: Checkpointer,
    /// Exploration sampling
    rng: StdRng,
    /// Set from outside to end the run after the current step
    stop: Arc<AtomicBool>,
    /// Training statistics
    stats: TrainingStats,
    /// Reward and length sums over every completed episode, for the averages
    reward_total: f64,
    length_total: usize,
}

impl TrainingLoop {
    /// Create a new training loop
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            checkpointer: Checkpointer::new(&config.checkpoint_dir, config.max_checkpoints),
            rng: seeded_rng(config.seed),
            stop: Arc::new(AtomicBool::new(false)),
            stats: TrainingStats::default(),
            reward_total: 0.0,
            length_total: 0,
            config,
        }
    }

    /// Share an externally owned stop flag
    pub fn with_stop_signal(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Flag that ends the run when set
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Get current stats
    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn checkpointer(&self) -> &Checkpointer {
        &self.checkpointer
    }

    /// Run `iterations` environment steps.
    ///
    /// An existing checkpoint named `checkpoint_name` is loaded first. The
    /// policy is saved under that name after every episode, and once more if
    /// the run is stopped early.
    pub fn train<P: Policy + ?Sized>(
        &mut self,
        env: &mut StockEnvironment,
        policy: &mut P,
        replay: &mut ReplayBuffer,
    ) -> Result<TrainingReport> {
        let name = self.config.checkpoint_name.clone();
        if self.checkpointer.exists(&name) {
            self.checkpointer.load(policy, &name)?;
            info!("Loaded policy from checkpoint '{}'", name);
        }

        let space = env.action_space();
        let noise = exploration_noise(&space, self.config.exploration_noise)?;

        let mut state = env.reset()?;
        let mut episode_reward = 0.0;
        let mut episode_steps = 0usize;
        let mut episodes = Vec::new();
        let mut stopped_early = false;

        info!(
            iterations = self.config.iterations,
            warmup_steps = self.config.warmup_steps,
            batch_size = self.config.batch_size,
            max_ticks = env.max_ticks(),
            "Starting training"
        );

        for t in 0..self.config.iterations {
            if self.stop.load(Ordering::Relaxed) {
                warn!("Stop requested after {} steps", t);
                stopped_early = true;
                break;
            }

            episode_steps += 1;

            // Select action randomly or according to policy
            let action = if t < self.config.warmup_steps {
                space.sample(&mut self.rng)
            } else {
                noisy_action(&*policy, &state, &space, &noise, &mut self.rng)
            };

            let result = env.step(&action)?;

            if self.config.log_every > 0 && t % self.config.log_every == 0 {
                debug!(
                    t,
                    reward = result.reward,
                    action = ?action,
                    date = %result.info.date,
                    portfolio_value = result.info.portfolio_value,
                    "Training progress"
                );
            }

            // Time-limit truncation is not a terminal signal for bootstrapping
            let done_flag = if (episode_steps as i64) < env.max_ticks() && result.done {
                1.0
            } else {
                0.0
            };

            replay.add(&state, &action, &result.state, result.reward, done_flag);

            state = result.state;
            episode_reward += result.reward;
            self.stats.steps += 1;

            // Train agent after collecting sufficient data
            if t >= self.config.warmup_steps {
                policy.train(replay, self.config.batch_size)?;
                self.stats.updates += 1;
            }

            if result.done {
                let episode = EpisodeResult {
                    total_reward: episode_reward,
                    length: episode_steps,
                    final_portfolio_value: result.info.portfolio_value,
                    reference_value: env.reference_value(),
                };
                info!(
                    "Episode {} done: steps={}, reward={:.3}, value={:.2} (start {:.2})",
                    self.stats.episodes + 1,
                    episode.length,
                    episode.total_reward,
                    episode.final_portfolio_value,
                    episode.reference_value
                );
                self.reward_total += episode.total_reward;
                self.length_total += episode.length;
                episodes.push(episode);

                state = env.reset()?;
                episode_reward = 0.0;
                episode_steps = 0;
                self.stats.episodes += 1;

                self.checkpointer.save(&*policy, &name)?;
                if self.config.checkpoint_every > 0
                    && self.stats.episodes % self.config.checkpoint_every == 0
                {
                    self.checkpointer
                        .save_snapshot(&*policy, &name, self.stats.episodes)?;
                }
            }
        }

        if stopped_early {
            self.checkpointer.save(&*policy, &name)?;
        }

        if self.stats.episodes > 0 {
            let n = self.stats.episodes as f64;
            self.stats.avg_episode_reward = self.reward_total / n;
            self.stats.avg_episode_length = self.length_total as f64 / n;
        }

        info!(
            "Training finished: steps={}, episodes={}, updates={}",
            self.stats.steps, self.stats.episodes, self.stats.updates
        );

        Ok(TrainingReport {
            stats: self.stats.clone(),
            episodes,
            stopped_early,
        })
    }
}

/// Evaluate a policy over one deterministic episode.
///
/// The environment is rebuilt from `env_config` with random start disabled,
/// over the evaluation window when one is configured.
/// Actions are the policy output plus exploration noise; when
/// `train_during_eval` is set the policy keeps learning from `replay`.
pub fn evaluate<P: Policy + ?Sized>(
    env_config: &StockEnvConfig,
    source: &dyn PriceSource,
    policy: &mut P,
    replay: &ReplayBuffer,
    config: &EvaluationConfig,
) -> Result<EvaluationReport> {
    let mut env_config = StockEnvConfig {
        random_start: false,
        ..env_config.clone()
    };
    if let Some(start) = &config.start_date {
        env_config.start_date = start.clone();
    }
    if let Some(end) = &config.end_date {
        env_config.end_date = end.clone();
    }
    let mut env = StockEnvironment::new(env_config, source)?;
    info!("Testing policy");

    let space = env.action_space();
    let noise = exploration_noise(&space, config.exploration_noise)?;
    let mut rng = seeded_rng(config.seed);

    let mut state = env.reset()?;
    let mut log = PortfolioValueLog::new();
    log.record_env(&env);

    let mut total_reward = 0.0;
    let mut steps = 0usize;
    let mut done = false;

    while !done {
        let action = noisy_action(&*policy, &state, &space, &noise, &mut rng);
        let result = env.step(&action)?;

        state = result.state;
        total_reward += result.reward;
        steps += 1;
        done = result.done;

        if config.train_during_eval {
            policy.train(replay, config.batch_size)?;
        }
        log.record_env(&env);
    }

    info!(
        steps,
        total_reward,
        final_value = log.final_value(),
        "Evaluation finished"
    );

    Ok(EvaluationReport {
        total_reward,
        steps,
        log,
    })
}
