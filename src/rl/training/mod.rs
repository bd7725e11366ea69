//! Training Infrastructure
//!
//! Training loops, checkpointing, and evaluation reporting.

pub mod checkpointing;
pub mod report;
pub mod trainer;

pub use checkpointing::{episode_name, Checkpointer};
pub use report::{time_label, PortfolioRecord, PortfolioValueLog};
pub use trainer::{
    evaluate, EpisodeResult, EvaluationReport, TrainingLoop, TrainingReport, TrainingStats,
};
