pub mod early_stop;
pub mod epoch_stats;
pub mod loop_fn;
pub mod report;
pub mod train_config;
pub mod trainer;

pub use epoch_stats::EpochStats;
pub use loop_fn::train_loop;
pub use report::{StopReason, TrainReport};
pub use train_config::{RestartPolicy, TrainConfig, TrainMode};
pub use trainer::{evaluate, train_epoch};
