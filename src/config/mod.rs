pub mod levels;

pub use levels::{
    load_level_config, CategoryConfig, ExamLevel, LevelConfig, MockExamPolicy, OverallThresholds,
    TaskDistribution, Thresholds,
};
