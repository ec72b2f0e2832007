pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HttpBlobStorage, HttpDocumentStore, LocalStorage, MemoryStore};
pub use config::AppConfig;
pub use core::{
    catalog::ContentCatalog, grading::GradingPolicy, levels::LevelSelector, report::AttemptRecord,
    session::ExerciseSession,
};
pub use domain::model::{CourseType, Exercise, LevelType};
pub use utils::error::{PracticeError, Result};
