pub mod catalog;
pub mod grading;
pub mod levels;
pub mod normalize;
pub mod report;
pub mod session;

pub use crate::domain::model::{ActivityIndex, ActivityList, ContentFile, CourseType, Exercise, LevelType};
pub use crate::domain::ports::{BlobStorage, DocumentStore};
pub use crate::utils::error::Result;
