use crate::core::grading::{GradeReport, ItemStatus};
use crate::domain::model::{CourseType, Exercise, LevelType};
use crate::domain::ports::BlobStorage;
use crate::utils::error::{PracticeError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A graded attempt, ready to be exported.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub course: CourseType,
    pub level: LevelType,
    pub activity: String,
    pub exercise_id: String,
    pub relpath: String,
    pub graded_at: DateTime<Utc>,
    pub correct: usize,
    pub total: usize,
    pub percent: f64,
    pub report: GradeReport,
}

impl AttemptRecord {
    pub fn new(exercise: &Exercise, report: GradeReport) -> Self {
        Self {
            course: exercise.course,
            level: exercise.level,
            activity: exercise.activity.clone(),
            exercise_id: exercise.id.clone(),
            relpath: exercise.relpath.clone(),
            graded_at: Utc::now(),
            correct: report.correct,
            total: report.total,
            percent: report.percent(),
            report,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One row per question.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["exercise", "key", "given", "expected", "status"])?;

        let exercise = format!(
            "{}/{}/{}/{}",
            self.course, self.level, self.activity, self.exercise_id
        );
        for outcome in &self.report.outcomes {
            let status = match outcome.status {
                ItemStatus::Correct => "correct",
                ItemStatus::Incorrect => "incorrect",
                ItemStatus::Unanswered => "unanswered",
            };
            writer.write_record([
                exercise.as_str(),
                outcome.key.as_str(),
                outcome.given.as_deref().unwrap_or(""),
                outcome.expected.as_str(),
                status,
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| PracticeError::IoError(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| PracticeError::IoError(std::io::Error::other(e)))
    }

    /// Write as CSV or JSON, chosen by the extension of `path`.
    pub async fn save(&self, storage: &dyn BlobStorage, path: &str) -> Result<()> {
        let body = if path.to_ascii_lowercase().ends_with(".csv") {
            self.to_csv()?
        } else {
            self.to_json()?
        };

        tracing::debug!("Writing attempt report ({} bytes) to {}", body.len(), path);
        storage.write_file(path, body.as_bytes()).await
    }
}
