use thiserror::Error;

#[derive(Error, Debug)]
pub enum PracticeError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Document store request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Document store returned {status} for {endpoint}")]
    StoreResponse { status: u16, endpoint: String },

    #[error("Document not found: {relpath}")]
    DocumentNotFound { relpath: String },

    #[error("Exercise not found: {course}/{level}/{activity}/{id}")]
    ExerciseNotFound {
        course: String,
        level: String,
        activity: String,
        id: String,
    },

    #[error("Document {relpath} is kept in blob storage, but no blob storage is configured")]
    StoredInBlob { relpath: String },

    #[error("Unknown course: {0}")]
    UnknownCourse(String),

    #[error("Unknown level: {0}")]
    UnknownLevel(String),

    #[error("Invalid answer sheet: {message}")]
    InvalidAnswerSheet { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Content,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PracticeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PracticeError::ConfigValidationError { .. }
            | PracticeError::InvalidConfigValueError { .. }
            | PracticeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            PracticeError::ApiError(_) | PracticeError::StoreResponse { .. } => {
                ErrorCategory::Network
            }
            PracticeError::DocumentNotFound { .. }
            | PracticeError::ExerciseNotFound { .. }
            | PracticeError::StoredInBlob { .. }
            | PracticeError::SerializationError(_)
            | PracticeError::ZipError(_) => ErrorCategory::Content,
            PracticeError::UnknownCourse(_)
            | PracticeError::UnknownLevel(_)
            | PracticeError::InvalidAnswerSheet { .. } => ErrorCategory::Input,
            PracticeError::IoError(_) | PracticeError::CsvError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PracticeError::ApiError(_) | PracticeError::StoreResponse { .. } => {
                ErrorSeverity::Medium
            }
            PracticeError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the configuration file and command line flags",
            ErrorCategory::Network => "Check the document store endpoint and token, then retry",
            ErrorCategory::Content => "Check that the content dump contains the requested document",
            ErrorCategory::Input => "Check the course, level and answer sheet arguments",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PracticeError::ExerciseNotFound { .. } => {
                "Error loading exercise. Please try again.".to_string()
            }
            PracticeError::DocumentNotFound { relpath } => {
                format!("Content file '{}' does not exist", relpath)
            }
            PracticeError::ApiError(_) | PracticeError::StoreResponse { .. } => {
                "The content service could not be reached. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PracticeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_relevant_severity() {
        let err = PracticeError::StoreResponse {
            status: 503,
            endpoint: "http://localhost/contentFiles".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let err = PracticeError::UnknownLevel("a1".to_string());
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_exercise_not_found_message() {
        let err = PracticeError::ExerciseNotFound {
            course: "reading".to_string(),
            level: "b2".to_string(),
            activity: "signs".to_string(),
            id: "7".to_string(),
        };
        assert_eq!(err.to_string(), "Exercise not found: reading/b2/signs/7");
        assert_eq!(
            err.user_friendly_message(),
            "Error loading exercise. Please try again."
        );
    }
}
