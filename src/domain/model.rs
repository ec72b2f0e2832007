use crate::utils::error::PracticeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Course families available in the content dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CourseType {
    Listening,
    Reading,
    UseOfEnglish,
    Writing,
    Speaking,
    GrammarTests,
}

impl CourseType {
    pub fn all() -> [CourseType; 6] {
        [
            CourseType::Listening,
            CourseType::Reading,
            CourseType::UseOfEnglish,
            CourseType::Writing,
            CourseType::Speaking,
            CourseType::GrammarTests,
        ]
    }

    /// Module name as stored in `ContentFile::module` and in relpaths.
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseType::Listening => "listening",
            CourseType::Reading => "reading",
            CourseType::UseOfEnglish => "use-of-english",
            CourseType::Writing => "writing",
            CourseType::Speaking => "speaking",
            CourseType::GrammarTests => "grammar-tests",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CourseType::Listening => "Listening",
            CourseType::Reading => "Reading",
            CourseType::UseOfEnglish => "Use of English",
            CourseType::Writing => "Writing",
            CourseType::Speaking => "Speaking",
            CourseType::GrammarTests => "Grammar Tests",
        }
    }
}

impl fmt::Display for CourseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseType {
    type Err = PracticeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        CourseType::all()
            .into_iter()
            .find(|course| course.as_str() == wanted)
            .ok_or_else(|| PracticeError::UnknownCourse(s.to_string()))
    }
}

/// CEFR levels that have content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelType {
    B1,
    B2,
    C1,
    C2,
}

impl LevelType {
    pub fn all() -> [LevelType; 4] {
        [LevelType::B1, LevelType::B2, LevelType::C1, LevelType::C2]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelType::B1 => "b1",
            LevelType::B2 => "b2",
            LevelType::C1 => "c1",
            LevelType::C2 => "c2",
        }
    }

    /// Form used on user profiles ("C1").
    pub fn as_upper(&self) -> &'static str {
        match self {
            LevelType::B1 => "B1",
            LevelType::B2 => "B2",
            LevelType::C1 => "C1",
            LevelType::C2 => "C2",
        }
    }
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelType {
    type Err = PracticeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LevelType::all()
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| PracticeError::UnknownLevel(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRef {
    #[serde(default)]
    pub bucket: String,
    pub path: String,
}

/// One record of the `contentFiles` collection.
///
/// Records come from an uncontrolled export, so everything except the path and
/// file name is optional and `group` is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFile {
    pub relpath: String,
    pub filename: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub group: Option<Value>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default, rename = "size_bytes", alias = "sizeBytes")]
    pub size_bytes: Option<u64>,
    /// RFC 3339 string or a `{seconds, nanoseconds}` timestamp object.
    #[serde(default)]
    pub updated_at: Option<Value>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub stored_in_storage: bool,
    #[serde(default)]
    pub storage: Option<StorageRef>,
}

impl ContentFile {
    /// Minimal record for a dump file; module, level and group come from the path.
    pub fn from_relpath(relpath: &str, data: Value) -> Self {
        let parts: Vec<&str> = relpath.split('/').collect();
        let filename = parts.last().copied().unwrap_or(relpath).to_string();
        let module = (parts.len() >= 2).then(|| parts[0].to_string());
        let level = (parts.len() >= 3).then(|| parts[1].to_string());
        let group = (parts.len() >= 4).then(|| Value::String(parts[2].to_string()));

        Self {
            relpath: relpath.to_string(),
            filename,
            module,
            level,
            group,
            sha256: None,
            size_bytes: None,
            updated_at: None,
            source: Some("dump".to_string()),
            schema_version: Some(1),
            data: Some(data),
            stored_in_storage: false,
            storage: None,
        }
    }

    /// Path segment at `index`, or "" when the path is shorter.
    pub fn relpath_segment(&self, index: usize) -> &str {
        self.relpath.split('/').nth(index).unwrap_or("")
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        match self.updated_at.as_ref()? {
            Value::String(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            Value::Object(map) => {
                let seconds = map
                    .get("_seconds")
                    .or_else(|| map.get("seconds"))
                    .and_then(Value::as_i64)?;
                let nanos = map
                    .get("_nanoseconds")
                    .or_else(|| map.get("nanoseconds"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                DateTime::from_timestamp(seconds, nanos as u32)
            }
            _ => None,
        }
    }

    /// `data.title` when it is a string.
    pub fn title(&self) -> &str {
        self.data
            .as_ref()
            .and_then(|data| data.get("title"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// A resolved exercise, keyed by (course, level, activity, id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub course: CourseType,
    pub level: LevelType,
    pub activity: String,
    pub relpath: String,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityIndex {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityList<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub has_more: bool,
}

impl<T> ActivityList<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: false,
        }
    }
}

/// Equality filter over `ContentFile` fields, mirroring the store's query surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    pub relpath: Option<String>,
    pub module: Option<String>,
    pub level: Option<String>,
    pub limit: Option<usize>,
}

impl DocumentQuery {
    pub fn by_relpath(relpath: &str) -> Self {
        Self {
            relpath: Some(relpath.to_string()),
            limit: Some(1),
            ..Self::default()
        }
    }

    pub fn by_module(course: CourseType) -> Self {
        Self {
            module: Some(course.as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn by_module_level(course: CourseType, level: LevelType) -> Self {
        Self {
            module: Some(course.as_str().to_string()),
            level: Some(level.as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, doc: &ContentFile) -> bool {
        if let Some(relpath) = &self.relpath {
            if &doc.relpath != relpath {
                return false;
            }
        }
        if let Some(module) = &self.module {
            if doc.module.as_ref() != Some(module) {
                return false;
            }
        }
        if let Some(level) = &self.level {
            if doc.level.as_ref() != Some(level) {
                return false;
            }
        }
        true
    }
}
