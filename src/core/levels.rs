use crate::domain::model::LevelType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a level is open to learners, as kept in the `englishLevels` documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStatus {
    pub id: String,
    pub name: String,
    pub enabled: bool,
}

impl LevelStatus {
    /// `name` defaults to the id and `enabled` to true.
    pub fn from_document(id: &str, data: &Value) -> Self {
        Self {
            id: id.to_string(),
            name: data
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .unwrap_or(id)
                .to_string(),
            enabled: data.get("enabled") != Some(&Value::Bool(false)),
        }
    }
}

/// The learner's current level and the levels they can pick from.
#[derive(Debug, Clone)]
pub struct LevelSelector {
    available: Vec<LevelType>,
    current: LevelType,
}

impl Default for LevelSelector {
    fn default() -> Self {
        Self {
            available: LevelType::all().to_vec(),
            current: LevelType::C1,
        }
    }
}

impl LevelSelector {
    pub fn new(current: LevelType) -> Self {
        Self {
            current,
            ..Self::default()
        }
    }

    pub fn available_levels(&self) -> Vec<LevelType> {
        self.available.clone()
    }

    pub fn current_level(&self) -> LevelType {
        self.current
    }

    /// Returns true when the level was accepted.
    pub fn set_level(&mut self, level: LevelType) -> bool {
        if self.available.contains(&level) {
            self.current = level;
            true
        } else {
            false
        }
    }

    /// Drop levels an administrator disabled; the current level moves to the
    /// first remaining one if it was removed.
    pub fn apply_statuses(&mut self, statuses: &[LevelStatus]) {
        self.available.retain(|level| {
            statuses
                .iter()
                .find(|status| status.id.eq_ignore_ascii_case(level.as_str()))
                .map(|status| status.enabled)
                .unwrap_or(true)
        });
        if !self.available.contains(&self.current) {
            if let Some(first) = self.available.first() {
                self.current = *first;
            }
        }
    }

    /// Map the level stored on a user profile to one with content.
    ///
    /// New accounts are created with "A1", which has no content, so anything
    /// unknown resolves to the current level.
    pub fn resolve_user_level(&self, profile_level: Option<&str>) -> LevelType {
        profile_level
            .and_then(|level| level.parse::<LevelType>().ok())
            .filter(|level| self.available.contains(level))
            .unwrap_or(self.current)
    }
}
