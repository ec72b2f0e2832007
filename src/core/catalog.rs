use crate::core::normalize::{
    id_from_filename, is_auxiliary_file, is_bare_exercise, json_id, natural_cmp, slugify,
};
use crate::domain::model::{
    ActivityIndex, ActivityList, ContentFile, CourseType, DocumentQuery, Exercise, LevelType,
};
use crate::domain::ports::{BlobStorage, DocumentStore};
use crate::utils::error::{PracticeError, Result};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const DEFAULT_IMAGE_BASE_URL: &str = "https://englishapps.app/img/speaking";
pub const DEFAULT_EXERCISE_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    pub default_limit: usize,
    pub image_base_url: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_EXERCISE_LIMIT,
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
        }
    }
}

/// Resolves courses, activities and exercises from the `contentFiles` documents.
pub struct ContentCatalog<S: DocumentStore> {
    store: S,
    blobs: Option<Arc<dyn BlobStorage>>,
    settings: CatalogSettings,
}

impl<S: DocumentStore> ContentCatalog<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            blobs: None,
            settings: CatalogSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: CatalogSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_blob_storage(mut self, blobs: Arc<dyn BlobStorage>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Parsed JSON of the document at `relpath`.
    pub async fn get_json(&self, relpath: &str) -> Result<Value> {
        let docs = self.store.query(&DocumentQuery::by_relpath(relpath)).await?;
        let doc = docs
            .into_iter()
            .next()
            .ok_or_else(|| PracticeError::DocumentNotFound {
                relpath: relpath.to_string(),
            })?;

        self.document_data(doc).await
    }

    pub async fn list_levels(&self, course: CourseType) -> Vec<LevelType> {
        if course == CourseType::GrammarTests {
            return vec![LevelType::B2, LevelType::C1, LevelType::C2];
        }

        match self.store.query(&DocumentQuery::by_module(course)).await {
            Ok(docs) => {
                let levels: BTreeSet<LevelType> = docs
                    .iter()
                    .filter_map(|doc| doc.level.as_deref())
                    .filter_map(|level| level.parse().ok())
                    .collect();
                levels.into_iter().collect()
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to list levels of {}: {}, using all levels", course, e);
                LevelType::all().to_vec()
            }
        }
    }

    pub async fn list_activities(
        &self,
        course: CourseType,
        level: LevelType,
    ) -> Result<ActivityList<ActivityIndex>> {
        let docs = self
            .store
            .query(&DocumentQuery::by_module_level(course, level))
            .await?;

        let mut groups: BTreeMap<String, usize> = BTreeMap::new();
        for doc in &docs {
            let group_name = group_name(doc);
            if group_name.is_empty() || !is_exercise_document(doc) {
                continue;
            }
            *groups.entry(group_name).or_insert(0) += 1;
        }

        let mut items: Vec<ActivityIndex> = groups
            .into_iter()
            .map(|(name, count)| ActivityIndex {
                slug: Some(slugify(&name)),
                count: Some(count),
                description: None,
                name,
            })
            .collect();
        items.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });

        tracing::debug!("Found {} activities for {}/{}", items.len(), course, level);
        Ok(ActivityList {
            total: items.len(),
            items,
            has_more: false,
        })
    }

    /// Exercises of one activity. `activity` may be the group name or its slug.
    pub async fn list_exercises(
        &self,
        course: CourseType,
        level: LevelType,
        activity: &str,
        limit: Option<usize>,
    ) -> Result<ActivityList<Exercise>> {
        let limit = limit.unwrap_or(self.settings.default_limit);
        let docs = self
            .store
            .query(&DocumentQuery::by_module_level(course, level))
            .await?;

        let mut matching: Vec<ContentFile> = docs
            .into_iter()
            .filter(|doc| activity_matches(doc, activity) && is_exercise_document(doc))
            .collect();
        matching.sort_by(|a, b| natural_cmp(&a.filename, &b.filename));
        matching.truncate(limit);

        let items: Vec<Exercise> = matching
            .into_iter()
            .map(|doc| Exercise {
                id: exercise_id(&doc),
                course,
                level,
                activity: activity.to_string(),
                relpath: doc.relpath,
                payload: doc.data.unwrap_or_else(|| json!({})),
            })
            .collect();

        Ok(ActivityList {
            total: items.len(),
            has_more: items.len() >= limit,
            items,
        })
    }

    pub async fn get_exercise(
        &self,
        course: CourseType,
        level: LevelType,
        activity: &str,
        exercise_id: &str,
    ) -> Result<Exercise> {
        let docs = self
            .store
            .query(&DocumentQuery::by_module_level(course, level))
            .await?;

        let doc = docs
            .into_iter()
            .find(|doc| activity_matches(doc, activity) && self::exercise_id(doc) == exercise_id)
            .ok_or_else(|| PracticeError::ExerciseNotFound {
                course: course.to_string(),
                level: level.to_string(),
                activity: activity.to_string(),
                id: exercise_id.to_string(),
            })?;

        let relpath = doc.relpath.clone();
        let payload = match self.document_data(doc).await? {
            Value::Null => json!({}),
            data => data,
        };

        tracing::debug!("Resolved exercise {} from {}", exercise_id, relpath);
        Ok(Exercise {
            id: exercise_id.to_string(),
            course,
            level,
            activity: activity.to_string(),
            relpath,
            payload,
        })
    }

    /// Entries of the course/level index document, for stores that ship one.
    pub async fn activity_index(
        &self,
        course: CourseType,
        level: LevelType,
    ) -> Result<Vec<ActivityIndex>> {
        let data = self.get_json(&index_path(course, level)).await?;
        let entries = match data {
            Value::Array(entries) => entries,
            Value::Object(mut obj) => match obj.remove("activities") {
                Some(Value::Array(entries)) => entries,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        Ok(entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(ActivityIndex {
                    slug: Some(slugify(&name)),
                    name,
                    count: None,
                    description: None,
                }),
                other => serde_json::from_value::<ActivityIndex>(other).ok(),
            })
            .collect())
    }

    pub fn speaking_image_url(&self, level: LevelType, part: &str, image: &str) -> String {
        format!(
            "{}/{}/{}/{}.jpeg",
            self.settings.image_base_url.trim_end_matches('/'),
            level,
            slugify(part),
            image
        )
    }

    pub fn course_name(&self, course: CourseType) -> &'static str {
        course.display_name()
    }

    pub fn available_courses(&self) -> Vec<CourseType> {
        CourseType::all().to_vec()
    }

    async fn document_data(&self, doc: ContentFile) -> Result<Value> {
        if !doc.stored_in_storage {
            return Ok(doc.data.unwrap_or(Value::Null));
        }

        let blobs = self
            .blobs
            .as_ref()
            .ok_or_else(|| PracticeError::StoredInBlob {
                relpath: doc.relpath.clone(),
            })?;
        let path = doc
            .storage
            .as_ref()
            .map(|storage| storage.path.clone())
            .unwrap_or_else(|| doc.relpath.clone());

        tracing::debug!("Reading {} from blob storage", path);
        let bytes = blobs.read_file(&path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Group name from the `group` field, falling back to the third relpath segment.
fn group_name(doc: &ContentFile) -> String {
    match &doc.group {
        Some(Value::String(group)) if !group.is_empty() => group.clone(),
        _ if doc.relpath.split('/').count() >= 3 => doc.relpath_segment(2).to_string(),
        _ => String::new(),
    }
}

fn activity_matches(doc: &ContentFile, activity: &str) -> bool {
    let group = doc.relpath_segment(2);
    group == activity || slugify(group) == slugify(activity)
}

fn is_exercise_document(doc: &ContentFile) -> bool {
    !is_auxiliary_file(&doc.filename) && !is_bare_exercise(doc.title(), &doc.filename)
}

/// `data.id` when present, otherwise the file name without `.json`.
fn exercise_id(doc: &ContentFile) -> String {
    doc.data
        .as_ref()
        .and_then(|data| data.get("id"))
        .and_then(json_id)
        .unwrap_or_else(|| id_from_filename(&doc.filename))
}

pub fn index_path(course: CourseType, level: LevelType) -> String {
    match course {
        CourseType::Writing | CourseType::Speaking => format!("{}/{}/activities.json", course, level),
        CourseType::GrammarTests => {
            format!("{}/{}/{}/index.json", course, level, grammar_difficulty(level))
        }
        _ => format!("{}/{}/index.json", course, level),
    }
}

pub fn grammar_difficulty(level: LevelType) -> &'static str {
    match level {
        LevelType::B1 | LevelType::B2 => "Beginner",
        LevelType::C1 => "Intermediate",
        LevelType::C2 => "Expert",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use async_trait::async_trait;

    struct FailingStore;

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn query(&self, _query: &DocumentQuery) -> Result<Vec<ContentFile>> {
            Err(PracticeError::StoreResponse {
                status: 500,
                endpoint: "http://localhost/contentFiles".to_string(),
            })
        }
    }

    fn doc(relpath: &str, data: Value) -> ContentFile {
        ContentFile::from_relpath(relpath, data)
    }

    fn catalog() -> ContentCatalog<MemoryStore> {
        ContentCatalog::new(MemoryStore::new(vec![
            doc("reading/b2/Signs/1.json", json!({"id": 1, "title": "Sign 1"})),
            doc("reading/b2/Signs/10.json", json!({"id": 10, "title": "Sign 10"})),
            doc("reading/b2/Signs/2.json", json!({"id": 2, "title": "Sign 2"})),
            doc("reading/b2/Signs/bare.json", json!({"title": "Exercise bare"})),
            doc("reading/b2/Signs/index.json", json!([])),
            doc("reading/b2/Open Cloze/1.json", json!({"title": "Cloze"})),
            doc("reading/b2/index.json", json!(["Signs", "Open Cloze"])),
            doc("reading/c1/Signs/1.json", json!({"id": "c1-1"})),
            doc("listening/b1/Extracts/1.json", json!({"id": 1})),
        ]))
    }

    #[tokio::test]
    async fn test_list_levels_distinct_and_sorted() {
        let catalog = catalog();
        assert_eq!(
            catalog.list_levels(CourseType::Reading).await,
            vec![LevelType::B2, LevelType::C1]
        );
        assert_eq!(
            catalog.list_levels(CourseType::GrammarTests).await,
            vec![LevelType::B2, LevelType::C1, LevelType::C2]
        );
    }

    #[tokio::test]
    async fn test_list_levels_falls_back_on_store_error() {
        let catalog = ContentCatalog::new(FailingStore);
        assert_eq!(catalog.list_levels(CourseType::Reading).await, LevelType::all().to_vec());
        assert!(catalog
            .list_activities(CourseType::Reading, LevelType::B2)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_list_activities_groups_and_filters() {
        let list = catalog()
            .list_activities(CourseType::Reading, LevelType::B2)
            .await
            .unwrap();

        assert_eq!(list.total, 2);
        assert!(!list.has_more);
        assert_eq!(list.items[0].name, "Open Cloze");
        assert_eq!(list.items[0].slug.as_deref(), Some("open-cloze"));
        assert_eq!(list.items[1].name, "Signs");
        assert_eq!(list.items[1].count, Some(3));
    }

    #[tokio::test]
    async fn test_group_field_wins_over_relpath() {
        let mut record = doc("reading/b2/Signs/1.json", json!({"id": 1}));
        record.group = Some(json!("Street Signs"));
        let mut odd = doc("reading/b2/Signs/2.json", json!({"id": 2}));
        odd.group = Some(json!(42));

        let catalog = ContentCatalog::new(MemoryStore::new(vec![record, odd]));
        let list = catalog
            .list_activities(CourseType::Reading, LevelType::B2)
            .await
            .unwrap();
        let names: Vec<&str> = list.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Signs", "Street Signs"]);
    }

    #[tokio::test]
    async fn test_list_exercises_natural_order_and_limit() {
        let catalog = catalog();
        let list = catalog
            .list_exercises(CourseType::Reading, LevelType::B2, "signs", None)
            .await
            .unwrap();
        let ids: Vec<&str> = list.items.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
        assert!(!list.has_more);

        let limited = catalog
            .list_exercises(CourseType::Reading, LevelType::B2, "Signs", Some(2))
            .await
            .unwrap();
        assert_eq!(limited.total, 2);
        assert!(limited.has_more);
    }

    #[tokio::test]
    async fn test_list_exercises_by_slug_uses_filename_id() {
        let list = catalog()
            .list_exercises(CourseType::Reading, LevelType::B2, "open-cloze", None)
            .await
            .unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].id, "1");
        assert_eq!(list.items[0].activity, "open-cloze");
    }

    #[tokio::test]
    async fn test_get_exercise_by_json_id_and_filename_id() {
        let catalog = catalog();
        let exercise = catalog
            .get_exercise(CourseType::Reading, LevelType::C1, "signs", "c1-1")
            .await
            .unwrap();
        assert_eq!(exercise.relpath, "reading/c1/Signs/1.json");

        let exercise = catalog
            .get_exercise(CourseType::Reading, LevelType::B2, "open-cloze", "1")
            .await
            .unwrap();
        assert_eq!(exercise.payload["title"], "Cloze");

        let missing = catalog
            .get_exercise(CourseType::Reading, LevelType::B2, "signs", "99")
            .await;
        assert!(matches!(missing, Err(PracticeError::ExerciseNotFound { .. })));
    }

    #[tokio::test]
    async fn test_get_json_and_stored_in_blob_without_storage() {
        let mut blob_doc = doc("listening/b1/Extracts/2.json", Value::Null);
        blob_doc.data = None;
        blob_doc.stored_in_storage = true;

        let catalog = ContentCatalog::new(MemoryStore::new(vec![
            doc("reading/b2/index.json", json!(["Signs"])),
            blob_doc,
        ]));

        assert_eq!(catalog.get_json("reading/b2/index.json").await.unwrap(), json!(["Signs"]));
        assert!(matches!(
            catalog.get_json("reading/b2/missing.json").await,
            Err(PracticeError::DocumentNotFound { .. })
        ));
        assert!(matches!(
            catalog.get_json("listening/b1/Extracts/2.json").await,
            Err(PracticeError::StoredInBlob { .. })
        ));
    }

    #[tokio::test]
    async fn test_activity_index_reads_index_document() {
        let entries = catalog()
            .activity_index(CourseType::Reading, LevelType::B2)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].slug.as_deref(), Some("open-cloze"));
    }

    #[test]
    fn test_index_paths_and_image_url() {
        assert_eq!(index_path(CourseType::Writing, LevelType::B1), "writing/b1/activities.json");
        assert_eq!(
            index_path(CourseType::GrammarTests, LevelType::C1),
            "grammar-tests/c1/Intermediate/index.json"
        );
        assert_eq!(index_path(CourseType::Listening, LevelType::B2), "listening/b2/index.json");
        assert_eq!(grammar_difficulty(LevelType::B1), "Beginner");

        let catalog = ContentCatalog::new(MemoryStore::default());
        assert_eq!(
            catalog.speaking_image_url(LevelType::C1, "Part 2", "1"),
            "https://englishapps.app/img/speaking/c1/part-2/1.jpeg"
        );
        assert_eq!(catalog.course_name(CourseType::UseOfEnglish), "Use of English");
        assert_eq!(catalog.available_courses().len(), 6);
    }
}
