use anyhow::Result;
use english_practice::adapters::{load_dump, load_dump_zip};
use english_practice::core::catalog::index_path;
use english_practice::{ContentCatalog, CourseType, LevelType, PracticeError};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const DUMP_FILES: &[(&str, &str)] = &[
    ("reading/b2/Open Cloze/1.json", r#"{"id": 1, "title": "The Gym", "text": "..."}"#),
    ("reading/b2/Open Cloze/2.json", r#"{"id": 2, "title": "Trains", "text": "..."}"#),
    ("reading/b2/Open Cloze/10.json", r#"{"id": 10, "title": "Music", "text": "..."}"#),
    ("reading/b2/Open Cloze/bare.json", r#"{"title": "Exercise bare"}"#),
    ("reading/b2/Gapped Text/a.json", r#"{"title": "Volcanoes"}"#),
    ("reading/b2/index.json", r#"["Open Cloze", {"name": "Gapped Text", "description": "Six gaps"}]"#),
    ("reading/c1/Signs/1.json", r#"{"id": 1}"#),
    ("speaking/b2/activities.json", r#"["Part 1"]"#),
];

fn write_dump_dir(root: &Path) -> Result<()> {
    for (relpath, body) in DUMP_FILES {
        let path = root.join(relpath);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, body)?;
    }
    // 無效的 JSON 應被略過
    std::fs::write(root.join("reading/b2/Open Cloze/broken.json"), "{not json")?;
    Ok(())
}

fn write_dump_zip(path: &Path, wrapper: &str) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (relpath, body) in DUMP_FILES {
        writer.start_file(format!("{}{}", wrapper, relpath), options)?;
        writer.write_all(body.as_bytes())?;
    }
    writer.finish()?;
    Ok(())
}

#[tokio::test]
async fn test_catalog_over_dump_directory() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_dump_dir(temp_dir.path())?;

    let store = load_dump(temp_dir.path()).await?;
    assert_eq!(store.len(), DUMP_FILES.len());
    let catalog = ContentCatalog::new(store);

    let levels = catalog.list_levels(CourseType::Reading).await;
    assert_eq!(levels, vec![LevelType::B2, LevelType::C1]);

    let activities = catalog
        .list_activities(CourseType::Reading, LevelType::B2)
        .await?;
    let names: Vec<&str> = activities.items.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Gapped Text", "Open Cloze"]);
    assert_eq!(activities.items[1].slug.as_deref(), Some("open-cloze"));
    assert_eq!(activities.items[1].count, Some(3));
    assert!(!activities.has_more);

    let exercises = catalog
        .list_exercises(CourseType::Reading, LevelType::B2, "open-cloze", None)
        .await?;
    let ids: Vec<&str> = exercises.items.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "10"]);
    assert!(!exercises.has_more);

    let limited = catalog
        .list_exercises(CourseType::Reading, LevelType::B2, "Open Cloze", Some(2))
        .await?;
    assert_eq!(limited.total, 2);
    assert!(limited.has_more);

    let exercise = catalog
        .get_exercise(CourseType::Reading, LevelType::B2, "open-cloze", "10")
        .await?;
    assert_eq!(exercise.payload["title"], "Music");

    let no_id = catalog
        .get_exercise(CourseType::Reading, LevelType::B2, "gapped-text", "a")
        .await?;
    assert_eq!(no_id.relpath, "reading/b2/Gapped Text/a.json");

    Ok(())
}

#[tokio::test]
async fn test_activity_index_and_missing_documents() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_dump_dir(temp_dir.path())?;
    let catalog = ContentCatalog::new(load_dump(temp_dir.path()).await?);

    let index = catalog
        .activity_index(CourseType::Reading, LevelType::B2)
        .await?;
    assert_eq!(index.len(), 2);
    assert_eq!(index[0].slug.as_deref(), Some("open-cloze"));
    assert_eq!(index[1].description.as_deref(), Some("Six gaps"));

    assert_eq!(
        index_path(CourseType::Speaking, LevelType::B2),
        "speaking/b2/activities.json"
    );
    let speaking = catalog
        .activity_index(CourseType::Speaking, LevelType::B2)
        .await?;
    assert_eq!(speaking[0].name, "Part 1");

    let missing = catalog
        .activity_index(CourseType::Listening, LevelType::C2)
        .await;
    assert!(matches!(missing, Err(PracticeError::DocumentNotFound { .. })));

    let unknown = catalog
        .get_exercise(CourseType::Reading, LevelType::B2, "open-cloze", "99")
        .await;
    assert!(matches!(unknown, Err(PracticeError::ExerciseNotFound { .. })));

    Ok(())
}

#[tokio::test]
async fn test_zip_dump_with_wrapper_directory() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let archive = temp_dir.path().join("content.zip");
    write_dump_zip(&archive, "export-2024/")?;

    let store = load_dump_zip(&archive).await?;
    assert_eq!(store.len(), DUMP_FILES.len());
    assert!(store
        .documents()
        .iter()
        .all(|doc| !doc.relpath.starts_with("export-2024/")));

    let catalog = ContentCatalog::new(store);
    let exercises = catalog
        .list_exercises(CourseType::Reading, LevelType::B2, "open-cloze", None)
        .await?;
    assert_eq!(exercises.total, 3);

    Ok(())
}
