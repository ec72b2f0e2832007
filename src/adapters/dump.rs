//! Loaders for the JSON content dump.
//!
//! The dump mirrors the `contentFiles` collection as files laid out as
//! `<module>/<level>/<group>/<n>.json`, either in a directory or in a zip archive.

use crate::adapters::memory::MemoryStore;
use crate::domain::model::{ContentFile, CourseType};
use crate::utils::error::{PracticeError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Load a dump directory or a `.zip` archive, depending on the path.
pub async fn load_dump(path: impl AsRef<Path>) -> Result<MemoryStore> {
    let path = path.as_ref();
    let is_zip = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);

    if is_zip {
        load_dump_zip(path).await
    } else {
        load_dump_dir(path).await
    }
}

pub async fn load_dump_dir(root: impl AsRef<Path>) -> Result<MemoryStore> {
    let root = root.as_ref().to_path_buf();
    tracing::info!("📂 Loading content dump from {}", root.display());

    let mut files = Vec::new();
    let mut pending: Vec<PathBuf> = vec![root.clone()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if is_json_file(&path) {
                files.push(path);
            }
        }
    }
    files.sort();

    let mut store = MemoryStore::default();
    for path in files {
        let relpath = relative_path(&root, &path);
        let bytes = tokio::fs::read(&path).await?;
        if let Some(doc) = parse_dump_file(&relpath, &bytes) {
            store.insert(doc);
        }
    }

    tracing::info!("✅ Loaded {} content files", store.len());
    Ok(store)
}

pub async fn load_dump_zip(archive: impl AsRef<Path>) -> Result<MemoryStore> {
    let archive = archive.as_ref().to_path_buf();
    tracing::info!("📦 Loading content dump archive {}", archive.display());

    let store = tokio::task::spawn_blocking(move || read_zip(&archive))
        .await
        .map_err(|e| PracticeError::IoError(std::io::Error::other(e)))??;

    tracing::info!("✅ Loaded {} content files", store.len());
    Ok(store)
}

fn read_zip(archive_path: &Path) -> Result<MemoryStore> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() || !entry.name().to_ascii_lowercase().ends_with(".json") {
            continue;
        }
        let name = entry.name().trim_start_matches("./").to_string();
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        entries.push((name, bytes));
    }

    let prefix = wrapper_prefix(entries.iter().map(|(name, _)| name.as_str()));
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut store = MemoryStore::default();
    for (name, bytes) in entries {
        let relpath = match &prefix {
            Some(prefix) => name.strip_prefix(prefix.as_str()).unwrap_or(&name).to_string(),
            None => name,
        };
        if let Some(doc) = parse_dump_file(&relpath, &bytes) {
            store.insert(doc);
        }
    }
    Ok(store)
}

/// Archives are often created from the parent of the dump directory; when every
/// entry shares a first segment that is not a course, that segment is dropped.
fn wrapper_prefix<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut shared: Option<&str> = None;
    for name in names {
        let (first, rest) = name.split_once('/')?;
        if rest.is_empty() {
            return None;
        }
        match shared {
            None => shared = Some(first),
            Some(existing) if existing == first => {}
            Some(_) => return None,
        }
    }

    let first = shared?;
    if first.parse::<CourseType>().is_ok() {
        None
    } else {
        Some(format!("{}/", first))
    }
}

fn parse_dump_file(relpath: &str, bytes: &[u8]) -> Option<ContentFile> {
    match serde_json::from_slice(bytes) {
        Ok(data) => {
            let mut doc = ContentFile::from_relpath(relpath, data);
            doc.size_bytes = Some(bytes.len() as u64);
            Some(doc)
        }
        Err(e) => {
            tracing::warn!("⚠️ Skipping {}: invalid JSON ({})", relpath, e);
            None
        }
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_prefix_detection() {
        let names = ["dump/reading/b2/Signs/1.json", "dump/writing/b1/activities.json"];
        assert_eq!(wrapper_prefix(names.into_iter()), Some("dump/".to_string()));

        let names = ["reading/b2/Signs/1.json", "writing/b1/activities.json"];
        assert_eq!(wrapper_prefix(names.into_iter()), None);

        let names = ["a/reading/b2/1.json", "b/reading/b2/1.json"];
        assert_eq!(wrapper_prefix(names.into_iter()), None);
    }

    #[test]
    fn test_parse_dump_file_skips_invalid_json() {
        assert!(parse_dump_file("reading/b2/Signs/1.json", b"{not json").is_none());

        let doc = parse_dump_file("reading/b2/Signs/1.json", br#"{"id": 1}"#).unwrap();
        assert_eq!(doc.size_bytes, Some(9));
        assert_eq!(doc.module.as_deref(), Some("reading"));
    }
}
