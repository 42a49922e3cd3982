use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::models::{Collection, Snapshot};

/// Resumable snapshot of the in-progress collection.
pub struct ProgressStore {
    path: PathBuf,
    every: usize,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>, every: usize) -> Self {
        Self {
            path: path.into(),
            every: every.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the last snapshot, if one was written.
    pub fn load(&self) -> Result<Option<Collection>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let collection = load_dataset(&self.path)?;
        tracing::info!(
            "Resuming from {} ({} comments, {} already enriched)",
            self.path.display(),
            collection.len(),
            collection.enriched_count()
        );
        Ok(Some(collection))
    }

    /// Writes a snapshot when `enriched` is a multiple of the interval.
    pub fn checkpoint(&self, collection: &Collection, enriched: usize) -> Result<bool> {
        if enriched == 0 || enriched % self.every != 0 {
            return Ok(false);
        }
        self.save(collection)?;
        tracing::info!(
            "Checkpoint: {} enriched, {} comments saved to {}",
            enriched,
            collection.len(),
            self.path.display()
        );
        Ok(true)
    }

    pub fn save(&self, collection: &Collection) -> Result<()> {
        write_json_atomic(&self.path, &collection.snapshot())
    }
}

pub fn load_dataset(path: &Path) -> Result<Collection> {
    let file = fs::File::open(path).map_err(|e| Error::persistence(path, e))?;
    let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
    Ok(Collection::from(snapshot))
}

/// Serializes to a temp file beside `path`, then renames it over `path`, so
/// readers only ever see a complete document.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = NamedTempFile::new_in(dir).map_err(|e| Error::persistence(path, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        value.serialize(&mut serializer)?;
        writer.flush().map_err(|e| Error::persistence(path, e))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|e| Error::persistence(path, e))?;
    temp.persist(path)
        .map_err(|e| Error::persistence(path, e.error))?;

    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentRecord, CommentSummary};

    fn collection(n: usize) -> Collection {
        Collection::from_records((0..n).map(|i| {
            CommentRecord::from(CommentSummary {
                id: format!("OSTP-2024-0003-{:04}", i),
                posted_date: None,
                title: Some(format!("title {}", i)),
                agency_id: Some("OSTP".to_string()),
                document_type: None,
                last_modified_date: None,
            })
        }))
    }

    #[test]
    fn test_load_missing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"), 25);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_snapshot_replaced_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let store = ProgressStore::new(&path, 25);

        store.save(&collection(30)).unwrap();
        store.save(&collection(3)).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, collection(3));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"Number of Comments\": 3"));
        assert!(raw.contains("\n    \"Comments\""));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path() != path)
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_checkpoint_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let store = ProgressStore::new(&path, 25);
        let c = collection(2);

        assert!(!store.checkpoint(&c, 0).unwrap());
        assert!(!store.checkpoint(&c, 24).unwrap());
        assert!(!path.exists());
        assert!(store.checkpoint(&c, 25).unwrap());
        assert!(path.exists());
        assert!(store.checkpoint(&c, 50).unwrap());
    }

    #[test]
    fn test_failed_write_leaves_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let store = ProgressStore::new(&path, 25);
        store.save(&collection(2)).unwrap();

        let missing_dir = ProgressStore::new(dir.path().join("absent").join("progress.json"), 25);
        let err = missing_dir.save(&collection(5)).unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));

        assert_eq!(store.load().unwrap().unwrap(), collection(2));
    }
}
