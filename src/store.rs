use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::{CaptureError, CaptureRecord};

/// File-backed list of capture records.
///
/// The whole array is the unit of read and write: every append re-reads the
/// file, pushes one record and rewrites it pretty-printed. There is no
/// locking, so concurrent captures can race and the last writer wins.
#[derive(Debug, Clone)]
pub struct CaptureStore {
    data_file: PathBuf,
}

impl CaptureStore {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
        }
    }

    /// Read every record. A missing file or an unparseable one both yield an
    /// empty list so reads never fail the request.
    pub fn read_all(&self) -> Vec<CaptureRecord> {
        let raw = match fs::read_to_string(&self.data_file) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.data_file.display(), error = %e, "No record file, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.data_file.display(), error = %e, "Record file unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn find(&self, id: &str) -> Option<CaptureRecord> {
        self.read_all().into_iter().find(|record| record.id == id)
    }

    /// Append one record and rewrite the file. Write failures propagate.
    pub fn append(&self, record: CaptureRecord) -> Result<(), CaptureError> {
        let mut records = self.read_all();
        records.push(record);

        if let Some(parent) = self.data_file.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::Persistence(e.to_string()))?;
        }

        let serialized = serde_json::to_string_pretty(&records)
            .map_err(|e| CaptureError::Persistence(e.to_string()))?;
        fs::write(&self.data_file, serialized)
            .map_err(|e| CaptureError::Persistence(e.to_string()))?;

        debug!(path = %self.data_file.display(), count = records.len(), "Record file rewritten");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(id: &str) -> CaptureRecord {
        CaptureRecord {
            id: id.to_string(),
            original_url: "https://www.threads.net/@user/post/123".into(),
            title: "Threads post".into(),
            description: "Content from Threads".into(),
            image: format!("/images/{id}.png"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaptureStore::new(dir.path().join("none.json"));
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threads.json");
        fs::write(&path, "{not json").unwrap();
        let store = CaptureStore::new(path);
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn append_grows_store_by_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaptureStore::new(dir.path().join("data").join("threads.json"));

        store.append(sample("aaaaaaaa")).unwrap();
        assert_eq!(store.read_all().len(), 1);

        store.append(sample("bbbbbbbb")).unwrap();
        let records = store.read_all();
        assert_eq!(records.len(), 2);
        // insertion order preserved
        assert_eq!(records[0].id, "aaaaaaaa");
        assert_eq!(records[1].id, "bbbbbbbb");
    }

    #[test]
    fn find_matches_on_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaptureStore::new(dir.path().join("threads.json"));
        store.append(sample("aaaaaaaa")).unwrap();

        assert_eq!(store.find("aaaaaaaa").unwrap().id, "aaaaaaaa");
        assert!(store.find("missing0").is_none());
    }

    #[test]
    fn records_round_trip_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threads.json");
        let store = CaptureStore::new(&path);
        store.append(sample("aaaaaaaa")).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"originalUrl\""));
        assert!(raw.contains("\"createdAt\""));
    }
}
