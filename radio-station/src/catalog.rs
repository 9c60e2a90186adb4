//! Track catalog
//!
//! Every `*.json` file in the audio directory is one track record; the file
//! stem is the track id. The in-memory snapshot is a sorted list of ids that
//! is rebuilt on demand and swapped in whole, so readers never observe a
//! half-built list. The directory stays authoritative.
//!
//! Lookups that miss (empty catalog, stale index, unreadable file) return
//! `None` / `false`; the playback clock treats those as routine.

use crate::error::{Error, Result};
use crate::publisher::write_atomic;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const RECORD_EXTENSION: &str = "json";

/// Fields an uploaded record must carry
const REQUIRED_FIELDS: [&str; 2] = ["duration", "title"];

pub struct TrackCatalog {
    dir: PathBuf,
    snapshot: RwLock<Arc<Vec<String>>>,
}

impl TrackCatalog {
    /// Open the catalog at `dir`, creating the directory if needed.
    ///
    /// Failing to create the directory is the one fatal catalog error.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let catalog = Self {
            dir,
            snapshot: RwLock::new(Arc::new(Vec::new())),
        };
        catalog.refresh();
        Ok(catalog)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rescan the directory and swap in the new snapshot.
    ///
    /// An unreadable directory yields an empty catalog.
    pub fn refresh(&self) {
        let ids = match self.scan() {
            Ok(ids) => {
                info!("Catalog refreshed: {} tracks found", ids.len());
                ids
            }
            Err(e) => {
                error!("Failed to scan catalog {}: {}", self.dir.display(), e);
                Vec::new()
            }
        };
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(ids);
    }

    fn scan(&self) -> std::io::Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Current snapshot of track ids
    pub fn ids(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn count(&self) -> usize {
        self.ids().len()
    }

    /// Persist a record. Returns `false` without writing when the blob is not
    /// a JSON object or `name` is not a plain file name.
    ///
    /// Without a `name` a random 128-bit hex id is generated.
    pub fn save(&self, blob: &str, name: Option<&str>) -> bool {
        match serde_json::from_str::<Value>(blob) {
            Ok(Value::Object(_)) => {}
            Ok(_) => {
                error!("Refusing to save track: record is not a JSON object");
                return false;
            }
            Err(e) => {
                error!("Refusing to save track: {}", e);
                return false;
            }
        }

        let id = match name {
            Some(name) => match normalize_id(name) {
                Some(id) => id,
                None => {
                    error!("Refusing to save track: invalid name {:?}", name);
                    return false;
                }
            },
            None => Uuid::new_v4().simple().to_string(),
        };

        let path = self.record_path(&id);
        if let Err(e) = write_atomic(&path, blob.as_bytes()) {
            error!("Failed to save track {}: {}", path.display(), e);
            return false;
        }
        info!("Track saved: {}", path.display());
        self.refresh();
        true
    }

    /// Delete one record. Unknown ids are reported as `false`.
    pub fn delete(&self, id: &str) -> bool {
        let id = match normalize_id(id) {
            Some(id) => id,
            None => return false,
        };
        if !self.ids().iter().any(|known| *known == id) {
            debug!("Delete ignored, unknown track {}", id);
            return false;
        }

        let path = self.record_path(&id);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Track deleted: {}", path.display());
                self.refresh();
                true
            }
            Err(e) => {
                error!("Failed to delete track {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Delete every tracked record
    pub fn delete_all(&self) -> bool {
        let ids = self.ids();
        let mut ok = true;
        for id in ids.iter() {
            let path = self.record_path(id);
            if let Err(e) = std::fs::remove_file(&path) {
                error!("Failed to delete track {}: {}", path.display(), e);
                ok = false;
                break;
            }
        }
        self.refresh();
        if ok {
            info!("All tracks deleted ({})", ids.len());
        }
        ok
    }

    /// Raw record blob at `index`
    pub fn get(&self, index: usize) -> Option<String> {
        self.get_entry(index).map(|(_, blob)| blob)
    }

    /// `(id, blob)` at `index`, read from disk
    pub fn get_entry(&self, index: usize) -> Option<(String, String)> {
        let ids = self.ids();
        if ids.is_empty() {
            warn!("No tracks available");
            return None;
        }
        let id = match ids.get(index) {
            Some(id) => id.clone(),
            None => {
                warn!("Invalid track index: {} (catalog has {})", index, ids.len());
                return None;
            }
        };

        let path = self.record_path(&id);
        match std::fs::read_to_string(&path) {
            Ok(blob) => Some((id, blob)),
            Err(e) => {
                error!("Failed to read track file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Check an uploaded record: a JSON object carrying `title` and `duration`
    pub fn validate_record(blob: &str) -> Result<()> {
        let value: Value = serde_json::from_str(blob)
            .map_err(|e| Error::BadRequest(format!("Invalid JSON: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| Error::BadRequest("Record must be a JSON object".to_string()))?;
        for field in REQUIRED_FIELDS {
            if !object.contains_key(field) {
                return Err(Error::BadRequest(format!("Missing required field: {}", field)));
            }
        }
        Ok(())
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, RECORD_EXTENSION))
    }
}

/// Strip an optional `.json` suffix and reject anything that is not a plain
/// file stem.
fn normalize_id(name: &str) -> Option<String> {
    let stem = name
        .strip_suffix(&format!(".{}", RECORD_EXTENSION))
        .unwrap_or(name);
    let invalid = stem.is_empty()
        || stem.starts_with('.')
        || stem.contains(['/', '\\'])
        || stem.contains("..");
    if invalid {
        None
    } else {
        Some(stem.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RECORD: &str = r#"{"title":"One","artist":"A","duration":"00:05"}"#;

    fn catalog() -> (TempDir, TrackCatalog) {
        let dir = TempDir::new().unwrap();
        let catalog = TrackCatalog::new(dir.path().join("audios")).unwrap();
        (dir, catalog)
    }

    #[test]
    fn test_new_creates_directory() {
        let (_dir, catalog) = catalog();
        assert!(catalog.dir().is_dir());
        assert_eq!(catalog.count(), 0);
    }

    #[test]
    fn test_save_generates_hex_id() {
        let (_dir, catalog) = catalog();
        assert!(catalog.save(RECORD, None));
        assert!(catalog.save(RECORD, None));

        let ids = catalog.ids();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        for id in ids.iter() {
            assert_eq!(id.len(), 32);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_save_with_name() {
        let (_dir, catalog) = catalog();
        assert!(catalog.save(RECORD, Some("first")));
        assert!(catalog.save(RECORD, Some("second.json")));
        assert_eq!(*catalog.ids(), vec!["first".to_string(), "second".to_string()]);
        assert!(catalog.dir().join("second.json").is_file());
    }

    #[test]
    fn test_save_invalid_blob_leaves_catalog_unchanged() {
        let (_dir, catalog) = catalog();
        assert!(catalog.save(RECORD, Some("keep")));
        let before = catalog.count();

        for bad in ["", "{broken", "[1,2,3]", "null", "\"text\""] {
            assert!(!catalog.save(bad, Some("bad")), "blob {:?}", bad);
        }
        assert_eq!(catalog.count(), before);
        assert!(!catalog.dir().join("bad.json").exists());
    }

    #[test]
    fn test_save_rejects_path_names() {
        let (_dir, catalog) = catalog();
        for name in ["../escape", "a/b", "a\\b", "", ".hidden", ".json"] {
            assert!(!catalog.save(RECORD, Some(name)), "name {:?}", name);
        }
        assert_eq!(catalog.count(), 0);
    }

    #[test]
    fn test_get_in_and_out_of_bounds() {
        let (_dir, catalog) = catalog();
        assert_eq!(catalog.get(0), None);

        catalog.save(RECORD, Some("only"));
        assert_eq!(catalog.get(0).as_deref(), Some(RECORD));
        assert_eq!(catalog.get_entry(0).map(|(id, _)| id).as_deref(), Some("only"));
        assert_eq!(catalog.get(1), None);
        assert_eq!(catalog.get(usize::MAX), None);
    }

    #[test]
    fn test_get_unreadable_file_is_none() {
        let (_dir, catalog) = catalog();
        catalog.save(RECORD, Some("gone"));
        // Removed behind the catalog's back; snapshot is stale
        std::fs::remove_file(catalog.dir().join("gone.json")).unwrap();
        assert_eq!(catalog.count(), 1);
        assert_eq!(catalog.get(0), None);
    }

    #[test]
    fn test_delete_known_and_unknown() {
        let (_dir, catalog) = catalog();
        catalog.save(RECORD, Some("a"));
        catalog.save(RECORD, Some("b"));

        assert!(!catalog.delete("missing"));
        assert!(!catalog.delete("../a"));
        assert!(catalog.delete("a"));
        assert!(!catalog.delete("a"));
        assert_eq!(*catalog.ids(), vec!["b".to_string()]);
    }

    #[test]
    fn test_delete_untracked_file_is_refused() {
        let (_dir, catalog) = catalog();
        std::fs::write(catalog.dir().join("late.json"), RECORD).unwrap();
        assert!(!catalog.delete("late"));
        assert!(catalog.dir().join("late.json").exists());

        catalog.refresh();
        assert!(catalog.delete("late"));
    }

    #[test]
    fn test_delete_all() {
        let (_dir, catalog) = catalog();
        for name in ["a", "b", "c"] {
            catalog.save(RECORD, Some(name));
        }
        std::fs::write(catalog.dir().join("notes.txt"), "keep me").unwrap();

        assert!(catalog.delete_all());
        assert_eq!(catalog.count(), 0);
        assert!(catalog.dir().join("notes.txt").exists());
    }

    #[test]
    fn test_refresh_ignores_other_files() {
        let (_dir, catalog) = catalog();
        std::fs::write(catalog.dir().join("cover.png"), b"png").unwrap();
        std::fs::write(catalog.dir().join("track.json"), RECORD).unwrap();
        std::fs::create_dir(catalog.dir().join("nested.json")).unwrap();
        catalog.refresh();
        assert_eq!(*catalog.ids(), vec!["track".to_string()]);
    }

    #[test]
    fn test_refresh_missing_directory_empties_snapshot() {
        let (_dir, catalog) = catalog();
        catalog.save(RECORD, Some("a"));
        std::fs::remove_dir_all(catalog.dir()).unwrap();
        catalog.refresh();
        assert_eq!(catalog.count(), 0);
    }

    #[test]
    fn test_validate_record() {
        assert!(TrackCatalog::validate_record(RECORD).is_ok());
        assert!(matches!(
            TrackCatalog::validate_record(r#"{"title":"x"}"#),
            Err(Error::BadRequest(msg)) if msg.contains("duration")
        ));
        assert!(TrackCatalog::validate_record("[]").is_err());
        assert!(TrackCatalog::validate_record("{").is_err());
    }
}
