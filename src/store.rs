//! Profile and collection persistence.
//!
//! Stores hold no business rules; they load and replace whole lists. Editing
//! rules (name characters, duplicates, sorting) live in [`crate::catalog`].
//!
//! ## Format
//!
//! [`JsonFileStore`] keeps each list as a pretty-printed JSON array:
//!
//! - `camera_profile_config.json`: `[{ name, camera, fstop, exposure, iso, whiteBalance }]`
//! - `collection_config.json`: `[{ name, collectionNumber, numberOfPoses, savingDirectory,
//!   deviceName, modality, camera, poses: [...] }]`
//!
//! A missing file loads as an empty list. Saves write a sibling temporary file
//! and rename it over the target, so a failed save never leaves a truncated store.

use crate::config::StorageConfig;
use crate::error::{AppResult, CaptureError};
use crate::model::{CameraProfile, Collection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads and persists camera profiles.
pub trait ProfileStore: Send + Sync {
    /// Current list; empty when nothing was saved yet.
    fn load_profiles(&self) -> AppResult<Vec<CameraProfile>>;
    /// Replace the stored list.
    fn save_profiles(&self, profiles: &[CameraProfile]) -> AppResult<()>;
}

/// Loads and persists collections.
pub trait CollectionStore: Send + Sync {
    /// Current list; empty when nothing was saved yet.
    fn load_collections(&self) -> AppResult<Vec<Collection>>;
    /// Replace the stored list.
    fn save_collections(&self, collections: &[Collection]) -> AppResult<()>;
}

/// JSON-file backed store for both lists.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    profiles_path: PathBuf,
    collections_path: PathBuf,
}

impl JsonFileStore {
    /// Store reading and writing the given files.
    pub fn new(profiles_path: impl Into<PathBuf>, collections_path: impl Into<PathBuf>) -> Self {
        Self {
            profiles_path: profiles_path.into(),
            collections_path: collections_path.into(),
        }
    }

    /// Paths from the `[storage]` section.
    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(&storage.profiles_path, &storage.collections_path)
    }

    /// Both store files under `dir` with their default names.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(
            dir.join(crate::config::DEFAULT_PROFILES_FILE),
            dir.join(crate::config::DEFAULT_COLLECTIONS_FILE),
        )
    }

    /// Profile file path.
    pub fn profiles_path(&self) -> &Path {
        &self.profiles_path
    }

    /// Collection file path.
    pub fn collections_path(&self) -> &Path {
        &self.collections_path
    }
}

impl ProfileStore for JsonFileStore {
    fn load_profiles(&self) -> AppResult<Vec<CameraProfile>> {
        read_list(&self.profiles_path)
    }

    fn save_profiles(&self, profiles: &[CameraProfile]) -> AppResult<()> {
        write_list(&self.profiles_path, profiles)
    }
}

impl CollectionStore for JsonFileStore {
    fn load_collections(&self) -> AppResult<Vec<Collection>> {
        read_list(&self.collections_path)
    }

    fn save_collections(&self, collections: &[Collection]) -> AppResult<()> {
        write_list(&self.collections_path, collections)
    }
}

fn persistence(path: &Path, source: std::io::Error) -> CaptureError {
    CaptureError::Persistence {
        path: path.to_path_buf(),
        source,
    }
}

fn read_list<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Store file missing, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(persistence(path, e)),
    };
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&json)?)
}

fn write_list<T: Serialize>(path: &Path, items: &[T]) -> AppResult<()> {
    let json = serde_json::to_string_pretty(items)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| persistence(parent, e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json).map_err(|e| persistence(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        persistence(path, e)
    })?;
    debug!(path = %path.display(), count = items.len(), "Store file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pose;
    use tempfile::tempdir;

    #[test]
    fn missing_files_load_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        assert!(store.load_profiles().unwrap().is_empty());
        assert!(store.load_collections().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_lists() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());

        let profiles = vec![CameraProfile::new("face_day", "ModelX").with_settings(
            "2.8",
            "1/125",
            "ISO 200",
            Some("Daylight"),
        )];
        store.save_profiles(&profiles).unwrap();
        assert_eq!(store.load_profiles().unwrap(), profiles);

        let mut collection = Collection {
            name: "FaceSet".into(),
            collection_number: "3".into(),
            saving_directory: dir.path().to_path_buf(),
            device_name: "CanonA".into(),
            modality: "Face".into(),
            camera: "ModelX".into(),
            ..Default::default()
        };
        collection.add(Pose::new("Frontal", "Look ahead", "frontal.JPEG", "face_day"));
        store.save_collections(&[collection.clone()]).unwrap();
        assert_eq!(store.load_collections().unwrap(), vec![collection]);

        // No temp file left behind
        assert!(!dir.path().join("camera_profile_config.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_serialization_error() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        fs::write(store.profiles_path(), "{ not json").unwrap();
        assert!(matches!(
            store.load_profiles(),
            Err(CaptureError::Serialization(_))
        ));
    }
}
