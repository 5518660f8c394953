//! Editing rules for camera profiles, poses and collections.
//!
//! A catalog wraps a store, keeps the loaded list in memory, and persists the
//! whole list after each accepted edit. An edit is validated first; a rejected
//! edit leaves both the in-memory list and the store untouched.
//!
//! ## Rules
//!
//! - Names, device names, modalities and pose filename bases must not contain
//!   spaces or any of `.,/;'[]\`<>?:"{}|~!@#$%^&*()+=` ([`is_valid_name`]).
//! - Profiles are unique by name (case-insensitive); collections by integer
//!   collection number. Saving over an existing entry requires `overwrite`.
//! - Profiles are kept sorted by name then camera, collections by collection
//!   number then name.
//! - A collection holds at most [`MAX_POSES`] poses and cannot be saved while a
//!   capture session is running.

use crate::error::{AppResult, CatalogError};
use crate::model::{CameraProfile, Collection, Pose};
use crate::store::{CollectionStore, ProfileStore};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use tracing::info;

/// Upper bound on poses per collection.
pub const MAX_POSES: usize = 100;

/// Reference image used by [`Pose::placeholder`].
pub const PLACEHOLDER_THUMBNAIL: &str = "thumbnails/placeholder.png";

static FORBIDDEN_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.,/;'\[\]\\`<>?:"{}|~!@#$%^&*()+= ]+"#).expect("static regex is valid")
});

/// Whether `value` is free of spaces and reserved characters.
pub fn is_valid_name(value: &str) -> bool {
    !FORBIDDEN_CHARS.is_match(value)
}

fn check_name(value: &str, field: &'static str) -> Result<(), CatalogError> {
    if is_valid_name(value) {
        Ok(())
    } else {
        Err(CatalogError::InvalidName { field })
    }
}

fn filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

impl Pose {
    /// Pose appended by "add pose" before the operator edits it.
    pub fn placeholder() -> Self {
        Self {
            title: "Sample Title".to_string(),
            description: "Sample Description".to_string(),
            thumbnail: Some(PathBuf::from(PLACEHOLDER_THUMBNAIL)),
            filename: "sample_filename.JPEG".to_string(),
            camera_profile: None,
        }
    }
}

/// Unvalidated pose fields as entered in an editor.
#[derive(Debug, Clone, Default)]
pub struct PoseDraft {
    /// Short pose name shown to the operator
    pub title: String,
    /// Instructions for the subject
    pub description: String,
    /// Reference image path
    pub thumbnail: Option<PathBuf>,
    /// Filename without extension
    pub filename_base: String,
    /// Extension including the dot, e.g. `.JPEG`
    pub extension: String,
    /// Profile to apply before capturing
    pub camera_profile: Option<String>,
}

impl PoseDraft {
    /// Check required fields and the filename rule, then build the pose.
    pub fn validate(self) -> Result<Pose, CatalogError> {
        let thumbnail_set = self
            .thumbnail
            .as_ref()
            .is_some_and(|t| !t.as_os_str().is_empty());
        if self.title.is_empty()
            || self.description.is_empty()
            || !thumbnail_set
            || self.filename_base.is_empty()
            || !filled(self.camera_profile.as_deref())
        {
            return Err(CatalogError::UnfilledFields(
                "title, description, thumbnail, camera profile and filename",
            ));
        }
        check_name(&self.filename_base, "filename")?;

        Ok(Pose {
            title: self.title,
            description: self.description,
            thumbnail: self.thumbnail,
            filename: format!("{}{}", self.filename_base, self.extension),
            camera_profile: self.camera_profile,
        })
    }
}

/// Stored camera profiles with editing rules.
pub struct ProfileCatalog<S: ProfileStore> {
    store: S,
    profiles: Vec<CameraProfile>,
}

impl<S: ProfileStore> ProfileCatalog<S> {
    /// Load the current list from `store`.
    pub fn open(store: S) -> AppResult<Self> {
        let profiles = store.load_profiles()?;
        Ok(Self { store, profiles })
    }

    /// Profiles sorted by name, then camera.
    pub fn profiles(&self) -> &[CameraProfile] {
        &self.profiles
    }

    /// Profile with exactly this name.
    pub fn find(&self, name: &str) -> Option<&CameraProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Profiles usable with the connected camera model.
    pub fn profiles_for_camera(&self, model: &str) -> Vec<&CameraProfile> {
        self.profiles.iter().filter(|p| p.camera == model).collect()
    }

    /// Add `profile`, or replace a same-named one when `overwrite` is set.
    pub fn save(&mut self, profile: CameraProfile, overwrite: bool) -> AppResult<()> {
        if profile.name.is_empty()
            || !filled(profile.fstop.as_deref())
            || !filled(profile.exposure.as_deref())
            || !filled(profile.iso.as_deref())
        {
            return Err(CatalogError::UnfilledFields(
                "F-Stop/Aperture, Exposure/Shutter Speed, ISO and profile name",
            )
            .into());
        }
        if profile.camera.is_empty() {
            return Err(CatalogError::UnfilledFields("camera").into());
        }
        check_name(&profile.name, "profile name")?;

        let mut updated = self.profiles.clone();
        if let Some(pos) = updated
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(&profile.name))
        {
            if !overwrite {
                return Err(CatalogError::DuplicateProfile(profile.name).into());
            }
            updated.remove(pos);
        }
        info!(name = %profile.name, camera = %profile.camera, "Saving camera profile");
        updated.push(profile);
        updated.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.camera.cmp(&b.camera)));

        self.store.save_profiles(&updated)?;
        self.profiles = updated;
        Ok(())
    }

    /// Remove a profile and persist the list.
    pub fn delete(&mut self, name: &str) -> AppResult<CameraProfile> {
        let pos = self
            .profiles
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| CatalogError::NotFound {
                kind: "profile",
                name: name.to_string(),
            })?;

        let mut updated = self.profiles.clone();
        let removed = updated.remove(pos);
        self.store.save_profiles(&updated)?;
        self.profiles = updated;
        info!(name, "Deleted camera profile");
        Ok(removed)
    }
}

fn collection_number(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

/// Stored collections with editing rules.
pub struct CollectionCatalog<S: CollectionStore> {
    store: S,
    collections: Vec<Collection>,
}

impl<S: CollectionStore> CollectionCatalog<S> {
    /// Load the current list from `store`.
    pub fn open(store: S) -> AppResult<Self> {
        let collections = store.load_collections()?;
        Ok(Self { store, collections })
    }

    /// Collections in numeric order.
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// Collection whose number equals `number` (numerically when both parse).
    pub fn find(&self, number: &str) -> Option<&Collection> {
        let wanted = collection_number(number);
        self.collections.iter().find(|c| match wanted {
            Some(n) => collection_number(&c.collection_number) == Some(n),
            None => c.collection_number == number,
        })
    }

    /// Add `collection`, or replace the one with the same number when
    /// `overwrite` is set. Refused while `session_ongoing`.
    pub fn save(
        &mut self,
        mut collection: Collection,
        overwrite: bool,
        session_ongoing: bool,
    ) -> AppResult<()> {
        if session_ongoing {
            return Err(CatalogError::SessionOngoing.into());
        }
        check_name(&collection.name, "collection name")?;
        check_name(&collection.device_name, "device name")?;
        check_name(&collection.modality, "modality")?;

        if collection.saving_directory.as_os_str().is_empty()
            || collection.collection_number.is_empty()
            || collection.device_name.is_empty()
            || collection.modality.is_empty()
            || collection.name.is_empty()
        {
            return Err(CatalogError::UnfilledFields(
                "save directory, collection number, device name, modality and collection name",
            )
            .into());
        }
        let number = collection_number(&collection.collection_number).ok_or_else(|| {
            CatalogError::NonIntegerCollectionNumber(collection.collection_number.clone())
        })?;
        if collection.camera.is_empty() {
            return Err(CatalogError::UnfilledFields("camera").into());
        }
        if collection.poses.len() > MAX_POSES {
            return Err(CatalogError::TooManyPoses(MAX_POSES).into());
        }
        collection.number_of_poses = collection.poses.len();

        let mut updated = self.collections.clone();
        if let Some(pos) = updated
            .iter()
            .position(|c| collection_number(&c.collection_number) == Some(number))
        {
            if !overwrite {
                return Err(
                    CatalogError::DuplicateCollection(collection.collection_number).into(),
                );
            }
            updated.remove(pos);
        }
        info!(
            name = %collection.name,
            number,
            poses = collection.number_of_poses,
            "Saving collection"
        );
        updated.push(collection);
        updated.sort_by(|a, b| {
            collection_number(&a.collection_number)
                .cmp(&collection_number(&b.collection_number))
                .then_with(|| a.name.cmp(&b.name))
        });

        self.store.save_collections(&updated)?;
        self.collections = updated;
        Ok(())
    }

    /// Remove a collection and persist the list.
    pub fn delete(&mut self, number: &str) -> AppResult<Collection> {
        let target = self
            .find(number)
            .map(|c| c.collection_number.clone())
            .ok_or_else(|| CatalogError::NotFound {
                kind: "collection",
                name: number.to_string(),
            })?;

        let mut updated = self.collections.clone();
        updated.retain(|c| c.collection_number != target);
        let removed = self
            .collections
            .iter()
            .find(|c| c.collection_number == target)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                kind: "collection",
                name: number.to_string(),
            })?;

        self.store.save_collections(&updated)?;
        self.collections = updated;
        info!(number, "Deleted collection");
        Ok(removed)
    }
}
