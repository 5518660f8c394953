//! Domain records shared by the validator, the stores and the session controller.
//!
//! Field names serialize in camelCase so that existing
//! `camera_profile_config.json` / `collection_config.json` files load unchanged.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Required length of the research subject identifier.
pub const RID_LEN: usize = 7;
/// Required length of the `YYYYMMDD` collection date.
pub const DATE_LEN: usize = 8;

/// Who is being photographed, parsed from a single `<rid>_<date>_<collection>` token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectIdentity {
    /// Seven-character subject id
    pub rid: String,
    /// Collection date, `YYYYMMDD`
    pub date: String,
    /// Collection the subject is enrolled in
    pub collection_number: String,
}

impl SubjectIdentity {
    /// Parse an operator-entered identity token.
    ///
    /// The token is lower-cased and split on `_`. Exactly three segments are
    /// required, then the rid must be 7 characters, the date 8 and the
    /// collection number at least one.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_lowercase();
        let segments: Vec<&str> = normalized.split('_').collect();
        let [rid, date, collection_number] = segments.as_slice() else {
            return Err(ValidationError::MalformedIdentity);
        };

        if rid.chars().count() != RID_LEN
            || date.chars().count() != DATE_LEN
            || collection_number.is_empty()
        {
            return Err(ValidationError::InvalidIdentityFormat);
        }

        Ok(Self {
            rid: (*rid).to_string(),
            date: (*date).to_string(),
            collection_number: (*collection_number).to_string(),
        })
    }
}

impl fmt::Display for SubjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.rid, self.date, self.collection_number)
    }
}

/// A named bundle of the four photographic settings, tied to one camera model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraProfile {
    /// Unique name, compared case-insensitively
    pub name: String,
    /// Camera model the settings apply to
    pub camera: String,
    /// Aperture label, e.g. `5.6`
    #[serde(default)]
    pub fstop: Option<String>,
    /// Shutter speed label, e.g. `1/125`
    #[serde(default)]
    pub exposure: Option<String>,
    /// ISO label, e.g. `ISO 200`
    #[serde(default)]
    pub iso: Option<String>,
    /// White balance label; left unchanged when absent
    #[serde(default)]
    pub white_balance: Option<String>,
}

impl CameraProfile {
    /// Profile with no settings yet.
    pub fn new(name: impl Into<String>, camera: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            camera: camera.into(),
            ..Default::default()
        }
    }

    /// Set the exposure triple and optional white balance.
    pub fn with_settings(
        mut self,
        fstop: &str,
        exposure: &str,
        iso: &str,
        white_balance: Option<&str>,
    ) -> Self {
        self.fstop = Some(fstop.to_string());
        self.exposure = Some(exposure.to_string());
        self.iso = Some(iso.to_string());
        self.white_balance = white_balance.map(str::to_string);
        self
    }
}

/// One required photograph within a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    /// Short name shown to the operator
    pub title: String,
    /// Instructions for the subject
    pub description: String,
    /// Reference image; replaced by the captured file during a session.
    #[serde(default)]
    pub thumbnail: Option<PathBuf>,
    /// Base name plus extension, e.g. `frontal.JPEG`.
    pub filename: String,
    /// Profile applied before capturing this pose
    #[serde(default)]
    pub camera_profile: Option<String>,
}

impl Pose {
    /// Pose without a thumbnail.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        filename: impl Into<String>,
        camera_profile: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            thumbnail: None,
            filename: filename.into(),
            camera_profile: Some(camera_profile.into()),
        }
    }

    /// Profile name used in paths; empty when the pose has none assigned.
    pub fn profile_name(&self) -> &str {
        self.camera_profile.as_deref().unwrap_or_default()
    }
}

/// A named, ordered pose list plus where and how its captures are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Display name
    pub name: String,
    /// Integer key, kept as entered
    pub collection_number: String,
    /// Mirrors `poses.len()` once saved
    pub number_of_poses: usize,
    /// Root of every session folder
    pub saving_directory: PathBuf,
    /// Station name used in paths and filenames
    pub device_name: String,
    /// Biometric modality, e.g. `Face`
    pub modality: String,
    /// Camera model the collection requires
    pub camera: String,
    /// Poses in capture order
    #[serde(default)]
    pub poses: Vec<Pose>,
}

impl Collection {
    /// Append a pose, keeping `number_of_poses` in step.
    pub fn add(&mut self, pose: Pose) {
        self.poses.push(pose);
        self.number_of_poses = self.poses.len();
    }

    /// `number_of_poses == poses.len()`
    pub fn is_consistent(&self) -> bool {
        self.number_of_poses == self.poses.len()
    }
}
