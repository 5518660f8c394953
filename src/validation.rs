//! Pre-session validation.
//!
//! [`SessionValidator::validate`] decides whether a subject identity and a
//! collection may start a session against the connected camera. It has no
//! side effects; nothing is created or written until it passes.
//!
//! Checks run in this order and stop at the first failure:
//!
//! 1. identity has three `_`-separated segments
//! 2. segment lengths (rid 7, date 8, collection number at least 1)
//! 3. identity collection number equals the collection's
//! 4. collection camera equals the connected model
//! 5. every pose names an existing camera profile
//! 6. every such profile targets the connected model
//! 7. the collection's saving directory exists
//!
//! An input containing the reserved token (case-insensitive) skips all checks
//! and yields [`Validation::EasterEgg`]. Callers show it and start nothing.

use crate::config::DEFAULT_EASTER_EGG_TOKEN;
use crate::error::{AppResult, ValidationError};
use crate::model::{CameraProfile, Collection, SubjectIdentity};
use crate::store::ProfileStore;
use tracing::debug;

/// Result of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// All checks passed; the session may start for this subject.
    Subject(SubjectIdentity),
    /// Reserved token entered. Not an error, and not a session either.
    EasterEgg,
}

impl Validation {
    /// Identity to start a session with, if any.
    pub fn subject(&self) -> Option<&SubjectIdentity> {
        match self {
            Validation::Subject(identity) => Some(identity),
            Validation::EasterEgg => None,
        }
    }
}

/// Runs the pre-session checks in a fixed order.
#[derive(Debug, Clone)]
pub struct SessionValidator {
    easter_egg_token: String,
}

impl Default for SessionValidator {
    fn default() -> Self {
        Self::new(DEFAULT_EASTER_EGG_TOKEN)
    }
}

impl SessionValidator {
    /// Validator recognising `easter_egg_token`, case-insensitively.
    pub fn new(easter_egg_token: impl Into<String>) -> Self {
        Self {
            easter_egg_token: easter_egg_token.into().to_lowercase(),
        }
    }

    fn is_easter_egg(&self, input: &str) -> bool {
        !self.easter_egg_token.is_empty() && input.to_lowercase().contains(&self.easter_egg_token)
    }

    /// Validate against an already-loaded profile list.
    pub fn validate(
        &self,
        input: &str,
        collection: &Collection,
        connected_model: &str,
        profiles: &[CameraProfile],
    ) -> Result<Validation, ValidationError> {
        if self.is_easter_egg(input) {
            debug!("Reserved token entered, skipping validation");
            return Ok(Validation::EasterEgg);
        }

        let identity = SubjectIdentity::parse(input)?;

        if identity.collection_number != collection.collection_number {
            return Err(ValidationError::CollectionMismatch {
                expected: collection.collection_number.clone(),
                found: identity.collection_number,
            });
        }

        if collection.camera != connected_model {
            return Err(ValidationError::IncompatibleCamera {
                expected: collection.camera.clone(),
                connected: connected_model.to_string(),
            });
        }

        let mut resolved = Vec::with_capacity(collection.poses.len());
        for pose in &collection.poses {
            let profile = pose
                .camera_profile
                .as_deref()
                .and_then(|name| profiles.iter().find(|p| p.name == name))
                .ok_or_else(|| ValidationError::MissingProfile(pose.filename.clone()))?;
            resolved.push(profile);
        }

        if let Some(profile) = resolved.iter().find(|p| p.camera != connected_model) {
            return Err(ValidationError::ProfileCameraMismatch(profile.name.clone()));
        }

        if !collection.saving_directory.is_dir() {
            return Err(ValidationError::SaveDirectoryMissing(
                collection.saving_directory.clone(),
            ));
        }

        debug!(subject = %identity, collection = %collection.name, "Session validated");
        Ok(Validation::Subject(identity))
    }

    /// Validate, loading profiles from `store` first.
    pub fn validate_with_store(
        &self,
        input: &str,
        collection: &Collection,
        connected_model: &str,
        store: &dyn ProfileStore,
    ) -> AppResult<Validation> {
        let profiles = store.load_profiles()?;
        Ok(self.validate(input, collection, connected_model, &profiles)?)
    }
}
