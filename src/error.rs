//! Custom error types for the capture library.
//!
//! This module defines the primary error type, `CaptureError`, for the entire crate.
//! Using the `thiserror` crate, it provides a centralized and consistent way to handle
//! the different kinds of failure a capture session can run into.
//!
//! ## Error Hierarchy
//!
//! `CaptureError` consolidates the following sources:
//!
//! - **`Validation`**: Subject identity or collection/camera/profile mismatches detected by
//!   the session validator. Reported before any device or filesystem mutation.
//! - **`Catalog`**: Rule violations while editing camera profiles or collections.
//! - **`DeviceCommand`**: The camera rejected a shutter, focus or property call. The
//!   message carries the remediation hint shown to operators; session state is unchanged.
//! - **`Persistence`** / **`Serialization`**: Profile or collection store read/write failures.
//! - **`InvalidState`** / **`RecaptureOutOfRange`**: An operation was requested in a session
//!   state that does not allow it.
//! - **`Io`**: Session folder creation, action log appends and other filesystem work.
//! - **`Config`**: Figment extraction or semantic validation of the configuration.
//!
//! By using `#[from]`, `CaptureError` can be created from the underlying error types,
//! simplifying error handling with the `?` operator.

use std::path::PathBuf;
use thiserror::Error;

/// Hint appended to every device command failure.
pub const LIVE_VIEW_HINT: &str = "Please try toggling the Live View on and off.";

/// Convenience alias for results using the library error type.
pub type AppResult<T> = std::result::Result<T, CaptureError>;

/// Failures detected by the session validator, in check order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Not three `_`-separated fields.
    #[error("Input must be in the following form: <RID>_<DATE>_<COLLECTION NUMBER>")]
    MalformedIdentity,

    /// Fields are not 7, 8 and 1+ digits.
    #[error("RID_Date_Col must be in the following format: <7 DIGITS>_<8 DIGITS>_<1 OR MORE DIGITS>")]
    InvalidIdentityFormat,

    #[error("The collection number in the RID ({found}) does not match that of the selected collection ({expected})")]
    /// Collection number in the input differs from the selected collection.
    CollectionMismatch {
        /// Selected collection's number
        expected: String,
        /// Number parsed from the input
        found: String,
    },

    /// Connected camera is not the collection's camera.
    #[error("The connected camera '{connected}' is not associated with this collection (expects '{expected}')")]
    IncompatibleCamera {
        /// Camera named by the collection
        expected: String,
        /// Model reported by the device
        connected: String,
    },

    /// A pose names a profile that is not in the catalog.
    #[error("Pose '{0}' references a camera profile that does not exist")]
    MissingProfile(String),

    /// A pose's profile targets another camera.
    #[error("Camera profile '{0}' is incompatible with the connected camera")]
    ProfileCameraMismatch(String),

    /// Collection saving directory is gone.
    #[error("The save directory {0} no longer exists")]
    SaveDirectoryMissing(PathBuf),
}

/// Rule violations while editing profiles, poses or collections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Name contains characters outside `[A-Za-z0-9_]`.
    #[error("Invalid {field}: cannot use spaces or special characters")]
    InvalidName {
        /// Which field was rejected
        field: &'static str,
    },

    /// A required field is empty.
    #[error("Unfilled fields: {0}")]
    UnfilledFields(&'static str),

    /// Profile name already taken, ignoring case.
    #[error("A profile named '{0}' already exists")]
    DuplicateProfile(String),

    /// Collection number already taken.
    #[error("A collection with collection number {0} already exists")]
    DuplicateCollection(String),

    /// Collection number does not parse as an integer.
    #[error("\"Collection #\" accepts only integers, got '{0}'")]
    NonIntegerCollectionNumber(String),

    /// More poses than a collection may hold.
    #[error("Number of poses is too large (maximum {0})")]
    TooManyPoses(usize),

    /// Collections are read-only while a session runs.
    #[error("You cannot save a collection during a session")]
    SessionOngoing,

    /// Lookup by name or number failed.
    #[error("No {kind} named '{name}'")]
    NotFound {
        /// "profile" or "collection"
        kind: &'static str,
        /// Requested name or number
        name: String,
    },
}

/// Top-level error for every fallible operation in the crate.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Session validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Catalog edit rejected.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The camera rejected or failed a command.
    #[error("{operation} failed: {message}\n{hint}", hint = LIVE_VIEW_HINT)]
    DeviceCommand {
        /// What was being attempted
        operation: &'static str,
        /// Device error text
        message: String,
    },

    /// Reading or writing a catalog file failed.
    #[error("Persistence error at {path}: {source}")]
    Persistence {
        /// File being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Catalog JSON could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation not allowed in the current phase.
    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        /// Rejected operation
        operation: &'static str,
        /// Phase the controller was in
        state: String,
    },

    /// Recapture of a pose that was never captured.
    #[error("Pose {index} cannot be recaptured: only {capture_number} pose(s) captured so far")]
    RecaptureOutOfRange {
        /// Requested pose
        index: usize,
        /// Poses captured so far
        capture_number: usize,
    },

    /// Filesystem error outside the catalog files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration failed to load or validate.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The session actor has stopped.
    #[error("Session actor is not running")]
    ActorUnavailable,
}

impl CaptureError {
    /// Wrap a device failure for `operation`.
    pub fn device(operation: &'static str, err: impl std::fmt::Display) -> Self {
        CaptureError::DeviceCommand {
            operation,
            message: err.to_string(),
        }
    }

    /// Whether the caller can retry or correct input without restarting.
    pub fn can_recover(&self) -> bool {
        match self {
            CaptureError::Validation(_)
            | CaptureError::Catalog(_)
            | CaptureError::DeviceCommand { .. }
            | CaptureError::InvalidState { .. }
            | CaptureError::RecaptureOutOfRange { .. } => true,
            CaptureError::Persistence { .. }
            | CaptureError::Serialization(_)
            | CaptureError::Io(_)
            | CaptureError::Config(_)
            | CaptureError::ActorUnavailable => false,
        }
    }

    /// Operator-facing remediation for device failures.
    pub fn remediation_hint(&self) -> Option<&'static str> {
        match self {
            CaptureError::DeviceCommand { .. } => Some(LIVE_VIEW_HINT),
            _ => None,
        }
    }
}

impl From<figment::Error> for CaptureError {
    fn from(value: figment::Error) -> Self {
        CaptureError::Config(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_errors_carry_live_view_hint() {
        let err = CaptureError::device("press shutter", "session not open");
        assert!(err.can_recover());
        assert_eq!(err.remediation_hint(), Some(LIVE_VIEW_HINT));
        let text = err.to_string();
        assert!(text.contains("press shutter failed: session not open"));
        assert!(text.contains("toggling the Live View"));
    }

    #[test]
    fn persistence_is_not_recoverable() {
        let err = CaptureError::Persistence {
            path: PathBuf::from("camera_profile_config.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(!err.can_recover());
        assert!(err.remediation_hint().is_none());
    }

    #[test]
    fn validation_converts_with_question_mark() {
        fn check() -> AppResult<()> {
            let outcome: Result<(), ValidationError> = Err(ValidationError::MalformedIdentity);
            outcome?;
            Ok(())
        }
        match check() {
            Err(CaptureError::Validation(ValidationError::MalformedIdentity)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
