//! Pre-session validator tests
//!
//! Each failure is checked in isolation and in combination, confirming the
//! first failing check in order is the one reported.

use biocapture::model::{CameraProfile, Collection, Pose};
use biocapture::store::{JsonFileStore, ProfileStore};
use biocapture::validation::{SessionValidator, Validation};
use biocapture::{CaptureError, ValidationError};
use std::path::{Path, PathBuf};

const MODEL: &str = "ModelX";

fn collection(saving: &Path) -> Collection {
    let mut collection = Collection {
        name: "FaceSet".into(),
        collection_number: "3".into(),
        saving_directory: saving.to_path_buf(),
        device_name: "CanonA".into(),
        modality: "Face".into(),
        camera: MODEL.into(),
        ..Default::default()
    };
    collection.add(Pose::new("Frontal", "Look ahead", "frontal.JPEG", "face_day"));
    collection
}

fn profiles() -> Vec<CameraProfile> {
    vec![CameraProfile::new("face_day", MODEL).with_settings("2.8", "1/125", "ISO 200", None)]
}

fn validate(input: &str, collection: &Collection, model: &str) -> Result<Validation, ValidationError> {
    SessionValidator::default().validate(input, collection, model, &profiles())
}

// =============================================================================
// Identity Checks
// =============================================================================

#[test]
fn test_accepts_well_formed_identity() {
    let dir = tempfile::tempdir().unwrap();
    let result = validate("1234567_20240101_3", &collection(dir.path()), MODEL).unwrap();
    let subject = result.subject().unwrap();
    assert_eq!(subject.rid, "1234567");
    assert_eq!(subject.date, "20240101");
    assert_eq!(subject.collection_number, "3");
}

#[test]
fn test_segment_count() {
    let dir = tempfile::tempdir().unwrap();
    let collection = collection(dir.path());
    for input in ["1234567", "1234567_20240101", "1234567_20240101_3_x"] {
        assert_eq!(
            validate(input, &collection, MODEL),
            Err(ValidationError::MalformedIdentity),
            "{}",
            input
        );
    }
}

#[test]
fn test_segment_lengths() {
    let dir = tempfile::tempdir().unwrap();
    let collection = collection(dir.path());
    for input in ["123456_20240101_3", "1234567_2024011_3", "1234567_20240101_"] {
        assert_eq!(
            validate(input, &collection, MODEL),
            Err(ValidationError::InvalidIdentityFormat),
            "{}",
            input
        );
    }
}

#[test]
fn test_collection_number_must_match() {
    let dir = tempfile::tempdir().unwrap();
    let result = validate("1234567_20240101_4", &collection(dir.path()), MODEL);
    assert_eq!(
        result,
        Err(ValidationError::CollectionMismatch {
            expected: "3".into(),
            found: "4".into(),
        })
    );
    // Nothing written under the saving directory
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

// =============================================================================
// Camera and Profile Checks
// =============================================================================

#[test]
fn test_connected_camera_must_match_collection() {
    let dir = tempfile::tempdir().unwrap();
    let result = validate("1234567_20240101_3", &collection(dir.path()), "OtherModel");
    assert!(matches!(
        result,
        Err(ValidationError::IncompatibleCamera { .. })
    ));
}

#[test]
fn test_pose_profile_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let mut collection = collection(dir.path());
    collection.add(Pose::new("Iris", "Open wide", "iris.JPEG", "missing"));

    let result = validate("1234567_20240101_3", &collection, MODEL);
    assert_eq!(result, Err(ValidationError::MissingProfile("iris.JPEG".into())));
}

#[test]
fn test_profile_must_target_connected_camera() {
    let dir = tempfile::tempdir().unwrap();
    let mut collection = collection(dir.path());
    collection.add(Pose::new("Iris", "Open wide", "iris.JPEG", "iris_close"));
    let mut profiles = profiles();
    profiles.push(CameraProfile::new("iris_close", "OtherModel").with_settings(
        "8", "1/60", "ISO 400", None,
    ));

    let result =
        SessionValidator::default().validate("1234567_20240101_3", &collection, MODEL, &profiles);
    assert_eq!(
        result,
        Err(ValidationError::ProfileCameraMismatch("iris_close".into()))
    );
}

#[test]
fn test_saving_directory_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone");
    let result = validate("1234567_20240101_3", &collection(&missing), MODEL);
    assert_eq!(result, Err(ValidationError::SaveDirectoryMissing(missing)));
}

#[test]
fn test_first_failing_check_wins() {
    // Wrong collection number, wrong camera and a missing directory at once
    let collection = collection(&PathBuf::from("/nonexistent/biocapture"));
    let result = validate("1234567_20240101_9", &collection, "OtherModel");
    assert!(matches!(
        result,
        Err(ValidationError::CollectionMismatch { .. })
    ));
}

// =============================================================================
// Reserved Token and Store-backed Validation
// =============================================================================

#[test]
fn test_easter_egg_skips_checks() {
    let collection = collection(&PathBuf::from("/nonexistent/biocapture"));
    assert_eq!(validate("QUEEN", &collection, "OtherModel"), Ok(Validation::EasterEgg));
    assert_eq!(
        validate("long live the queen", &collection, MODEL),
        Ok(Validation::EasterEgg)
    );
    assert!(Validation::EasterEgg.subject().is_none());
}

#[test]
fn test_custom_token() {
    let dir = tempfile::tempdir().unwrap();
    let validator = SessionValidator::new("Bee");
    let result = validator.validate("bumblebee", &collection(dir.path()), MODEL, &profiles());
    assert_eq!(result, Ok(Validation::EasterEgg));
}

#[test]
fn test_validate_with_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::in_dir(dir.path());
    let validator = SessionValidator::default();
    let collection = collection(dir.path());

    // Empty store: the pose's profile cannot be found
    let err = validator
        .validate_with_store("1234567_20240101_3", &collection, MODEL, &store)
        .unwrap_err();
    assert!(matches!(
        err,
        CaptureError::Validation(ValidationError::MissingProfile(_))
    ));

    store.save_profiles(&profiles()).unwrap();
    let result = validator
        .validate_with_store("1234567_20240101_3", &collection, MODEL, &store)
        .unwrap();
    assert!(result.subject().is_some());
}
