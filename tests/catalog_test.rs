//! Profile and collection catalog tests against the JSON file store

use biocapture::catalog::{CollectionCatalog, PoseDraft, ProfileCatalog, MAX_POSES};
use biocapture::model::{CameraProfile, Collection, Pose};
use biocapture::store::{CollectionStore, JsonFileStore, ProfileStore};
use biocapture::{CaptureError, CatalogError};
use std::path::{Path, PathBuf};

fn collection(number: &str, name: &str, saving: &Path) -> Collection {
    let mut collection = Collection {
        name: name.into(),
        collection_number: number.into(),
        saving_directory: saving.to_path_buf(),
        device_name: "CanonA".into(),
        modality: "Face".into(),
        camera: "ModelX".into(),
        ..Default::default()
    };
    collection.add(Pose::new("Frontal", "Look ahead", "frontal.JPEG", "face_day"));
    collection
}

fn catalog_error(err: CaptureError) -> CatalogError {
    match err {
        CaptureError::Catalog(e) => e,
        other => panic!("expected catalog error, got {:?}", other),
    }
}

// =============================================================================
// Collections
// =============================================================================

#[test]
fn test_collections_sorted_numerically_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::in_dir(dir.path());
    let mut catalog = CollectionCatalog::open(store.clone()).unwrap();

    for number in ["10", "2", "1"] {
        catalog
            .save(collection(number, &format!("Set{}", number), dir.path()), false, false)
            .unwrap();
    }
    let numbers: Vec<&str> = catalog
        .collections()
        .iter()
        .map(|c| c.collection_number.as_str())
        .collect();
    assert_eq!(numbers, ["1", "2", "10"]);

    let reloaded = store.load_collections().unwrap();
    assert_eq!(reloaded, catalog.collections());
    assert!(store.collections_path().exists());
}

#[test]
fn test_duplicate_number_requires_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = CollectionCatalog::open(JsonFileStore::in_dir(dir.path())).unwrap();
    catalog.save(collection("3", "First", dir.path()), false, false).unwrap();

    // "03" is the same integer collection number
    let err = catalog
        .save(collection("03", "Second", dir.path()), false, false)
        .unwrap_err();
    assert!(matches!(
        catalog_error(err),
        CatalogError::DuplicateCollection(_)
    ));

    catalog.save(collection("3", "Second", dir.path()), true, false).unwrap();
    assert_eq!(catalog.collections().len(), 1);
    assert_eq!(catalog.find("3").unwrap().name, "Second");
}

#[test]
fn test_refused_during_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::in_dir(dir.path());
    let mut catalog = CollectionCatalog::open(store.clone()).unwrap();

    let err = catalog
        .save(collection("1", "Set", dir.path()), false, true)
        .unwrap_err();
    assert_eq!(catalog_error(err), CatalogError::SessionOngoing);
    assert!(catalog.collections().is_empty());
    assert!(!store.collections_path().exists());
}

#[test]
fn test_collection_field_rules() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = CollectionCatalog::open(JsonFileStore::in_dir(dir.path())).unwrap();

    let err = catalog
        .save(collection("1", "Face Set", dir.path()), false, false)
        .unwrap_err();
    assert_eq!(
        catalog_error(err),
        CatalogError::InvalidName { field: "collection name" }
    );

    let mut bad_modality = collection("1", "Set", dir.path());
    bad_modality.modality = "Face/Iris".into();
    let err = catalog.save(bad_modality, false, false).unwrap_err();
    assert_eq!(catalog_error(err), CatalogError::InvalidName { field: "modality" });

    let mut no_saving = collection("1", "Set", dir.path());
    no_saving.saving_directory = PathBuf::new();
    let err = catalog.save(no_saving, false, false).unwrap_err();
    assert!(matches!(catalog_error(err), CatalogError::UnfilledFields(_)));

    let err = catalog
        .save(collection("one", "Set", dir.path()), false, false)
        .unwrap_err();
    assert_eq!(
        catalog_error(err),
        CatalogError::NonIntegerCollectionNumber("one".into())
    );

    let mut no_camera = collection("1", "Set", dir.path());
    no_camera.camera.clear();
    let err = catalog.save(no_camera, false, false).unwrap_err();
    assert_eq!(catalog_error(err), CatalogError::UnfilledFields("camera"));

    assert!(catalog.collections().is_empty());
}

#[test]
fn test_pose_limit_and_count() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = CollectionCatalog::open(JsonFileStore::in_dir(dir.path())).unwrap();

    let mut full = collection("1", "Set", dir.path());
    full.poses = vec![Pose::placeholder(); MAX_POSES + 1];
    let err = catalog.save(full.clone(), false, false).unwrap_err();
    assert_eq!(catalog_error(err), CatalogError::TooManyPoses(MAX_POSES));

    // Stale count is corrected on save
    full.poses.truncate(MAX_POSES);
    full.number_of_poses = 7;
    catalog.save(full, false, false).unwrap();
    let saved = catalog.find("1").unwrap();
    assert_eq!(saved.number_of_poses, MAX_POSES);
    assert!(saved.is_consistent());
}

#[test]
fn test_delete_collection() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::in_dir(dir.path());
    let mut catalog = CollectionCatalog::open(store.clone()).unwrap();
    catalog.save(collection("1", "A", dir.path()), false, false).unwrap();
    catalog.save(collection("2", "B", dir.path()), false, false).unwrap();

    let removed = catalog.delete("1").unwrap();
    assert_eq!(removed.name, "A");
    assert_eq!(store.load_collections().unwrap().len(), 1);

    let err = catalog.delete("9").unwrap_err();
    assert!(matches!(catalog_error(err), CatalogError::NotFound { .. }));
}

// =============================================================================
// Profiles and Poses
// =============================================================================

#[test]
fn test_profile_names_unique_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::in_dir(dir.path());
    let mut catalog = ProfileCatalog::open(store.clone()).unwrap();

    let profile = |name: &str, camera: &str| {
        CameraProfile::new(name, camera).with_settings("2.8", "1/125", "ISO 200", None)
    };
    catalog.save(profile("iris", "ModelX"), false).unwrap();
    catalog.save(profile("Face", "ModelY"), false).unwrap();

    let err = catalog.save(profile("FACE", "ModelX"), false).unwrap_err();
    assert_eq!(catalog_error(err), CatalogError::DuplicateProfile("FACE".into()));

    catalog.save(profile("FACE", "ModelX"), true).unwrap();
    let names: Vec<(&str, &str)> = catalog
        .profiles()
        .iter()
        .map(|p| (p.name.as_str(), p.camera.as_str()))
        .collect();
    assert_eq!(names, [("FACE", "ModelX"), ("iris", "ModelX")]);
    assert_eq!(store.load_profiles().unwrap().len(), 2);
    assert_eq!(catalog.profiles_for_camera("ModelY").len(), 0);
}

#[test]
fn test_profile_requires_exposure_settings() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = ProfileCatalog::open(JsonFileStore::in_dir(dir.path())).unwrap();

    let mut profile = CameraProfile::new("face", "ModelX");
    profile.fstop = Some("2.8".into());
    let err = catalog.save(profile, false).unwrap_err();
    assert!(matches!(catalog_error(err), CatalogError::UnfilledFields(_)));

    let profile =
        CameraProfile::new("face day", "ModelX").with_settings("2.8", "1/125", "ISO 200", None);
    let err = catalog.save(profile, false).unwrap_err();
    assert!(matches!(catalog_error(err), CatalogError::InvalidName { .. }));
}

#[test]
fn test_pose_draft() {
    let draft = PoseDraft {
        title: "Frontal".into(),
        description: "Look ahead".into(),
        thumbnail: Some(PathBuf::from("thumbs/frontal.png")),
        filename_base: "frontal".into(),
        extension: ".JPEG".into(),
        camera_profile: Some("face_day".into()),
    };
    let pose = draft.clone().validate().unwrap();
    assert_eq!(pose.filename, "frontal.JPEG");
    assert_eq!(pose.profile_name(), "face_day");

    let bad_name = PoseDraft {
        filename_base: "front al".into(),
        ..draft.clone()
    };
    assert_eq!(
        bad_name.validate(),
        Err(CatalogError::InvalidName { field: "filename" })
    );

    let no_profile = PoseDraft {
        camera_profile: None,
        ..draft
    };
    assert!(matches!(
        no_profile.validate(),
        Err(CatalogError::UnfilledFields(_))
    ));
}
