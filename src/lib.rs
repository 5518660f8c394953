//! # BioCapture Core Library
//!
//! Tethered-camera capture sessions for standardized biometric photo sets. A
//! session takes a validated subject identity and an ordered list of poses,
//! drives the camera pose by pose, and stores every image under a fixed,
//! deterministic folder and file naming scheme with an append-only action log.
//!
//! ## Crate Structure
//!
//! - **`model`**: `SubjectIdentity`, `CameraProfile`, `Pose` and `Collection` records.
//! - **`settings`**: `SettingTranslator`, the symbolic setting ↔ camera code tables.
//! - **`device`**: the `Device` trait every camera backend implements, plus `MockDevice`.
//! - **`store`** / **`catalog`**: JSON persistence of profiles and collections and the
//!   rules for editing them.
//! - **`validation`**: `SessionValidator`, run before a session may start.
//! - **`naming`**: canonical file names, session folders and the `ActionLog`.
//! - **`session`**: the `CaptureSessionController` state machine and the actor that owns it.
//! - **`config`** / **`logging`**: Figment configuration and tracing setup.
//! - **`error`**: `CaptureError` and its component error types.

pub mod catalog;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod model;
pub mod naming;
pub mod session;
pub mod settings;
pub mod store;
pub mod validation;

pub use error::{AppResult, CaptureError, CatalogError, ValidationError};
