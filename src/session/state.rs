//! Capture session state.
//!
//! [`SessionState`] is the single value holding everything a running session
//! owns: the cloned pose list, the capture cursor, the session folder and the
//! capture currently awaiting an image. Only the controller mutates it.

use crate::model::{Collection, Pose, SubjectIdentity};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Session lifecycle phase.
///
/// # State Machine
///
/// ```text
/// Idle ──configure──> Configuring ──begin──> Active ──capture──> CaptureInFlight
///  ▲                                          ▲  │                    │
///  │                                          │  └──recapture─────────┤
///  │                                          └────image ready────────┤
///  │                                                                  ▼
///  └──────────────end (from any phase)─────────────────────────── Completed
/// ```
///
/// `Completed` is reached when the last pose's image has been stored. A
/// further `capture` there ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No session
    Idle,
    /// Identity validated, folder not yet created
    Configuring,
    /// Ready for the next shot
    Active,
    /// Shutter sent, waiting for the camera's image
    CaptureInFlight,
    /// Every pose captured
    Completed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "Idle"),
            SessionPhase::Configuring => write!(f, "Configuring"),
            SessionPhase::Active => write!(f, "Active"),
            SessionPhase::CaptureInFlight => write!(f, "CaptureInFlight"),
            SessionPhase::Completed => write!(f, "Completed"),
        }
    }
}

impl SessionPhase {
    /// Only an idle controller accepts a new subject.
    pub fn can_configure(&self) -> bool {
        matches!(self, SessionPhase::Idle)
    }

    /// Begin follows configure.
    pub fn can_begin(&self) -> bool {
        matches!(self, SessionPhase::Configuring)
    }

    /// `Completed` is accepted too: capturing there ends the session.
    pub fn can_capture(&self) -> bool {
        matches!(self, SessionPhase::Active | SessionPhase::Completed)
    }

    /// Recapture needs a session with no shot in flight.
    pub fn can_recapture(&self) -> bool {
        matches!(self, SessionPhase::Active | SessionPhase::Completed)
    }

    /// Whether a session folder exists and the collection must not be edited.
    pub fn is_ongoing(&self) -> bool {
        matches!(
            self,
            SessionPhase::Active | SessionPhase::CaptureInFlight | SessionPhase::Completed
        )
    }
}

/// What to do when earlier sessions exist for the same subject and date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionFolderPolicy {
    /// Start a new numbered session folder
    #[default]
    NewSession,
    /// Reuse the most recent session folder (operator confirmed overwrite)
    OverwriteLatest,
}

/// Folder numbering computed while configuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPlan {
    /// Session folders already under `<saving>/<rid>/<date>`
    pub existing_sessions: usize,
    /// Number used when no overwrite is requested
    pub proposed_session_number: u32,
}

impl SessionPlan {
    /// Plan for a subject with `existing_sessions` folders already on disk.
    pub fn new(existing_sessions: usize) -> Self {
        let existing = u32::try_from(existing_sessions).unwrap_or(u32::MAX - 1);
        Self {
            existing_sessions,
            proposed_session_number: existing + 1,
        }
    }

    /// Whether the operator should be asked about overwriting.
    pub fn can_overwrite(&self) -> bool {
        self.existing_sessions > 0
    }

    /// Folder number to use under `policy`; never below 1.
    pub fn session_number(&self, policy: SessionFolderPolicy) -> u32 {
        match policy {
            SessionFolderPolicy::NewSession => self.proposed_session_number,
            SessionFolderPolicy::OverwriteLatest => (self.proposed_session_number - 1).max(1),
        }
    }
}

/// The shot the camera is currently producing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlightCapture {
    /// Pose being shot
    pub pose_index: usize,
    /// Whether the cursor stays put afterwards
    pub recapture: bool,
}

/// Everything owned by a running session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Unique id, for logs
    pub session_id: Uuid,
    /// Subject being photographed
    pub identity: SubjectIdentity,
    /// Collection as selected; its poses are not touched during the session.
    pub collection: Collection,
    /// Deep copy of `collection.poses`; thumbnails are updated here.
    pub poses: Vec<Pose>,
    /// Next pose to capture (0-based)
    pub capture_number: usize,
    /// Session folder number
    pub session_number: u32,
    /// Folder holding the action log and captures
    pub save_path: PathBuf,
    /// Shot awaiting its image
    pub in_flight: Option<InFlightCapture>,
    /// When `begin` succeeded
    pub started_at: DateTime<Local>,
}

impl SessionState {
    /// Fresh session with the cursor on the first pose.
    pub fn new(
        identity: SubjectIdentity,
        collection: Collection,
        session_number: u32,
        save_path: PathBuf,
    ) -> Self {
        let poses = collection.poses.clone();
        Self {
            session_id: Uuid::new_v4(),
            identity,
            collection,
            poses,
            capture_number: 0,
            session_number,
            save_path,
            in_flight: None,
            started_at: Local::now(),
        }
    }

    /// Whether the shot in flight is a recapture.
    pub fn is_recapture(&self) -> bool {
        self.in_flight.is_some_and(|c| c.recapture)
    }

    /// Every pose has been shot and nothing is pending.
    pub fn is_complete(&self) -> bool {
        self.in_flight.is_none() && self.capture_number >= self.poses.len()
    }

    /// Pose under the cursor; `None` once all are shot.
    pub fn current_pose(&self) -> Option<&Pose> {
        self.poses.get(self.capture_number)
    }

    /// Collection with the session's thumbnails, for an explicit save.
    pub fn collection_snapshot(&self) -> Collection {
        let mut collection = self.collection.clone();
        collection.poses = self.poses.clone();
        collection.number_of_poses = collection.poses.len();
        collection
    }
}

/// Returned by `begin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginReport {
    /// Unique id, for logs
    pub session_id: Uuid,
    /// Session folder number
    pub session_number: u32,
    /// Folder holding the action log and captures
    pub save_path: PathBuf,
    /// The save path already held files; they may be overwritten.
    pub save_path_had_content: bool,
}

/// Result of a `capture` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Shutter pressed for this pose; the image arrives later.
    Started {
        /// Pose being shot
        pose_index: usize,
    },
    /// Nothing left to capture; the session was ended.
    SessionEnded,
}

/// A downloaded and logged image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFile {
    /// Pose the image belongs to
    pub pose_index: usize,
    /// Canonical file name
    pub filename: String,
    /// Where the image was written
    pub path: PathBuf,
    /// Whether it replaced an earlier shot
    pub recapture: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_numbering() {
        let fresh = SessionPlan::new(0);
        assert_eq!(fresh.session_number(SessionFolderPolicy::NewSession), 1);
        assert_eq!(fresh.session_number(SessionFolderPolicy::OverwriteLatest), 1);
        assert!(!fresh.can_overwrite());

        let plan = SessionPlan::new(2);
        assert_eq!(plan.session_number(SessionFolderPolicy::NewSession), 3);
        assert_eq!(plan.session_number(SessionFolderPolicy::OverwriteLatest), 2);
        assert!(plan.can_overwrite());
    }

    #[test]
    fn phase_permissions() {
        assert!(SessionPhase::Idle.can_configure());
        assert!(!SessionPhase::Active.can_configure());
        assert!(SessionPhase::Completed.can_capture());
        assert!(!SessionPhase::CaptureInFlight.can_capture());
        assert!(!SessionPhase::CaptureInFlight.can_recapture());
        assert!(!SessionPhase::Configuring.is_ongoing());
    }
}
