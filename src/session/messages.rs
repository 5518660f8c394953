//! Commands accepted by the session actor.
//!
//! Every variant carries a `oneshot::Sender` for its reply. Use the helper
//! constructors, which return the command together with the receiver:
//!
//! ```rust
//! use biocapture::session::messages::SessionCommand;
//!
//! let (cmd, rx) = SessionCommand::capture();
//! // command_tx.send(cmd).await?;
//! // let outcome = rx.await?;
//! ```

use crate::error::AppResult;
use crate::model::{CameraProfile, Collection, SubjectIdentity};
use crate::session::controller::DeviceSettings;
use crate::session::state::{
    BeginReport, CaptureOutcome, CapturedFile, SessionFolderPolicy, SessionPhase, SessionPlan,
};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Snapshot of the controller for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Current phase
    pub phase: SessionPhase,
    /// Id of the running session, if any
    pub session_id: Option<Uuid>,
    /// Next pose to capture
    pub capture_number: usize,
    /// Poses in the running session; 0 when idle
    pub pose_count: usize,
    /// Whether live view is on
    pub live_view: bool,
}

/// Outcomes the actor broadcasts without being asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// An image was downloaded and logged.
    Captured(CapturedFile),
    /// The camera shut down; live view is off.
    DeviceShutdown,
    /// Handling an image-ready notification failed.
    CaptureFailed {
        /// Rendered error
        message: String,
    },
}

/// Requests handled by [`SessionActor`](crate::session::SessionActor).
///
/// Each variant's `response` carries the controller's result back to the caller.
#[derive(Debug)]
pub enum SessionCommand {
    /// Record subject and collection and compute folder numbering.
    Configure {
        /// Validated subject
        identity: SubjectIdentity,
        /// Collection to capture
        collection: Collection,
        /// Receives the folder plan
        response: oneshot::Sender<AppResult<SessionPlan>>,
    },
    /// Create the session folder and start capturing.
    Begin {
        /// New folder or overwrite the latest
        policy: SessionFolderPolicy,
        /// Receives the begin report
        response: oneshot::Sender<AppResult<BeginReport>>,
    },
    /// `Configure` then `Begin` in one step.
    Start {
        /// Validated subject
        identity: SubjectIdentity,
        /// Collection to capture
        collection: Collection,
        /// New folder or overwrite the latest
        policy: SessionFolderPolicy,
        /// Receives the begin report
        response: oneshot::Sender<AppResult<BeginReport>>,
    },
    /// Shoot the pose under the cursor.
    Capture {
        /// Receives the capture outcome
        response: oneshot::Sender<AppResult<CaptureOutcome>>,
    },
    /// Shoot an already captured pose again.
    Recapture {
        /// Pose index, below the capture number
        index: usize,
        /// Receives the capture outcome
        response: oneshot::Sender<AppResult<CaptureOutcome>>,
    },
    /// Always succeeds.
    End {
        /// Acknowledgement
        response: oneshot::Sender<()>,
    },
    /// Turn live view on or off.
    SetLiveView {
        /// Desired state
        on: bool,
        /// Receives the device result
        response: oneshot::Sender<AppResult<()>>,
    },
    /// Start or stop live-view autofocus.
    Autofocus {
        /// Desired state
        on: bool,
        /// Receives the device result
        response: oneshot::Sender<AppResult<()>>,
    },
    /// Apply a pose's profile, then autofocus.
    FocusPose {
        /// Pose index in the running session
        index: usize,
        /// Receives the device result
        response: oneshot::Sender<AppResult<()>>,
    },
    /// Write a profile's settings to the camera.
    ApplyProfile {
        /// Profile to apply
        profile: CameraProfile,
        /// Receives the device result
        response: oneshot::Sender<AppResult<()>>,
    },
    /// Read back the camera's settings.
    CurrentSettings {
        /// Receives the decoded settings
        response: oneshot::Sender<AppResult<DeviceSettings>>,
    },
    /// Swap in a freshly loaded profile list.
    ReplaceProfiles {
        /// New profile list
        profiles: Vec<CameraProfile>,
        /// Acknowledgement
        response: oneshot::Sender<()>,
    },
    /// Collection with the session's thumbnails.
    SessionCollection {
        /// `None` without a session
        response: oneshot::Sender<Option<Collection>>,
    },
    /// Snapshot for status displays.
    Status {
        /// Receives the snapshot
        response: oneshot::Sender<SessionStatus>,
    },
    /// Ends any session and stops the actor.
    Shutdown {
        /// Acknowledgement, sent before the actor exits
        response: oneshot::Sender<()>,
    },
}

impl SessionCommand {
    /// Create a `Configure` command and its response receiver.
    pub fn configure(
        identity: SubjectIdentity,
        collection: Collection,
    ) -> (Self, oneshot::Receiver<AppResult<SessionPlan>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self::Configure {
                identity,
                collection,
                response: tx,
            },
            rx,
        )
    }

    /// Create a `Begin` command and its response receiver.
    pub fn begin(policy: SessionFolderPolicy) -> (Self, oneshot::Receiver<AppResult<BeginReport>>) {
        let (tx, rx) = oneshot::channel();
        (Self::Begin { policy, response: tx }, rx)
    }

    /// Create a `Start` command and its response receiver.
    pub fn start(
        identity: SubjectIdentity,
        collection: Collection,
        policy: SessionFolderPolicy,
    ) -> (Self, oneshot::Receiver<AppResult<BeginReport>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self::Start {
                identity,
                collection,
                policy,
                response: tx,
            },
            rx,
        )
    }

    /// Create a `Capture` command and its response receiver.
    pub fn capture() -> (Self, oneshot::Receiver<AppResult<CaptureOutcome>>) {
        let (tx, rx) = oneshot::channel();
        (Self::Capture { response: tx }, rx)
    }

    /// Create a `Recapture` command and its response receiver.
    pub fn recapture(index: usize) -> (Self, oneshot::Receiver<AppResult<CaptureOutcome>>) {
        let (tx, rx) = oneshot::channel();
        (Self::Recapture { index, response: tx }, rx)
    }

    /// Create an `End` command and its response receiver.
    pub fn end() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self::End { response: tx }, rx)
    }

    /// Create a `SetLiveView` command and its response receiver.
    pub fn set_live_view(on: bool) -> (Self, oneshot::Receiver<AppResult<()>>) {
        let (tx, rx) = oneshot::channel();
        (Self::SetLiveView { on, response: tx }, rx)
    }

    /// Create an `Autofocus` command and its response receiver.
    pub fn autofocus(on: bool) -> (Self, oneshot::Receiver<AppResult<()>>) {
        let (tx, rx) = oneshot::channel();
        (Self::Autofocus { on, response: tx }, rx)
    }

    /// Create a `FocusPose` command and its response receiver.
    pub fn focus_pose(index: usize) -> (Self, oneshot::Receiver<AppResult<()>>) {
        let (tx, rx) = oneshot::channel();
        (Self::FocusPose { index, response: tx }, rx)
    }

    /// Create an `ApplyProfile` command and its response receiver.
    pub fn apply_profile(profile: CameraProfile) -> (Self, oneshot::Receiver<AppResult<()>>) {
        let (tx, rx) = oneshot::channel();
        (Self::ApplyProfile { profile, response: tx }, rx)
    }

    /// Create a `CurrentSettings` command and its response receiver.
    pub fn current_settings() -> (Self, oneshot::Receiver<AppResult<DeviceSettings>>) {
        let (tx, rx) = oneshot::channel();
        (Self::CurrentSettings { response: tx }, rx)
    }

    /// Create a `ReplaceProfiles` command and its response receiver.
    pub fn replace_profiles(profiles: Vec<CameraProfile>) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self::ReplaceProfiles { profiles, response: tx }, rx)
    }

    /// Create a `SessionCollection` command and its response receiver.
    pub fn session_collection() -> (Self, oneshot::Receiver<Option<Collection>>) {
        let (tx, rx) = oneshot::channel();
        (Self::SessionCollection { response: tx }, rx)
    }

    /// Create a `Status` command and its response receiver.
    pub fn status() -> (Self, oneshot::Receiver<SessionStatus>) {
        let (tx, rx) = oneshot::channel();
        (Self::Status { response: tx }, rx)
    }

    /// Create a `Shutdown` command and its response receiver.
    pub fn shutdown() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self::Shutdown { response: tx }, rx)
    }
}
