//! Capture sessions.
//!
//! - [`state`]: phases and the [`SessionState`] value
//! - [`controller`]: the state machine driving a [`Device`](crate::device::Device)
//! - [`messages`] / [`actor`]: the task owning the controller and its handle

pub mod actor;
pub mod controller;
pub mod messages;
pub mod state;

pub use actor::{SessionActor, SessionHandle};
pub use controller::{CaptureSessionController, DeviceSettings};
pub use messages::{SessionCommand, SessionNotice, SessionStatus};
pub use state::{
    BeginReport, CaptureOutcome, CapturedFile, InFlightCapture, SessionFolderPolicy, SessionPhase,
    SessionPlan, SessionState,
};
