//! Capture session controller.
//!
//! Owns the session state machine (see [`SessionPhase`]) and turns a validated
//! subject and collection into device commands, stored files and action log
//! entries.
//!
//! The controller is a plain `&mut self` state machine. It never runs on the
//! device's notification context; device events are handed to
//! [`on_image_ready`](CaptureSessionController::on_image_ready) and
//! [`on_state_changed`](CaptureSessionController::on_state_changed) by the
//! session actor, which owns the controller.
//!
//! ## Cursor
//!
//! `capture` advances `capture_number` as soon as the camera accepts the
//! shutter press and records the pose in flight. The image-ready handler uses
//! that record rather than the cursor, so the stored file always lands on the
//! pose that was shot. If the download fails the cursor is rolled back so the
//! pose can be shot again.
//!
//! ## Known gap
//!
//! If the camera never reports the image (disconnect, driver fault), the
//! session stays in `CaptureInFlight` until `end` is called. There is no
//! timeout.

use crate::device::{
    CameraCommand, Capacity, Device, DownloadInfo, PropertyId, SaveTo, ShutterButton, StateEvent,
};
use crate::error::{AppResult, CaptureError};
use crate::model::{CameraProfile, Collection, Pose, SubjectIdentity};
use crate::naming::{self, ActionLog};
use crate::session::state::{
    BeginReport, CaptureOutcome, CapturedFile, InFlightCapture, SessionFolderPolicy, SessionPhase,
    SessionPlan, SessionState,
};
use crate::settings::{SettingKind, SettingTranslator, UNSUPPORTED};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Settings currently active on the camera, decoded to their symbolic form.
///
/// `None` means the camera reported a code outside the known tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceSettings {
    /// Aperture label
    pub fstop: Option<&'static str>,
    /// Shutter speed label
    pub exposure: Option<&'static str>,
    /// ISO label
    pub iso: Option<&'static str>,
    /// White balance label
    pub white_balance: Option<&'static str>,
}

struct PendingSession {
    identity: SubjectIdentity,
    collection: Collection,
    plan: SessionPlan,
}

/// Drives one camera through configure, begin, capture and end.
///
/// Not thread-safe on its own; [`SessionActor`](crate::session::SessionActor) owns it.
pub struct CaptureSessionController {
    device: Arc<dyn Device>,
    profiles: Vec<CameraProfile>,
    phase: SessionPhase,
    pending: Option<PendingSession>,
    state: Option<SessionState>,
    live_view: bool,
}

impl CaptureSessionController {
    /// Idle controller for `device`.
    pub fn new(device: Arc<dyn Device>, profiles: Vec<CameraProfile>) -> Self {
        Self {
            device,
            profiles,
            phase: SessionPhase::Idle,
            pending: None,
            state: None,
            live_view: false,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Running session, if one has begun.
    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    /// Next pose to capture; 0 without a session.
    pub fn capture_number(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.capture_number)
    }

    /// See [`SessionPhase::is_ongoing`].
    pub fn is_session_ongoing(&self) -> bool {
        self.phase.is_ongoing()
    }

    /// Whether live view is on.
    pub fn is_live_view_on(&self) -> bool {
        self.live_view
    }

    /// The controlled camera.
    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    /// Profiles used to resolve pose settings.
    pub fn profiles(&self) -> &[CameraProfile] {
        &self.profiles
    }

    /// Swap in a freshly loaded profile list. Takes effect on the next shot.
    pub fn replace_profiles(&mut self, profiles: Vec<CameraProfile>) {
        debug!(count = profiles.len(), "Replacing camera profiles");
        self.profiles = profiles;
    }

    /// Collection carrying the session's updated thumbnails.
    pub fn session_collection(&self) -> Option<Collection> {
        self.state.as_ref().map(SessionState::collection_snapshot)
    }

    fn session_label(&self) -> String {
        self.state
            .as_ref()
            .map_or_else(|| "-".to_string(), |s| s.session_id.to_string())
    }

    fn invalid_state(&self, operation: &'static str) -> CaptureError {
        CaptureError::InvalidState {
            operation,
            state: self.phase.to_string(),
        }
    }

    /// Record a validated subject and collection and work out folder numbering.
    ///
    /// Nothing is created yet; the returned plan tells the caller whether to
    /// ask about overwriting the latest session.
    pub fn configure(
        &mut self,
        identity: SubjectIdentity,
        collection: Collection,
    ) -> AppResult<SessionPlan> {
        if !self.phase.can_configure() {
            return Err(self.invalid_state("configure a session"));
        }
        let root = naming::session_root(&collection, &identity);
        let plan = SessionPlan::new(naming::count_session_folders(&root)?);
        debug!(
            rid = %identity.rid,
            existing = plan.existing_sessions,
            "Session configured"
        );
        self.pending = Some(PendingSession {
            identity,
            collection,
            plan,
        });
        self.phase = SessionPhase::Configuring;
        Ok(plan)
    }

    /// Create the session folder, point the camera at the host and open the log.
    pub async fn begin(&mut self, policy: SessionFolderPolicy) -> AppResult<BeginReport> {
        if !self.phase.can_begin() {
            return Err(self.invalid_state("begin a session"));
        }
        let Some(pending) = self.pending.as_ref() else {
            return Err(self.invalid_state("begin a session"));
        };

        let session_number = pending.plan.session_number(policy);
        let save_path = naming::save_path(&pending.collection, &pending.identity, session_number);
        let save_path_had_content = naming::has_contents(&save_path)?;
        if save_path_had_content {
            warn!(
                path = %save_path.display(),
                "Save path already contains files; they may be overwritten"
            );
        }

        self.device
            .set_property(PropertyId::SaveTo, SaveTo::Host.code())
            .await
            .map_err(|e| CaptureError::device("set save target", e))?;
        self.device
            .set_capacity(Capacity::UNLIMITED)
            .await
            .map_err(|e| CaptureError::device("set capacity", e))?;

        // Until the log line is written the session stays pending and `begin` can be retried
        std::fs::create_dir_all(&save_path)?;
        ActionLog::new(&save_path)
            .append(&format!("Subject RID: {} - Session Start", pending.identity.rid))?;

        let Some(pending) = self.pending.take() else {
            return Err(self.invalid_state("begin a session"));
        };
        let state = SessionState::new(
            pending.identity,
            pending.collection,
            session_number,
            save_path,
        );

        info!(
            session_id = %state.session_id,
            rid = %state.identity.rid,
            session_number,
            poses = state.poses.len(),
            "Session started"
        );
        let report = BeginReport {
            session_id: state.session_id,
            session_number,
            save_path: state.save_path.clone(),
            save_path_had_content,
        };
        self.state = Some(state);
        self.phase = SessionPhase::Active;
        Ok(report)
    }

    /// `configure` followed by `begin`. On failure the controller returns to `Idle`.
    pub async fn start(
        &mut self,
        identity: SubjectIdentity,
        collection: Collection,
        policy: SessionFolderPolicy,
    ) -> AppResult<BeginReport> {
        self.configure(identity, collection)?;
        match self.begin(policy).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.end();
                Err(e)
            }
        }
    }

    /// Shoot the pose under the cursor.
    ///
    /// Returns once the camera accepted the shutter press. With every pose
    /// already captured this ends the session instead.
    #[instrument(skip(self), fields(session_id = %self.session_label()))]
    pub async fn capture(&mut self) -> AppResult<CaptureOutcome> {
        match self.phase {
            SessionPhase::Completed => {
                info!("All poses captured, ending session");
                self.end();
                return Ok(CaptureOutcome::SessionEnded);
            }
            SessionPhase::Active => {}
            _ => return Err(self.invalid_state("capture")),
        }

        let Some(state) = self.state.as_ref() else {
            return Err(self.invalid_state("capture"));
        };
        let pose_index = state.capture_number;
        let Some(pose) = state.current_pose().cloned() else {
            self.end();
            return Ok(CaptureOutcome::SessionEnded);
        };

        self.apply_pose_profile(&pose).await?;
        self.press_shutter().await?;

        if let Some(state) = self.state.as_mut() {
            state.capture_number += 1;
            state.in_flight = Some(InFlightCapture {
                pose_index,
                recapture: false,
            });
        }
        self.phase = SessionPhase::CaptureInFlight;
        debug!(pose_index, "Shutter pressed");
        Ok(CaptureOutcome::Started { pose_index })
    }

    /// Shoot an already captured pose again without moving the cursor.
    #[instrument(skip(self), fields(session_id = %self.session_label()))]
    pub async fn recapture(&mut self, index: usize) -> AppResult<CaptureOutcome> {
        if !self.phase.can_recapture() {
            return Err(self.invalid_state("recapture"));
        }
        let Some(state) = self.state.as_ref() else {
            return Err(self.invalid_state("recapture"));
        };
        if index >= state.capture_number {
            return Err(CaptureError::RecaptureOutOfRange {
                index,
                capture_number: state.capture_number,
            });
        }
        let Some(pose) = state.poses.get(index).cloned() else {
            return Err(CaptureError::RecaptureOutOfRange {
                index,
                capture_number: state.capture_number,
            });
        };

        self.apply_pose_profile(&pose).await?;
        self.press_shutter().await?;

        if let Some(state) = self.state.as_mut() {
            state.in_flight = Some(InFlightCapture {
                pose_index: index,
                recapture: true,
            });
        }
        self.phase = SessionPhase::CaptureInFlight;
        debug!(pose_index = index, "Shutter pressed for recapture");
        Ok(CaptureOutcome::Started { pose_index: index })
    }

    /// Store the image the camera just produced.
    ///
    /// Releases the shutter, downloads under the canonical name, logs the
    /// capture and points the pose's thumbnail at the new file. An image with
    /// no session or no capture in flight (for example after `end`) is
    /// ignored and yields `Ok(None)`.
    #[instrument(skip(self, info), fields(session_id = %self.session_label()))]
    pub async fn on_image_ready(&mut self, info: DownloadInfo) -> AppResult<Option<CapturedFile>> {
        if let Err(e) = self
            .device
            .send_command(CameraCommand::PressShutter(ShutterButton::Off))
            .await
        {
            warn!(error = %e, "Failed to release shutter");
        }

        let Some(state) = self.state.as_ref() else {
            warn!(file = %info.file_name, "Image ready with no session, ignoring");
            return Ok(None);
        };
        let Some(in_flight) = state.in_flight else {
            warn!(file = %info.file_name, "Image ready with no capture in flight, ignoring");
            return Ok(None);
        };
        let Some(pose) = state.poses.get(in_flight.pose_index) else {
            warn!(
                pose_index = in_flight.pose_index,
                "Image ready for a pose outside the session, ignoring"
            );
            return Ok(None);
        };

        let filename = naming::build_filename(
            &state.identity,
            &state.collection,
            state.session_number,
            pose,
        );
        let target_dir = naming::capture_dir(&state.save_path, pose);
        let log = ActionLog::new(&state.save_path);
        let pose_filename = pose.filename.clone();

        let download = DownloadInfo {
            file_name: filename.clone(),
            size: info.size,
        };
        let downloaded = match tokio::fs::create_dir_all(&target_dir).await {
            Ok(()) => self
                .device
                .download_file(download, &target_dir)
                .await
                .map_err(|e| CaptureError::device("download image", e)),
            Err(e) => Err(CaptureError::Io(e)),
        };
        let path = match downloaded {
            Ok(path) => path,
            Err(e) => {
                self.abandon_in_flight(in_flight);
                return Err(e);
            }
        };

        let Some(state) = self.state.as_mut() else {
            return Ok(None);
        };
        if let Some(pose) = state.poses.get_mut(in_flight.pose_index) {
            pose.thumbnail = Some(path.clone());
        }
        state.in_flight = None;
        self.phase = if state.is_complete() {
            SessionPhase::Completed
        } else {
            SessionPhase::Active
        };

        let verb = if in_flight.recapture {
            "Recaptured"
        } else {
            "Captured"
        };
        info!(
            pose_index = in_flight.pose_index,
            path = %path.display(),
            "{} image",
            verb
        );
        log.append(&format!("{} image - {}", verb, pose_filename))?;

        Ok(Some(CapturedFile {
            pose_index: in_flight.pose_index,
            filename,
            path,
            recapture: in_flight.recapture,
        }))
    }

    fn abandon_in_flight(&mut self, in_flight: InFlightCapture) {
        if let Some(state) = self.state.as_mut() {
            state.in_flight = None;
            if !in_flight.recapture {
                state.capture_number = in_flight.pose_index;
            }
        }
        self.phase = SessionPhase::Active;
        warn!(
            pose_index = in_flight.pose_index,
            "Image transfer failed; pose can be shot again"
        );
    }

    /// React to a camera state notification. Returns `true` when live view was
    /// switched off because the camera shut down.
    pub async fn on_state_changed(&mut self, event: StateEvent) -> AppResult<bool> {
        match event {
            StateEvent::Shutdown => {
                warn!("Camera shut down, turning live view off");
                if let Err(e) = self.set_live_view(false).await {
                    warn!(error = %e, "Live view shutdown incomplete");
                }
                self.live_view = false;
                Ok(true)
            }
            StateEvent::WillSoonShutdown => {
                debug!("Camera will soon shut down");
                Ok(false)
            }
            StateEvent::Other(id) => {
                debug!(event_id = id, "Camera state changed");
                Ok(false)
            }
        }
    }

    /// Reset all session state. Safe in any phase and when already idle.
    ///
    /// An image arriving for a shot sent before `end` is ignored afterwards.
    pub fn end(&mut self) {
        if let Some(state) = self.state.take() {
            info!(
                session_id = %state.session_id,
                captured = state.capture_number,
                "Session ended"
            );
        }
        self.pending = None;
        self.phase = SessionPhase::Idle;
    }

    /// Turn live view on (fresh camera session) or off (session closed).
    pub async fn set_live_view(&mut self, on: bool) -> AppResult<()> {
        if on {
            if self.device.is_session_open() {
                if let Err(e) = self.device.close_session().await {
                    debug!(error = %e, "Closing previous camera session failed");
                }
            }
            self.device
                .open_session()
                .await
                .map_err(|e| CaptureError::device("open camera session", e))?;
            self.device
                .start_live_view()
                .await
                .map_err(|e| CaptureError::device("start live view", e))?;
            self.live_view = true;
            info!(model = %self.device.model_name(), "Live view on");
        } else {
            self.live_view = false;
            self.device
                .stop_live_view()
                .await
                .map_err(|e| CaptureError::device("stop live view", e))?;
            self.device
                .close_session()
                .await
                .map_err(|e| CaptureError::device("close camera session", e))?;
            info!("Live view off");
        }
        Ok(())
    }

    /// Live-view autofocus on or off.
    pub async fn autofocus(&self, on: bool) -> AppResult<()> {
        self.device
            .send_command(CameraCommand::AutoFocus(on))
            .await
            .map_err(|e| CaptureError::device("autofocus", e))
    }

    /// Apply the profile of pose `index`, then start autofocus.
    ///
    /// Used while the operator holds the focus control before a (re)capture.
    pub async fn focus_pose(&self, index: usize) -> AppResult<()> {
        let pose = self
            .state
            .as_ref()
            .and_then(|s| s.poses.get(index))
            .cloned()
            .ok_or_else(|| self.invalid_state("focus a pose"))?;
        self.apply_pose_profile(&pose).await?;
        self.autofocus(true).await
    }

    /// Write a profile's settings to the camera.
    ///
    /// Missing or unknown aperture, shutter and ISO values are sent as the
    /// unsupported code so the camera clamps them. White balance is only
    /// written when it is set and known.
    pub async fn apply_profile(&self, profile: &CameraProfile) -> AppResult<()> {
        let exposure_settings = [
            (SettingKind::Aperture, profile.fstop.as_deref()),
            (SettingKind::ShutterSpeed, profile.exposure.as_deref()),
            (SettingKind::Iso, profile.iso.as_deref()),
        ];
        for (kind, value) in exposure_settings {
            let code = match value {
                Some(v) => SettingTranslator::encode(kind, v),
                None => UNSUPPORTED,
            };
            if code == UNSUPPORTED {
                warn!(
                    profile = %profile.name,
                    setting = %kind,
                    value = value.unwrap_or("<unset>"),
                    "Setting not in table, sending unsupported code"
                );
            }
            self.device
                .set_property(kind.property(), code)
                .await
                .map_err(|e| CaptureError::device("apply camera settings", e))?;
        }

        let white_balance = profile
            .white_balance
            .as_deref()
            .and_then(|v| SettingTranslator::try_encode(SettingKind::WhiteBalance, v));
        match white_balance {
            Some(code) => self
                .device
                .set_property(PropertyId::WhiteBalance, code)
                .await
                .map_err(|e| CaptureError::device("apply camera settings", e))?,
            None => debug!(profile = %profile.name, "White balance left unchanged"),
        }
        Ok(())
    }

    async fn apply_pose_profile(&self, pose: &Pose) -> AppResult<()> {
        let name = pose.profile_name();
        match self.profiles.iter().find(|p| p.name == name) {
            Some(profile) => self.apply_profile(profile).await,
            None => {
                warn!(
                    profile = name,
                    pose = %pose.filename,
                    "Camera profile not found, capturing with current settings"
                );
                Ok(())
            }
        }
    }

    async fn press_shutter(&self) -> AppResult<()> {
        self.device
            .send_command(CameraCommand::PressShutter(ShutterButton::CompletelyNonAf))
            .await
            .map_err(|e| CaptureError::device("capture", e))
    }

    /// Read back the camera's current exposure settings.
    pub async fn current_settings(&self) -> AppResult<DeviceSettings> {
        let mut settings = DeviceSettings::default();
        for kind in SettingKind::ALL {
            let code = self
                .device
                .get_property(kind.property())
                .await
                .map_err(|e| CaptureError::device("read camera settings", e))?;
            let value = SettingTranslator::decode(kind, code);
            match kind {
                SettingKind::Aperture => settings.fstop = value,
                SettingKind::ShutterSpeed => settings.exposure = value,
                SettingKind::Iso => settings.iso = value,
                SettingKind::WhiteBalance => settings.white_balance = value,
            }
        }
        Ok(settings)
    }
}
