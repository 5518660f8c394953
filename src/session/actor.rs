//! Session actor.
//!
//! One tokio task owns the [`CaptureSessionController`]. Callers talk to it
//! through a cloneable [`SessionHandle`]; device notifications arrive on the
//! device's broadcast channel and are consumed in the same `select!` loop.
//! Session state is therefore only ever touched from the actor task.
//!
//! ```text
//! SessionHandle ──mpsc SessionCommand──>┐
//!                                       ├─> SessionActor ──broadcast SessionNotice──> subscribers
//! Device ──broadcast DeviceEvent───────>┘
//! ```

use crate::config::SessionConfig;
use crate::device::DeviceEvent;
use crate::error::{AppResult, CaptureError};
use crate::model::{CameraProfile, Collection, SubjectIdentity};
use crate::session::controller::{CaptureSessionController, DeviceSettings};
use crate::session::messages::{SessionCommand, SessionNotice, SessionStatus};
use crate::session::state::{BeginReport, CaptureOutcome, SessionFolderPolicy, SessionPlan};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Owns a [`CaptureSessionController`] and serializes access to it.
pub struct SessionActor {
    controller: CaptureSessionController,
    notice_tx: broadcast::Sender<SessionNotice>,
}

impl SessionActor {
    /// Spawn the actor task for `controller`.
    pub fn spawn(
        controller: CaptureSessionController,
        config: &SessionConfig,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (notice_tx, _) = broadcast::channel(config.event_capacity);
        let events = controller.device().subscribe();

        let actor = SessionActor {
            controller,
            notice_tx: notice_tx.clone(),
        };
        let task = tokio::spawn(actor.run(command_rx, events));
        (
            SessionHandle {
                command_tx,
                notice_tx,
            },
            task,
        )
    }

    /// Process commands and device events until `Shutdown` or every handle is dropped.
    pub async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<SessionCommand>,
        mut events: broadcast::Receiver<DeviceEvent>,
    ) {
        info!("SessionActor started");
        let mut events_open = true;

        loop {
            tokio::select! {
                command = command_rx.recv() => {
                    match command {
                        Some(SessionCommand::Shutdown { response }) => {
                            self.controller.end();
                            let _ = response.send(());
                            break;
                        }
                        Some(command) => self.handle_command(command).await,
                        None => {
                            debug!("All session handles dropped");
                            break;
                        }
                    }
                }
                event = events.recv(), if events_open => {
                    match event {
                        Ok(event) => self.handle_event(event).await,
                        Err(RecvError::Lagged(n)) => {
                            warn!(skipped = n, "Device events lagged");
                        }
                        Err(RecvError::Closed) => {
                            warn!("Device event channel closed");
                            events_open = false;
                        }
                    }
                }
            }
        }

        self.controller.end();
        info!("SessionActor stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        let controller = &mut self.controller;
        match command {
            SessionCommand::Configure {
                identity,
                collection,
                response,
            } => {
                let _ = response.send(controller.configure(identity, collection));
            }
            SessionCommand::Begin { policy, response } => {
                let _ = response.send(controller.begin(policy).await);
            }
            SessionCommand::Start {
                identity,
                collection,
                policy,
                response,
            } => {
                let _ = response.send(controller.start(identity, collection, policy).await);
            }
            SessionCommand::Capture { response } => {
                let _ = response.send(controller.capture().await);
            }
            SessionCommand::Recapture { index, response } => {
                let _ = response.send(controller.recapture(index).await);
            }
            SessionCommand::End { response } => {
                controller.end();
                let _ = response.send(());
            }
            SessionCommand::SetLiveView { on, response } => {
                let _ = response.send(controller.set_live_view(on).await);
            }
            SessionCommand::Autofocus { on, response } => {
                let _ = response.send(controller.autofocus(on).await);
            }
            SessionCommand::FocusPose { index, response } => {
                let _ = response.send(controller.focus_pose(index).await);
            }
            SessionCommand::ApplyProfile { profile, response } => {
                let _ = response.send(controller.apply_profile(&profile).await);
            }
            SessionCommand::CurrentSettings { response } => {
                let _ = response.send(controller.current_settings().await);
            }
            SessionCommand::ReplaceProfiles { profiles, response } => {
                controller.replace_profiles(profiles);
                let _ = response.send(());
            }
            SessionCommand::SessionCollection { response } => {
                let _ = response.send(controller.session_collection());
            }
            SessionCommand::Status { response } => {
                let state = controller.state();
                let _ = response.send(SessionStatus {
                    phase: controller.phase(),
                    session_id: state.map(|s| s.session_id),
                    capture_number: controller.capture_number(),
                    pose_count: state.map_or(0, |s| s.poses.len()),
                    live_view: controller.is_live_view_on(),
                });
            }
            SessionCommand::Shutdown { response } => {
                // Handled in the run loop
                let _ = response.send(());
            }
        }
    }

    async fn handle_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::ImageReady(info) => match self.controller.on_image_ready(info).await {
                Ok(Some(captured)) => {
                    let _ = self.notice_tx.send(SessionNotice::Captured(captured));
                }
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "Image handling failed");
                    let _ = self.notice_tx.send(SessionNotice::CaptureFailed {
                        message: e.to_string(),
                    });
                }
            },
            DeviceEvent::StateChanged(state) => match self.controller.on_state_changed(state).await
            {
                Ok(true) => {
                    let _ = self.notice_tx.send(SessionNotice::DeviceShutdown);
                }
                Ok(false) => {}
                Err(e) => warn!(error = %e, "State change handling failed"),
            },
            DeviceEvent::LiveViewFrame { sequence } => {
                trace!(sequence, "Live view frame");
            }
        }
    }
}

/// Cloneable handle to a running [`SessionActor`].
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    notice_tx: broadcast::Sender<SessionNotice>,
}

impl SessionHandle {
    /// Receive notices published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.notice_tx.subscribe()
    }

    async fn request<T>(&self, (command, rx): (SessionCommand, oneshot::Receiver<T>)) -> AppResult<T> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| CaptureError::ActorUnavailable)?;
        rx.await.map_err(|_| CaptureError::ActorUnavailable)
    }

    /// Record subject and collection; see [`CaptureSessionController::configure`].
    pub async fn configure(
        &self,
        identity: SubjectIdentity,
        collection: Collection,
    ) -> AppResult<SessionPlan> {
        self.request(SessionCommand::configure(identity, collection))
            .await?
    }

    /// Create the session folder and start capturing.
    pub async fn begin(&self, policy: SessionFolderPolicy) -> AppResult<BeginReport> {
        self.request(SessionCommand::begin(policy)).await?
    }

    /// Configure and begin in one request.
    pub async fn start(
        &self,
        identity: SubjectIdentity,
        collection: Collection,
        policy: SessionFolderPolicy,
    ) -> AppResult<BeginReport> {
        self.request(SessionCommand::start(identity, collection, policy))
            .await?
    }

    /// Shoot the pose under the cursor.
    pub async fn capture(&self) -> AppResult<CaptureOutcome> {
        self.request(SessionCommand::capture()).await?
    }

    /// Shoot an already captured pose again.
    pub async fn recapture(&self, index: usize) -> AppResult<CaptureOutcome> {
        self.request(SessionCommand::recapture(index)).await?
    }

    /// End the running session, if any.
    pub async fn end(&self) -> AppResult<()> {
        self.request(SessionCommand::end()).await
    }

    /// Turn live view on or off.
    pub async fn set_live_view(&self, on: bool) -> AppResult<()> {
        self.request(SessionCommand::set_live_view(on)).await?
    }

    /// Start or stop live-view autofocus.
    pub async fn autofocus(&self, on: bool) -> AppResult<()> {
        self.request(SessionCommand::autofocus(on)).await?
    }

    /// Apply a pose's profile, then autofocus.
    pub async fn focus_pose(&self, index: usize) -> AppResult<()> {
        self.request(SessionCommand::focus_pose(index)).await?
    }

    /// Write a profile's settings to the camera.
    pub async fn apply_profile(&self, profile: CameraProfile) -> AppResult<()> {
        self.request(SessionCommand::apply_profile(profile)).await?
    }

    /// Read back the camera's settings.
    pub async fn current_settings(&self) -> AppResult<DeviceSettings> {
        self.request(SessionCommand::current_settings()).await?
    }

    /// Swap in a freshly loaded profile list.
    pub async fn replace_profiles(&self, profiles: Vec<CameraProfile>) -> AppResult<()> {
        self.request(SessionCommand::replace_profiles(profiles))
            .await
    }

    /// Collection with the session's thumbnails.
    pub async fn session_collection(&self) -> AppResult<Option<Collection>> {
        self.request(SessionCommand::session_collection()).await
    }

    /// Snapshot for status displays.
    pub async fn status(&self) -> AppResult<SessionStatus> {
        self.request(SessionCommand::status()).await
    }

    /// End any session and stop the actor.
    pub async fn shutdown(&self) -> AppResult<()> {
        self.request(SessionCommand::shutdown()).await
    }
}
