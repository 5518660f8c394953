//! Mock camera implementation
//!
//! Provides a simulated tethered camera for tests and for running sessions
//! without hardware. Uses async-safe operations (tokio::time::sleep, not
//! std::thread::sleep).
//!
//! # Behaviour
//!
//! - Commands and property writes fail unless a session is open
//! - A full shutter press publishes `ImageReady` after `image_delay`
//!   (disable with [`MockDevice::with_auto_image`] and use [`MockDevice::emit`])
//! - Live view publishes `LiveViewFrame` roughly every 100ms while running
//! - `download_file` writes a small placeholder JPEG
//! - Every command is recorded for later inspection

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::device::{
    CameraCommand, Capacity, DeviceEvent, Device, DownloadInfo, PropertyId, ShutterButton,
    StateEvent,
};

/// Placeholder payload written on download (JPEG SOI + EOI markers).
const PLACEHOLDER_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0xFF, 0xD9];

/// Simulated tethered camera.
///
/// # Example
///
/// ```rust,ignore
/// let camera = MockDevice::new("Canon EOS 5D Mark IV");
/// let mut events = camera.subscribe();
/// camera.open_session().await?;
/// camera.send_command(CameraCommand::PressShutter(ShutterButton::CompletelyNonAf)).await?;
/// // ... DeviceEvent::ImageReady arrives on `events`
/// ```
pub struct MockDevice {
    model_name: String,
    session_open: AtomicBool,
    live_view: Arc<AtomicBool>,
    auto_image: AtomicBool,
    fail_next: AtomicBool,
    image_delay: Duration,
    image_counter: Arc<AtomicU64>,
    properties: RwLock<HashMap<PropertyId, i64>>,
    capacity: RwLock<Option<Capacity>>,
    commands: RwLock<Vec<CameraCommand>>,
    event_tx: broadcast::Sender<DeviceEvent>,
}

impl MockDevice {
    /// Create a mock camera reporting `model_name`.
    pub fn new(model_name: impl Into<String>) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            model_name: model_name.into(),
            session_open: AtomicBool::new(false),
            live_view: Arc::new(AtomicBool::new(false)),
            auto_image: AtomicBool::new(true),
            fail_next: AtomicBool::new(false),
            image_delay: Duration::from_millis(50),
            image_counter: Arc::new(AtomicU64::new(0)),
            properties: RwLock::new(HashMap::new()),
            capacity: RwLock::new(None),
            commands: RwLock::new(Vec::new()),
            event_tx,
        }
    }

    /// Delay between a shutter press and the `ImageReady` notification.
    pub fn with_image_delay(mut self, delay: Duration) -> Self {
        self.image_delay = delay;
        self
    }

    /// Whether shutter presses publish `ImageReady` on their own.
    pub fn with_auto_image(self, enabled: bool) -> Self {
        self.auto_image.store(enabled, Ordering::SeqCst);
        self
    }

    /// Make the next `send_command` fail as a rejected command.
    pub fn fail_next_command(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Publish an arbitrary notification.
    pub fn emit(&self, event: DeviceEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Publish `ImageReady` for the next image number.
    pub fn emit_image_ready(&self) -> DownloadInfo {
        let info = next_download_info(&self.image_counter);
        self.emit(DeviceEvent::ImageReady(info.clone()));
        info
    }

    /// Simulate the camera powering off.
    pub fn simulate_shutdown(&self) {
        self.session_open.store(false, Ordering::SeqCst);
        self.live_view.store(false, Ordering::SeqCst);
        self.emit(DeviceEvent::StateChanged(StateEvent::Shutdown));
    }

    /// Every command accepted or rejected so far, in order.
    pub async fn commands(&self) -> Vec<CameraCommand> {
        self.commands.read().await.clone()
    }

    /// Number of full shutter presses.
    pub async fn shutter_presses(&self) -> usize {
        self.commands
            .read()
            .await
            .iter()
            .filter(|cmd| {
                matches!(
                    cmd,
                    CameraCommand::PressShutter(
                        ShutterButton::Completely | ShutterButton::CompletelyNonAf
                    )
                )
            })
            .count()
    }

    /// Last value written for `property`.
    pub async fn property(&self, property: PropertyId) -> Option<i64> {
        self.properties.read().await.get(&property).copied()
    }

    /// Capacity last advertised, if any.
    pub async fn capacity(&self) -> Option<Capacity> {
        *self.capacity.read().await
    }

    /// Whether live view is running.
    pub fn is_live_view_on(&self) -> bool {
        self.live_view.load(Ordering::SeqCst)
    }

    fn ensure_open(&self, what: &str) -> Result<()> {
        if !self.session_open.load(Ordering::SeqCst) {
            bail!("MockDevice: cannot {} - session not open", what);
        }
        Ok(())
    }
}

fn next_download_info(counter: &AtomicU64) -> DownloadInfo {
    let number = counter.fetch_add(1, Ordering::SeqCst) + 1;
    DownloadInfo {
        file_name: format!("IMG_{:04}.JPG", number),
        size: PLACEHOLDER_JPEG.len() as u64,
    }
}

#[async_trait]
impl Device for MockDevice {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn open_session(&self) -> Result<()> {
        self.session_open.store(true, Ordering::SeqCst);
        debug!(model = %self.model_name, "MockDevice: session opened");
        Ok(())
    }

    async fn close_session(&self) -> Result<()> {
        self.live_view.store(false, Ordering::SeqCst);
        self.session_open.store(false, Ordering::SeqCst);
        debug!(model = %self.model_name, "MockDevice: session closed");
        Ok(())
    }

    fn is_session_open(&self) -> bool {
        self.session_open.load(Ordering::SeqCst)
    }

    async fn start_live_view(&self) -> Result<()> {
        self.ensure_open("start live view")?;
        if self.live_view.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let live_view = Arc::clone(&self.live_view);
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let mut sequence = 0u64;
            while live_view.load(Ordering::SeqCst) {
                sequence += 1;
                let _ = event_tx.send(DeviceEvent::LiveViewFrame { sequence });
                sleep(Duration::from_millis(100)).await;
            }
        });
        debug!("MockDevice: live view started");
        Ok(())
    }

    async fn stop_live_view(&self) -> Result<()> {
        self.live_view.store(false, Ordering::SeqCst);
        debug!("MockDevice: live view stopped");
        Ok(())
    }

    async fn send_command(&self, command: CameraCommand) -> Result<()> {
        self.commands.write().await.push(command);

        if self.fail_next.swap(false, Ordering::SeqCst) {
            bail!("MockDevice: command rejected ({})", command);
        }
        self.ensure_open(&command.to_string())?;
        debug!(%command, "MockDevice: command accepted");

        let full_press = matches!(
            command,
            CameraCommand::PressShutter(ShutterButton::Completely | ShutterButton::CompletelyNonAf)
        );
        if full_press && self.auto_image.load(Ordering::SeqCst) {
            let event_tx = self.event_tx.clone();
            let counter = Arc::clone(&self.image_counter);
            let delay = self.image_delay;
            tokio::spawn(async move {
                // CRITICAL: Use tokio::time::sleep, NOT std::thread::sleep
                sleep(delay).await;
                let info = next_download_info(&counter);
                let _ = event_tx.send(DeviceEvent::ImageReady(info));
            });
        }
        Ok(())
    }

    async fn get_property(&self, property: PropertyId) -> Result<i64> {
        self.ensure_open("read property")?;
        self.properties
            .read()
            .await
            .get(&property)
            .copied()
            .ok_or_else(|| anyhow!("MockDevice: property {} has not been set", property))
    }

    async fn set_property(&self, property: PropertyId, value: i64) -> Result<()> {
        self.ensure_open("write property")?;
        self.properties.write().await.insert(property, value);
        debug!(%property, value, "MockDevice: property set");
        Ok(())
    }

    async fn set_capacity(&self, capacity: Capacity) -> Result<()> {
        self.ensure_open("set capacity")?;
        *self.capacity.write().await = Some(capacity);
        Ok(())
    }

    async fn download_file(&self, info: DownloadInfo, destination: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(destination).await?;
        let path = destination.join(&info.file_name);
        tokio::fs::write(&path, PLACEHOLDER_JPEG).await?;
        debug!(path = %path.display(), "MockDevice: image downloaded");
        Ok(path)
    }

    fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.event_tx.subscribe()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutter_press_publishes_image_ready() {
        let camera = MockDevice::new("ModelX").with_image_delay(Duration::from_millis(5));
        let mut events = camera.subscribe();
        camera.open_session().await.unwrap();

        camera
            .send_command(CameraCommand::PressShutter(ShutterButton::CompletelyNonAf))
            .await
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            DeviceEvent::ImageReady(DownloadInfo {
                file_name: "IMG_0001.JPG".into(),
                size: PLACEHOLDER_JPEG.len() as u64,
            })
        );
        assert_eq!(camera.shutter_presses().await, 1);
    }

    #[tokio::test]
    async fn commands_require_open_session() {
        let camera = MockDevice::new("ModelX");
        let result = camera.send_command(CameraCommand::AutoFocus(true)).await;
        assert!(result.is_err());
        assert!(camera.set_property(PropertyId::Iso, 0x48).await.is_err());
    }

    #[tokio::test]
    async fn fail_next_command_rejects_once() {
        let camera = MockDevice::new("ModelX").with_auto_image(false);
        camera.open_session().await.unwrap();
        camera.fail_next_command();

        assert!(camera.send_command(CameraCommand::AutoFocus(true)).await.is_err());
        assert!(camera.send_command(CameraCommand::AutoFocus(false)).await.is_ok());
        assert_eq!(camera.commands().await.len(), 2);
    }

    #[tokio::test]
    async fn download_writes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let camera = MockDevice::new("ModelX");
        let info = DownloadInfo {
            file_name: "renamed.JPG".into(),
            size: 0,
        };
        let path = camera
            .download_file(info, &dir.path().join("profile"))
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("profile").join("renamed.JPG"));
        assert_eq!(std::fs::read(path).unwrap(), PLACEHOLDER_JPEG);
    }
}
