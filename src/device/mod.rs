//! Tethered camera interface
//!
//! The session controller never talks to a vendor SDK directly. It drives a
//! [`Device`], a small async trait covering what a capture session needs:
//!
//! - session lifetime (`open_session` / `close_session`)
//! - live view (`start_live_view` / `stop_live_view`)
//! - shutter and autofocus commands (`send_command`)
//! - numeric property access (`get_property` / `set_property`)
//! - host transfer (`set_capacity` / `download_file`)
//!
//! Asynchronous notifications (state changes, image ready, live-view frames)
//! are published on a broadcast channel obtained with [`Device::subscribe`].
//! They are produced on the device's own execution context; consumers must
//! not touch session state from that context. The session actor receives
//! them in its event loop instead (see [`crate::session::actor`]).
//!
//! # Design Philosophy
//!
//! Like the other hardware capabilities in this codebase, the trait:
//! - Is async (uses #[async_trait])
//! - Is thread-safe (requires Send + Sync)
//! - Uses anyhow::Result for errors; callers classify failures

pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

/// Camera properties the capture workflow reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    /// F-stop (`Av`)
    Aperture,
    /// Exposure time (`Tv`)
    ShutterSpeed,
    /// Sensitivity
    Iso,
    /// White balance mode
    WhiteBalance,
    /// Where captured images go (`SaveTo`)
    SaveTo,
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyId::Aperture => "Av",
            PropertyId::ShutterSpeed => "Tv",
            PropertyId::Iso => "ISO",
            PropertyId::WhiteBalance => "WhiteBalance",
            PropertyId::SaveTo => "SaveTo",
        };
        f.write_str(name)
    }
}

/// Values for [`PropertyId::SaveTo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTo {
    /// Memory card only
    Camera = 1,
    /// Downloaded to the host only
    Host = 2,
    /// Card and host
    Both = 3,
}

impl SaveTo {
    /// Raw property value.
    pub fn code(self) -> i64 {
        self as i64
    }
}

/// Shutter button positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterButton {
    /// Released
    Off,
    /// Half press, autofocus
    Halfway,
    /// Full press, autofocus then shoot
    Completely,
    /// Half press without autofocus
    HalfwayNonAf,
    /// Full press without autofocus
    CompletelyNonAf,
}

/// Commands sent through [`Device::send_command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCommand {
    /// Move the shutter button
    PressShutter(ShutterButton),
    /// Live-view autofocus on/off
    AutoFocus(bool),
}

impl fmt::Display for CameraCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraCommand::PressShutter(ShutterButton::Off) => f.write_str("release shutter"),
            CameraCommand::PressShutter(button) => write!(f, "press shutter ({:?})", button),
            CameraCommand::AutoFocus(true) => f.write_str("autofocus on"),
            CameraCommand::AutoFocus(false) => f.write_str("autofocus off"),
        }
    }
}

/// Host storage capacity advertised to the camera before capturing to host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    /// Sector size reported to the camera
    pub bytes_per_sector: i32,
    /// Free sectors reported to the camera
    pub free_clusters: i32,
}

impl Capacity {
    /// Effectively unlimited; the camera never refuses a shot for lack of space.
    pub const UNLIMITED: Capacity = Capacity {
        bytes_per_sector: 999_999_999,
        free_clusters: i32::MAX,
    };
}

/// Handle to an image waiting on the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadInfo {
    /// Name the file will be written under; the controller rewrites it.
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
}

/// Camera state notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// Camera turned off or disconnected
    Shutdown,
    /// Auto power-off is imminent
    WillSoonShutdown,
    /// Any other state code
    Other(u32),
}

/// Asynchronous notifications emitted by a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Camera state changed
    StateChanged(StateEvent),
    /// An exposure finished and can be downloaded
    ImageReady(DownloadInfo),
    /// A live-view frame is available
    LiveViewFrame {
        /// Monotonic frame counter
        sequence: u64,
    },
}

/// A tethered camera.
///
/// # Contract
/// - `send_command` returns once the camera accepted the command; a shutter
///   press does not wait for the image
/// - `ImageReady` is published later, once per exposure
/// - `download_file` writes `info.file_name` into `destination` and returns the path
#[async_trait]
pub trait Device: Send + Sync {
    /// Model name, compared against collection and profile `camera` fields.
    fn model_name(&self) -> &str;

    /// Open the camera session.
    async fn open_session(&self) -> Result<()>;

    /// Close the camera session.
    async fn close_session(&self) -> Result<()>;

    /// Whether a session is open.
    fn is_session_open(&self) -> bool;

    /// Start streaming live-view frames.
    async fn start_live_view(&self) -> Result<()>;

    /// Stop live view.
    async fn stop_live_view(&self) -> Result<()>;

    /// Send a camera command.
    async fn send_command(&self, command: CameraCommand) -> Result<()>;

    /// Read a property's raw value.
    async fn get_property(&self, property: PropertyId) -> Result<i64>;

    /// Write a property's raw value.
    async fn set_property(&self, property: PropertyId, value: i64) -> Result<()>;

    /// Advertise host storage capacity.
    async fn set_capacity(&self, capacity: Capacity) -> Result<()>;

    /// Transfer an image to the host.
    async fn download_file(&self, info: DownloadInfo, destination: &Path) -> Result<PathBuf>;

    /// Subscribe to device notifications.
    ///
    /// Events published before the call are not replayed.
    fn subscribe(&self) -> broadcast::Receiver<DeviceEvent>;
}
