//! File naming and the session action log.
//!
//! Layout under a collection's saving directory:
//!
//! ```text
//! <saving>/<rid>/<date>/<session>/<modality>/<device>/ActionLog.txt
//! <saving>/<rid>/<date>/<session>/<modality>/<device>/<profile>/<rid>_<date>_<col>_<session>_<modality>_<device>_<profile>_<pose filename>
//! ```

use crate::model::{Collection, Pose, SubjectIdentity};
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File name of the per-session action log
pub const ACTION_LOG_FILE: &str = "ActionLog.txt";

/// Canonical name of the file captured for `pose`.
///
/// Pure: identical inputs always give the identical string. Splitting the
/// result on `_` recovers the eight fields only when none of them contains
/// `_` itself; the name rule allows underscores, so e.g. a profile named
/// `face_day` yields nine segments.
pub fn build_filename(
    identity: &SubjectIdentity,
    collection: &Collection,
    session_number: u32,
    pose: &Pose,
) -> String {
    format!(
        "{}_{}_{}_{}_{}_{}_{}_{}",
        identity.rid,
        identity.date,
        collection.collection_number,
        session_number,
        collection.modality,
        collection.device_name,
        pose.profile_name(),
        pose.filename
    )
}

/// `<saving>/<rid>/<date>`: parent of every session folder for this subject and day.
pub fn session_root(collection: &Collection, identity: &SubjectIdentity) -> PathBuf {
    collection
        .saving_directory
        .join(&identity.rid)
        .join(&identity.date)
}

/// Directory holding the action log and per-profile capture folders.
pub fn save_path(
    collection: &Collection,
    identity: &SubjectIdentity,
    session_number: u32,
) -> PathBuf {
    session_root(collection, identity)
        .join(session_number.to_string())
        .join(&collection.modality)
        .join(&collection.device_name)
}

/// Download target for `pose` inside a session's save path.
pub fn capture_dir(save_path: &Path, pose: &Pose) -> PathBuf {
    save_path.join(pose.profile_name())
}

/// Number of session folders already present under `root`; 0 when it does not exist.
pub fn count_session_folders(root: &Path) -> io::Result<usize> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let mut count = 0;
    for entry in entries {
        if entry?.file_type()?.is_dir() {
            count += 1;
        }
    }
    Ok(count)
}

/// Whether `dir` exists and has any entry.
pub fn has_contents(dir: &Path) -> io::Result<bool> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Append-only `ActionLog.txt` for one session.
#[derive(Debug, Clone)]
pub struct ActionLog {
    path: PathBuf,
}

impl ActionLog {
    /// Log file inside `save_path`.
    pub fn new(save_path: &Path) -> Self {
        Self {
            path: save_path.join(ACTION_LOG_FILE),
        }
    }

    /// Full path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `"<message> @ <local time>"`, creating the file if needed.
    pub fn append(&self, message: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            file,
            "{} @ {}",
            message,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )
    }
}
