//! Sessions
//!
//! A session is one execution of a wand program. It owns a timestamped
//! directory holding the log file and any data saved during the run, and
//! fixes the process-wide epoch that log timestamps are measured from.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use log::warn;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::time::duration_to_seconds;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Wall clock time at which the session was opened.
static EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

/// strftime format of the session directory suffix.
const DIR_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Session {
    /// Directory of this session, `{exec_name}_{timestamp}`.
    pub session_root: PathBuf,

    /// `{exec_name}.log` inside the session root.
    pub log_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("HAPTIC_WAND_SW_ROOT is not set, cannot locate the sessions directory")]
    SwRootNotSet,

    #[error("Failed to create the session directory {0:?}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("A session was already opened by this process ({0})")]
    AlreadyOpen(conquer_once::TryInitError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Open the session under `$HAPTIC_WAND_SW_ROOT/{sessions_dir}`.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = crate::host::get_wand_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        Self::in_dir(exec_name, root.join(sessions_dir))
    }

    /// Open the session under an explicit parent directory.
    ///
    /// Only one session may be opened per process.
    pub fn in_dir<P: AsRef<Path>>(exec_name: &str, parent: P) -> Result<Self, SessionError> {
        let epoch = Utc::now();
        EPOCH
            .try_init_once(|| epoch)
            .map_err(SessionError::AlreadyOpen)?;

        let session_root = parent.as_ref().join(format!(
            "{}_{}",
            exec_name,
            epoch.format(DIR_STAMP_FORMAT)
        ));
        fs::create_dir_all(&session_root)
            .map_err(|e| SessionError::CreateDir(session_root.clone(), e))?;

        let log_file_path = session_root.join(format!("{}.log", exec_name));

        Ok(Session {
            session_root,
            log_file_path,
        })
    }

    /// Write `data` as pretty printed JSON to `rel_path` inside the session.
    ///
    /// Missing parent directories are created. A failed save is logged as a
    /// warning and otherwise ignored.
    pub fn save<P: AsRef<Path>, T: Serialize>(&self, rel_path: P, data: &T) {
        let path = self.session_root.join(rel_path);

        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| File::create(&path))
            .and_then(|file| serde_json::to_writer_pretty(file, data).map_err(Into::into));

        if let Err(e) = result {
            warn!("Could not save {}: {}", path.display(), e);
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds since the session was opened, `NAN` before that.
pub fn get_elapsed_seconds() -> f64 {
    EPOCH
        .get()
        .and_then(|epoch| duration_to_seconds(Utc::now() - *epoch))
        .unwrap_or(std::f64::NAN)
}

/// The session epoch, `None` until a session has been opened.
pub fn get_epoch() -> Option<&'static DateTime<Utc>> {
    EPOCH.get()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_session_in_dir_and_save() {
        let parent = std::env::temp_dir().join("haptic_wand_util_session_test");

        let session = Session::in_dir("util_test", &parent).unwrap();
        assert!(session.session_root.starts_with(&parent));
        assert!(session.session_root.is_dir());
        assert_eq!(
            session.log_file_path.file_name().unwrap().to_str(),
            Some("util_test.log")
        );
        assert!(get_epoch().is_some());

        session.save("out/summary.json", &vec![1.0f64, -2.5]);
        let saved = fs::read_to_string(session.session_root.join("out/summary.json")).unwrap();
        let values: Vec<f64> = serde_json::from_str(&saved).unwrap();
        assert_eq!(values, vec![1.0, -2.5]);

        assert!(get_elapsed_seconds() >= 0.0);

        assert!(matches!(
            Session::in_dir("util_test", &parent),
            Err(SessionError::AlreadyOpen(_))
        ));

        fs::remove_dir_all(&session.session_root).ok();
    }
}
