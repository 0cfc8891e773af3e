//! Timeout-guarded filesystem probes.
//!
//! A mount whose server went away does not fail filesystem calls, it
//! blocks them. Probing such a path from the calling thread would import
//! the hang; these probes do the touching on a throwaway thread and give
//! up on it after a timeout.

use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Default deadline for a directory probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Whether `path` is a directory that answers a read within `timeout`.
///
/// Opens the directory and pulls the first entry, which forces an actual
/// round trip on remote filesystems. Returns `false` for paths that do
/// not exist, are not directories, error on read, or fail to answer in
/// time. The probe thread is abandoned on timeout; it parks no resources
/// beyond its own stack until the blocked call eventually returns.
pub fn directory_responsive(path: &Path, timeout: Duration) -> bool {
    let probed = path.to_path_buf();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let alive = match fs::read_dir(&probed) {
            Ok(mut entries) => entries.next().is_none_or(|first| first.is_ok()),
            Err(_) => false,
        };
        let _ = tx.send(alive);
    });

    rx.recv_timeout(timeout).unwrap_or(false)
}
