//! The [`Mounter`] trait and mount point upkeep.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::options::MountTimeouts;
use crate::probe::{DEFAULT_PROBE_TIMEOUT, directory_responsive};

/// Errors from mount operations.
#[derive(Debug, Error)]
pub enum MountError {
    /// OS-level failure launching or talking to the mount tooling.
    #[error("mount tooling failed: {0}")]
    Io(#[from] io::Error),

    /// The mount program ran and refused the request.
    #[error("{program} failed with {status}: {detail}")]
    CommandFailed {
        /// Which program was run.
        program: &'static str,
        /// Its exit status, as reported by the OS.
        status: String,
        /// Trimmed stderr (or stdout) of the program.
        detail: String,
    },

    /// The mount program did not finish before the attempt deadline.
    #[error("{program} did not finish within {timeout:?}")]
    TimedOut {
        /// Which program was run.
        program: &'static str,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The target path cannot be used as a mount point.
    #[error("mount point {} is unusable: {reason}", .target.display())]
    UnusableMountPoint {
        /// The offending path.
        target: PathBuf,
        /// Why it cannot receive a mount.
        reason: String,
    },
}

/// Mounting capability a driver negotiates against.
///
/// [`SystemMounter`](crate::SystemMounter) is the production
/// implementation; [`testing::ScriptedMounter`](crate::testing::ScriptedMounter)
/// stands in for it in tests.
pub trait Mounter: Send + Sync {
    /// Attach `source` at `target` with filesystem type `fstype`.
    ///
    /// `options` and `sensitive` are both passed to the mount program, but
    /// only `options` may ever appear in logs or error text; `sensitive`
    /// carries credentials-bearing options. The attempt is bounded by
    /// `timeouts` and fails rather than blocking past its deadline.
    fn mount(
        &self,
        source: &str,
        target: &Path,
        fstype: &str,
        options: &[String],
        sensitive: &[String],
        timeouts: MountTimeouts,
    ) -> Result<(), MountError>;

    /// Whether `target` currently appears in the system mount table.
    fn is_mount_point(&self, target: &Path) -> Result<bool, MountError>;

    /// Detach the filesystem at `target`. `force` escalates to the
    /// platform's forced unmount.
    fn unmount(&self, target: &Path, force: bool) -> Result<(), MountError>;
}

/// What [`ensure_mount_point`] found at the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountPointState {
    /// The path is already an active, responsive mount point.
    Mounted,
    /// The path exists (or was just created) and is ready to receive a
    /// mount.
    Unmounted,
}

/// Prepare `target` to either reuse or receive a mount.
///
/// Handles the three states a mount directory can be left in by earlier
/// runs:
///
/// 1. Already mounted and responsive: reported as
///    [`MountPointState::Mounted`] so the caller can skip mounting.
/// 2. Mounted but dead (server gone, process crashed mid-unmount): the
///    stale mount is force-detached and the directory prepared as if
///    fresh.
/// 3. Absent or plain directory: created with `0700` permissions as
///    needed.
///
/// A `target` that exists but is not a directory is an error; nothing is
/// deleted to make room.
pub fn ensure_mount_point(
    target: &Path,
    mounter: &dyn Mounter,
) -> Result<MountPointState, MountError> {
    if mounter.is_mount_point(target)? {
        if directory_responsive(target, DEFAULT_PROBE_TIMEOUT) {
            debug!(target = %target.display(), "mount point already active");
            return Ok(MountPointState::Mounted);
        }
        warn!(
            target = %target.display(),
            "stale mount detected, force unmounting"
        );
        mounter.unmount(target, true)?;
    }

    match std::fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(MountError::UnusableMountPoint {
                target: target.to_path_buf(),
                reason: "path exists but is not a directory".to_string(),
            });
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            create_private_dir(target)?;
        }
        Err(err) => return Err(MountError::Io(err)),
    }

    Ok(MountPointState::Unmounted)
}

/// Create `path` (and parents) readable by the owning user only.
#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}
