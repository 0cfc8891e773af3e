//! [`Mounter`] backed by the platform mount commands.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use tracing::debug;

use crate::exec::{CommandOutcome, run_with_deadline};
use crate::mount_table;
use crate::mounter::{MountError, Mounter};
use crate::options::MountTimeouts;

const MOUNT_PROGRAM: &str = "mount";
const UMOUNT_PROGRAM: &str = "umount";

/// Deadline for unmount commands. Unmounts either work promptly or are
/// blocked by a ghost mount; waiting longer does not help.
const UNMOUNT_TIMEOUT: Duration = Duration::from_secs(3);
const UNMOUNT_POLL: Duration = Duration::from_millis(50);

/// Mounts filesystems by shelling out to `mount`/`umount`.
///
/// Stateless; having several values around is fine. Mount attempts are
/// polled and killed per [`MountTimeouts`], and mount point checks go
/// through the mount table rather than the path itself, so a dead remote
/// never hangs the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMounter;

impl Mounter for SystemMounter {
    fn mount(
        &self,
        source: &str,
        target: &Path,
        fstype: &str,
        options: &[String],
        sensitive: &[String],
        timeouts: MountTimeouts,
    ) -> Result<(), MountError> {
        let mut command = Command::new(MOUNT_PROGRAM);
        command.arg("-t").arg(fstype);

        let mut combined = options.to_vec();
        combined.extend_from_slice(sensitive);
        if !combined.is_empty() {
            command.arg("-o").arg(combined.join(","));
        }
        command.arg(source).arg(target);

        // Sensitive options stay out of the log line.
        debug!(
            source,
            target = %target.display(),
            fstype,
            options = %options.join(","),
            "running mount"
        );

        match run_with_deadline(&mut command, timeouts.interval, timeouts.timeout)? {
            CommandOutcome::Completed(done) if done.status.success() => Ok(()),
            CommandOutcome::Completed(done) => Err(MountError::CommandFailed {
                program: MOUNT_PROGRAM,
                status: done.status.to_string(),
                detail: done.detail().to_string(),
            }),
            CommandOutcome::TimedOut => Err(MountError::TimedOut {
                program: MOUNT_PROGRAM,
                timeout: timeouts.timeout,
            }),
        }
    }

    fn is_mount_point(&self, target: &Path) -> Result<bool, MountError> {
        Ok(mount_table::find_mount(target)?.is_some())
    }

    fn unmount(&self, target: &Path, force: bool) -> Result<(), MountError> {
        let mut command = Command::new(UMOUNT_PROGRAM);
        if force {
            command.arg("-f");
        }
        command.arg(target);

        debug!(target = %target.display(), force, "running umount");

        match run_with_deadline(&mut command, UNMOUNT_POLL, UNMOUNT_TIMEOUT)? {
            CommandOutcome::Completed(done) if done.status.success() => Ok(()),
            CommandOutcome::Completed(done) => Err(MountError::CommandFailed {
                program: UMOUNT_PROGRAM,
                status: done.status.to_string(),
                detail: done.detail().to_string(),
            }),
            CommandOutcome::TimedOut => Err(MountError::TimedOut {
                program: UMOUNT_PROGRAM,
                timeout: UNMOUNT_TIMEOUT,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unmount_of_plain_directory_fails() {
        let temp = TempDir::new().unwrap();
        let err = SystemMounter.unmount(temp.path(), false).unwrap_err();
        // Not a mount point: umount exits non-zero (or the binary is
        // missing entirely in minimal environments).
        assert!(matches!(
            err,
            MountError::CommandFailed { .. } | MountError::Io(_)
        ));
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    #[test]
    fn test_plain_directory_is_not_a_mount_point() {
        let temp = TempDir::new().unwrap();
        assert!(!SystemMounter.is_mount_point(temp.path()).unwrap());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_root_is_a_mount_point() {
        assert!(SystemMounter.is_mount_point(Path::new("/")).unwrap());
    }
}
