//! System mount table access.
//!
//! Answering "is this path mounted" by touching the path itself is a trap:
//! a dead remote turns the question into an indefinite hang. The mount
//! table answers it from kernel bookkeeping instead.
//!
//! # Platform Differences
//!
//! - **Linux**: parse `/proc/self/mounts` (octal-escaped paths)
//! - **macOS**: parse `mount` command output, guarded by a deadline because
//!   ghost mounts can wedge the command itself

use std::io;
use std::path::{Path, PathBuf};

/// One row of the system mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Where the filesystem is attached.
    pub mount_point: PathBuf,
    /// Filesystem type as reported by the kernel (e.g. `nfs4`).
    pub fstype: String,
    /// Device or remote source (e.g. `fileserver:/exports/backup`).
    pub source: String,
}

/// Snapshot the currently mounted filesystems.
pub fn current_mounts() -> io::Result<Vec<MountEntry>> {
    #[cfg(target_os = "linux")]
    {
        mounts_from_proc()
    }

    #[cfg(target_os = "macos")]
    {
        mounts_from_command()
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "mount table access is not implemented on this platform",
        ))
    }
}

/// Look up the mount table entry whose mount point is exactly `path`.
pub fn find_mount(path: &Path) -> io::Result<Option<MountEntry>> {
    let mounts = current_mounts()?;
    Ok(mounts.into_iter().find(|entry| entry.mount_point == path))
}

#[cfg(target_os = "linux")]
fn mounts_from_proc() -> io::Result<Vec<MountEntry>> {
    let table = std::fs::read_to_string("/proc/self/mounts")?;
    Ok(table.lines().filter_map(parse_proc_line).collect())
}

/// Parse one `/proc/self/mounts` row.
///
/// Format: `{source} {mount_point} {fstype} {options} {dump} {pass}`,
/// fields separated by spaces, with spaces inside fields octal-escaped.
#[cfg(any(target_os = "linux", test))]
fn parse_proc_line(line: &str) -> Option<MountEntry> {
    let mut fields = line.split_ascii_whitespace();
    let source = fields.next()?;
    let mount_point = fields.next()?;
    let fstype = fields.next()?;

    Some(MountEntry {
        mount_point: PathBuf::from(unescape_mount_path(mount_point)),
        fstype: fstype.to_string(),
        source: unescape_mount_path(source),
    })
}

/// Decode the octal escapes `/proc` uses for whitespace in paths.
///
/// `\040` is a space, `\011` a tab, `\012` a newline, `\134` a backslash.
/// Anything that is not a backslash followed by three octal digits passes
/// through untouched.
#[cfg(any(target_os = "linux", test))]
fn unescape_mount_path(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\'
            && i + 3 < bytes.len()
            && bytes[i + 1..=i + 3].iter().all(|b| (b'0'..=b'7').contains(b))
        {
            let digit = |b: u8| b - b'0';
            out.push(digit(bytes[i + 1]) * 64 + digit(bytes[i + 2]) * 8 + digit(bytes[i + 3]));
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Deadline for the `mount` command. It answers instantly on a healthy
/// system; anything slower means a ghost mount is blocking it.
#[cfg(target_os = "macos")]
const MOUNT_COMMAND_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);

#[cfg(target_os = "macos")]
fn mounts_from_command() -> io::Result<Vec<MountEntry>> {
    use crate::exec::{CommandOutcome, run_with_deadline};
    use std::time::Duration;

    let mut command = std::process::Command::new("mount");
    match run_with_deadline(&mut command, Duration::from_millis(50), MOUNT_COMMAND_TIMEOUT)? {
        CommandOutcome::Completed(done) if done.status.success() => {
            Ok(done.stdout.lines().filter_map(parse_mount_output_line).collect())
        }
        CommandOutcome::Completed(done) => Err(io::Error::other(format!(
            "mount command failed: {}",
            done.detail()
        ))),
        CommandOutcome::TimedOut => {
            // A wedged mount command means a ghost mount somewhere; report
            // what we can instead of propagating the hang.
            tracing::warn!(
                timeout = ?MOUNT_COMMAND_TIMEOUT,
                "mount command timed out, treating mount table as empty"
            );
            Ok(Vec::new())
        }
    }
}

/// Parse one line of `mount` output.
///
/// Format: `{source} on {mount_point} ({fstype}, {options...})`.
#[cfg(any(target_os = "macos", test))]
fn parse_mount_output_line(line: &str) -> Option<MountEntry> {
    let (source, rest) = line.split_once(" on ")?;
    let (mount_point, attrs) = rest.rsplit_once(" (")?;
    let fstype = attrs.strip_suffix(')')?.split(',').next()?.trim();

    Some(MountEntry {
        mount_point: PathBuf::from(mount_point),
        fstype: fstype.to_string(),
        source: source.to_string(),
    })
}
