//! Scripted [`Mounter`] for exercising negotiation logic.

use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::mounter::{MountError, Mounter};
use crate::options::MountTimeouts;

/// One mount call as seen by a [`ScriptedMounter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAttempt {
    /// Remote source passed to the mounter.
    pub source: String,
    /// Target directory.
    pub target: PathBuf,
    /// Filesystem type.
    pub fstype: String,
    /// Loggable options.
    pub options: Vec<String>,
    /// Sensitive options (kept separate so tests can assert they never
    /// leak into `options`).
    pub sensitive: Vec<String>,
    /// Timing bounds the caller requested.
    pub timeouts: MountTimeouts,
}

/// [`Mounter`] whose mount outcomes follow a prewritten script.
///
/// Each `mount` call consumes the next scripted outcome; once the script
/// runs dry every further call succeeds. Successful mounts are remembered,
/// so a later `is_mount_point` on the same target answers `true`, and
/// `unmount` forgets it again. Every call is recorded for assertions.
///
/// # Example
///
/// ```
/// use stowage_mount::testing::ScriptedMounter;
/// use stowage_mount::{MountError, Mounter, MountTimeouts};
/// use std::io;
/// use std::path::Path;
///
/// let mounter = ScriptedMounter::new([
///     Err(MountError::Io(io::Error::other("server rejected v4.2"))),
///     Ok(()),
/// ]);
///
/// let target = Path::new("/tmp/scripted-mounter-doc");
/// let opts = vec!["soft".to_string()];
/// assert!(mounter
///     .mount("host:/share", target, "nfs4", &opts, &[], MountTimeouts::default())
///     .is_err());
/// assert!(mounter
///     .mount("host:/share", target, "nfs4", &opts, &[], MountTimeouts::default())
///     .is_ok());
/// assert_eq!(mounter.attempts().len(), 2);
/// assert!(mounter.is_mount_point(target).unwrap());
/// ```
#[derive(Debug, Default)]
pub struct ScriptedMounter {
    script: Mutex<VecDeque<Result<(), MountError>>>,
    mounted: Mutex<BTreeSet<PathBuf>>,
    attempts: Mutex<Vec<RecordedAttempt>>,
    unmounts: Mutex<Vec<(PathBuf, bool)>>,
}

impl ScriptedMounter {
    /// Mounter following `script`, one outcome per mount call.
    pub fn new(script: impl IntoIterator<Item = Result<(), MountError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Mounter whose every mount call succeeds.
    pub fn always_succeeding() -> Self {
        Self::default()
    }

    /// Mounter whose first `n` mount calls fail, each with a distinct
    /// message, and whose later calls succeed.
    pub fn failing_first(n: usize) -> Self {
        Self::new((0..n).map(|i| {
            Err(MountError::Io(std::io::Error::other(format!(
                "scripted failure #{i}"
            ))))
        }))
    }

    /// Mark `path` as already mounted before any calls happen.
    #[must_use]
    pub fn pre_mounted(self, path: impl Into<PathBuf>) -> Self {
        lock(&self.mounted).insert(path.into());
        self
    }

    /// All mount calls made so far, in order.
    pub fn attempts(&self) -> Vec<RecordedAttempt> {
        lock(&self.attempts).clone()
    }

    /// All unmount calls made so far, in order, with their `force` flag.
    pub fn unmounts(&self) -> Vec<(PathBuf, bool)> {
        lock(&self.unmounts).clone()
    }

    /// Paths currently considered mounted.
    pub fn mounted_paths(&self) -> Vec<PathBuf> {
        lock(&self.mounted).iter().cloned().collect()
    }
}

impl Mounter for ScriptedMounter {
    fn mount(
        &self,
        source: &str,
        target: &Path,
        fstype: &str,
        options: &[String],
        sensitive: &[String],
        timeouts: MountTimeouts,
    ) -> Result<(), MountError> {
        lock(&self.attempts).push(RecordedAttempt {
            source: source.to_string(),
            target: target.to_path_buf(),
            fstype: fstype.to_string(),
            options: options.to_vec(),
            sensitive: sensitive.to_vec(),
            timeouts,
        });

        let outcome = lock(&self.script).pop_front().unwrap_or(Ok(()));
        if outcome.is_ok() {
            lock(&self.mounted).insert(target.to_path_buf());
        }
        outcome
    }

    fn is_mount_point(&self, target: &Path) -> Result<bool, MountError> {
        Ok(lock(&self.mounted).contains(target))
    }

    fn unmount(&self, target: &Path, force: bool) -> Result<(), MountError> {
        lock(&self.unmounts).push((target.to_path_buf(), force));
        lock(&self.mounted).remove(target);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
