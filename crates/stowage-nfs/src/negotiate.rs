//! Mount negotiation.
//!
//! A destination either pins its mount options outright or leaves them to
//! a fixed NFSv4 minor-version ladder, newest first. Either way each
//! candidate gets exactly one bounded attempt, the first success wins, and
//! a total failure reports every attempt rather than just the last.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use stowage_mount::{MountError, MountPointState, MountTimeouts, Mounter, ensure_mount_point};

use crate::descriptor::{Descriptor, MountSpec};

/// NFSv4 minor versions tried when options are not pinned, newest first.
pub const MINOR_VERSIONS: [&str; 3] = ["4.2", "4.1", "4.0"];

/// Filesystem type requested from the mount tooling.
pub const FSTYPE: &str = "nfs4";

/// One option set to try: a label for error reporting plus the options
/// handed to the mounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountCandidate {
    /// Identifies the attempt in logs and errors.
    pub label: String,
    /// Options for this attempt.
    pub options: Vec<String>,
}

/// The candidates negotiation will try for `descriptor`, in order.
///
/// Pinned options produce exactly one candidate carrying them verbatim;
/// otherwise there is one candidate per entry of [`MINOR_VERSIONS`].
pub fn candidates(descriptor: &Descriptor) -> Vec<MountCandidate> {
    match descriptor.pinned_options() {
        Some(pinned) => vec![MountCandidate {
            label: format!("nfsOptions={pinned:?}"),
            options: pinned.to_vec(),
        }],
        None => MINOR_VERSIONS
            .iter()
            .map(|version| MountCandidate {
                label: format!("vers={version}"),
                options: version_options(version),
            })
            .collect(),
    }
}

/// Soft-mount option set for one NFSv4 minor version.
fn version_options(version: &str) -> Vec<String> {
    vec![
        format!("nfsvers={version}"),
        "actimeo=1".to_string(),
        "soft".to_string(),
        "timeo=30".to_string(),
        "retry=2".to_string(),
    ]
}

/// How [`ensure_mounted`] satisfied the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// The mount directory was already an active mount point; nothing was
    /// attempted.
    AlreadyMounted,
    /// One of the candidates mounted the share.
    Mounted {
        /// The option set that worked.
        options: Vec<String>,
    },
}

/// A single mount attempt that failed.
#[derive(Debug, Error)]
#[error("cannot mount {share} with {label}")]
pub struct MountAttemptError {
    /// The mount source that was being mounted.
    pub share: String,
    /// Which candidate failed.
    pub label: String,
    /// The mounter's error.
    pub source: MountError,
}

/// Every candidate on the version ladder failed.
///
/// Attempts are kept in the order they were made, so the newest protocol
/// version's failure reads first.
#[derive(Debug, Error)]
#[error("cannot mount {share}: {}", summarize(.attempts))]
pub struct AggregatedMountError {
    /// The mount source that was being mounted.
    pub share: String,
    /// One entry per failed candidate, in attempt order.
    pub attempts: Vec<MountAttemptError>,
}

fn summarize(attempts: &[MountAttemptError]) -> String {
    attempts
        .iter()
        .map(|attempt| format!("{}: {}", attempt.label, attempt.source))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Ways negotiation can fail.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// The mount directory could not be brought to a usable state.
    #[error("cannot prepare mount point {}", .dir.display())]
    MountPoint {
        /// The directory that was being prepared.
        dir: PathBuf,
        /// What went wrong.
        source: MountError,
    },

    /// The single pinned-options attempt failed.
    #[error(transparent)]
    Attempt(#[from] MountAttemptError),

    /// Every version-ladder attempt failed.
    #[error(transparent)]
    Aggregated(#[from] AggregatedMountError),
}

/// Mount the share described by `descriptor` at `spec.mount_dir`, unless
/// it already is.
///
/// The mount directory is prepared first: created privately when missing,
/// recovered when a stale mount sits on it. A directory that is already an
/// active mount point short-circuits the whole negotiation with zero
/// attempts. Otherwise every candidate from [`candidates`] gets one
/// attempt bounded by `timeouts`, and the first success ends the ladder.
///
/// # Errors
///
/// [`NegotiationError::MountPoint`] when the directory cannot be prepared,
/// [`NegotiationError::Attempt`] when a pinned attempt fails, and
/// [`NegotiationError::Aggregated`] when the whole ladder does.
pub fn ensure_mounted(
    descriptor: &Descriptor,
    spec: &MountSpec,
    mounter: &dyn Mounter,
    timeouts: MountTimeouts,
) -> Result<NegotiationOutcome, NegotiationError> {
    let state = ensure_mount_point(&spec.mount_dir, mounter).map_err(|source| {
        NegotiationError::MountPoint {
            dir: spec.mount_dir.clone(),
            source,
        }
    })?;
    if state == MountPointState::Mounted {
        info!(
            share = %spec.source,
            dir = %spec.mount_dir.display(),
            "share already mounted"
        );
        return Ok(NegotiationOutcome::AlreadyMounted);
    }

    let mut failures = Vec::new();
    for candidate in candidates(descriptor) {
        info!(
            share = %spec.source,
            dir = %spec.mount_dir.display(),
            options = %candidate.options.join(","),
            "mounting nfs share"
        );
        match mounter.mount(
            &spec.source,
            &spec.mount_dir,
            FSTYPE,
            &candidate.options,
            &[],
            timeouts,
        ) {
            Ok(()) => {
                info!(
                    share = %spec.source,
                    dir = %spec.mount_dir.display(),
                    "mounted nfs share"
                );
                return Ok(NegotiationOutcome::Mounted {
                    options: candidate.options,
                });
            }
            Err(source) => {
                warn!(
                    share = %spec.source,
                    candidate = %candidate.label,
                    error = %source,
                    "mount attempt failed"
                );
                failures.push(MountAttemptError {
                    share: spec.source.clone(),
                    label: candidate.label,
                    source,
                });
            }
        }
    }

    // A pinned descriptor has exactly one candidate, reported on its own.
    if descriptor.pinned_options().is_some()
        && let Some(failure) = failures.pop()
    {
        return Err(failure.into());
    }
    Err(AggregatedMountError {
        share: spec.source.clone(),
        attempts: failures,
    }
    .into())
}
