//! Mount plumbing shared by stowage backup store drivers.
//!
//! Drivers that attach remote filesystems all need the same machinery:
//! running the platform mount tooling without hanging on dead remotes,
//! answering whether a path is currently a mount point, and preparing a
//! mount directory that may be left over from an earlier run in an unknown
//! state. This crate provides that machinery behind the [`Mounter`] trait.
//!
//! # Components
//!
//! - [`Mounter`] - Trait for mount, mount-point check and unmount
//! - [`SystemMounter`] - [`Mounter`] backed by the platform mount commands
//! - [`ensure_mount_point`] - Prepares a directory to receive a mount,
//!   recovering stale mounts left by crashed processes
//! - [`MountTimeouts`] - Poll interval and deadline bounding one attempt
//! - [`current_mounts`] - Snapshot of the system mount table
//! - [`directory_responsive`] - Timeout-guarded directory probe
//!
//! Everything here is synchronous; mount attempts are bounded by
//! [`MountTimeouts`] rather than by cancellation.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod exec;
mod mount_table;
mod mounter;
mod options;
mod probe;
mod system;

pub use mount_table::{MountEntry, current_mounts, find_mount};
pub use mounter::{MountError, MountPointState, Mounter, ensure_mount_point};
pub use options::{MountTimeouts, split_mount_options};
pub use probe::{DEFAULT_PROBE_TIMEOUT, directory_responsive};
pub use system::SystemMounter;

/// Test doubles for code that drives a [`Mounter`].
///
/// Lives in the library proper (not behind `cfg(test)`) so driver crates
/// can exercise their negotiation logic against a scripted mounter.
pub mod testing;
