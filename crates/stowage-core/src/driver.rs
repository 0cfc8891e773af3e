//! Backup store driver trait.

use std::fmt;
use std::path::PathBuf;

/// A backup store that has been made reachable through the local filesystem.
///
/// Implementations perform whatever setup their transport needs (mounting a
/// remote share, attaching a device, ...) during construction. Once built,
/// a driver is a passive handle: it answers where the store lives and how
/// paths inside it map onto the local tree.
///
/// # Lifecycle
///
/// Construction is expected to fail loudly. A driver that exists is usable;
/// there is no half-initialized state to probe for.
///
/// Drivers are [`fmt::Debug`]: a boxed driver renders in diagnostics and
/// test failures like any other value.
pub trait BackupStoreDriver: Send + fmt::Debug {
    /// Driver kind identifier.
    ///
    /// Matches the scheme of the destination URLs this driver accepts.
    /// Examples: `"nfs"`.
    fn kind(&self) -> &'static str;

    /// Canonical destination URL for this store.
    ///
    /// This is the normalized form of the URL the driver was opened with;
    /// configuration-only query parameters are not part of it.
    fn url(&self) -> &str;

    /// Map a store-relative path onto the local filesystem.
    ///
    /// `path` is interpreted relative to the store root even when it starts
    /// with a slash. Passing `""` yields the store root itself.
    fn local_path(&self, path: &str) -> PathBuf;
}
