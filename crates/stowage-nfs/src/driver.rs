//! The NFS backup store driver.
//!
//! Construction does all the work: parse the destination, derive the local
//! mount point, negotiate a working mount and verify the share root
//! answers a listing. The value that comes back is a passive handle; every
//! later call is a pure accessor or a plain filesystem operation under the
//! mount directory.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use stowage_core::{
    BackupStoreDriver, DriverRegistry, FileSystemOperator, LocalFileSystemOperator,
    RegistryError, join_under,
};
use stowage_mount::{MountTimeouts, Mounter, SystemMounter};

use crate::descriptor::{Descriptor, DescriptorError, KIND};
use crate::negotiate::{NegotiationError, NegotiationOutcome, ensure_mounted};

/// Configuration for [`NfsDriver`] construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfsDriverOptions {
    /// Directory shares get mounted under. Every destination derives its
    /// own subdirectory from server and export path.
    pub mount_root: PathBuf,
    /// Timing bounds applied to each mount attempt.
    pub timeouts: MountTimeouts,
}

impl Default for NfsDriverOptions {
    fn default() -> Self {
        Self {
            mount_root: PathBuf::from("/var/lib/stowage/mounts"),
            timeouts: MountTimeouts::default(),
        }
    }
}

/// Ways driver construction can fail. Construction either hands back a
/// verified, usable store or one of these; there is no half-initialized
/// driver.
#[derive(Debug, Error)]
pub enum InitError {
    /// The destination URL does not describe an NFS share.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// No mount could be negotiated.
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    /// The share mounted but its root does not behave like a directory.
    #[error("NFS path {server_path} doesn't exist or is not a directory")]
    InvalidRoot {
        /// The share whose root failed verification.
        server_path: String,
        /// The listing error.
        source: io::Error,
    },
}

/// Backup store driver for `nfs://` destinations.
pub struct NfsDriver {
    dest_url: String,
    server_path: String,
    mount_dir: PathBuf,
    mount_options: Vec<String>,
    fsops: Box<dyn FileSystemOperator>,
}

impl NfsDriver {
    /// Mount and verify the share at `dest_url` with the system mount
    /// tooling.
    ///
    /// # Errors
    ///
    /// Any [`InitError`]; nothing is retried or papered over.
    pub fn initialize(dest_url: &str, options: &NfsDriverOptions) -> Result<Self, InitError> {
        Self::initialize_with(dest_url, options, &SystemMounter)
    }

    /// Like [`NfsDriver::initialize`] with a caller-provided [`Mounter`].
    ///
    /// # Errors
    ///
    /// Same as [`NfsDriver::initialize`].
    pub fn initialize_with(
        dest_url: &str,
        options: &NfsDriverOptions,
        mounter: &dyn Mounter,
    ) -> Result<Self, InitError> {
        let descriptor = Descriptor::parse(dest_url)?;
        let spec = descriptor.mount_spec(&options.mount_root);

        let mount_options = match ensure_mounted(&descriptor, &spec, mounter, options.timeouts)?
        {
            NegotiationOutcome::AlreadyMounted => descriptor.options().to_vec(),
            NegotiationOutcome::Mounted { options } => options,
        };

        let driver = Self {
            dest_url: descriptor.dest_url(),
            server_path: descriptor.server_path(),
            mount_options,
            fsops: Box::new(LocalFileSystemOperator::new(&spec.mount_dir)),
            mount_dir: spec.mount_dir,
        };

        // The mount is only believed once the share root answers a listing.
        driver.list("").map_err(|source| InitError::InvalidRoot {
            server_path: driver.server_path.clone(),
            source,
        })?;

        info!(
            url = %driver.dest_url,
            dir = %driver.mount_dir.display(),
            "loaded nfs backup store driver"
        );
        Ok(driver)
    }

    /// Local directory the share is mounted at.
    pub fn mount_dir(&self) -> &Path {
        &self.mount_dir
    }

    /// Mount options in effect: what negotiation settled on, or the
    /// descriptor's own options when the share was already mounted.
    pub fn mount_options(&self) -> &[String] {
        &self.mount_options
    }

    /// List entry names under `path`, relative to the share root.
    ///
    /// # Errors
    ///
    /// Propagates the underlying directory listing error.
    pub fn list(&self, path: &str) -> io::Result<Vec<String>> {
        self.fsops.list(path)
    }
}

impl fmt::Debug for NfsDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NfsDriver")
            .field("dest_url", &self.dest_url)
            .field("server_path", &self.server_path)
            .field("mount_dir", &self.mount_dir)
            .field("mount_options", &self.mount_options)
            .finish_non_exhaustive()
    }
}

impl BackupStoreDriver for NfsDriver {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn url(&self) -> &str {
        &self.dest_url
    }

    fn local_path(&self, path: &str) -> PathBuf {
        join_under(&self.mount_dir, path)
    }
}

/// Register the NFS driver into `registry` under its `nfs` scheme.
///
/// # Errors
///
/// [`RegistryError::DuplicateKind`] when an `nfs` driver is already
/// registered.
pub fn register_nfs_driver(
    registry: &mut DriverRegistry,
    options: NfsDriverOptions,
) -> Result<(), RegistryError> {
    registry.register(KIND, move |dest_url| {
        NfsDriver::initialize(dest_url, &options)
            .map(|driver| Box::new(driver) as Box<dyn BackupStoreDriver>)
            .map_err(Into::into)
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use stowage_mount::testing::ScriptedMounter;

    use super::*;

    fn options_for(root: &TempDir) -> NfsDriverOptions {
        NfsDriverOptions {
            mount_root: root.path().to_path_buf(),
            timeouts: MountTimeouts::default(),
        }
    }

    #[test]
    fn test_initialize_mounts_and_verifies() {
        let root = TempDir::new().unwrap();
        let mounter = ScriptedMounter::always_succeeding();

        let driver = NfsDriver::initialize_with(
            "nfs://fileserver:/exports/backup",
            &options_for(&root),
            &mounter,
        )
        .unwrap();

        assert_eq!(driver.kind(), "nfs");
        assert_eq!(driver.url(), "nfs://fileserver:/exports/backup");
        assert_eq!(driver.mount_options()[0], "nfsvers=4.2");
        assert_eq!(
            driver.mount_dir(),
            root.path().join("fileserver").join("exports/backup")
        );
        assert_eq!(mounter.attempts().len(), 1);
    }

    #[test]
    fn test_initialize_rejects_bad_descriptor_without_mounting() {
        let root = TempDir::new().unwrap();
        let mounter = ScriptedMounter::always_succeeding();

        let err = NfsDriver::initialize_with(
            "cifs://fileserver/share",
            &options_for(&root),
            &mounter,
        )
        .unwrap_err();

        assert!(matches!(err, InitError::Descriptor(_)));
        assert!(mounter.attempts().is_empty());
    }

    #[test]
    fn test_already_mounted_keeps_descriptor_options() {
        let root = TempDir::new().unwrap();
        let options = options_for(&root);
        let desc = Descriptor::parse("nfs://fileserver:/exports?nfsOptions=ro,soft").unwrap();
        let spec = desc.mount_spec(&options.mount_root);
        fs::create_dir_all(&spec.mount_dir).unwrap();
        let mounter = ScriptedMounter::always_succeeding().pre_mounted(&spec.mount_dir);

        let driver = NfsDriver::initialize_with(
            "nfs://fileserver:/exports?nfsOptions=ro,soft",
            &options,
            &mounter,
        )
        .unwrap();

        assert!(mounter.attempts().is_empty());
        assert_eq!(driver.mount_options(), ["ro", "soft"]);
    }

    #[test]
    fn test_local_path_joins_under_mount_dir() {
        let root = TempDir::new().unwrap();
        let mounter = ScriptedMounter::always_succeeding();
        let driver = NfsDriver::initialize_with(
            "nfs://fileserver:/exports/backup",
            &options_for(&root),
            &mounter,
        )
        .unwrap();

        let base = root.path().join("fileserver").join("exports/backup");
        assert_eq!(driver.local_path(""), base);
        assert_eq!(driver.local_path("weekly/full.img"), base.join("weekly/full.img"));
        // Leading slashes do not escape the mount directory.
        assert_eq!(driver.local_path("/weekly"), base.join("weekly"));
    }

    #[test]
    fn test_list_sees_share_contents() {
        let root = TempDir::new().unwrap();
        let mounter = ScriptedMounter::always_succeeding();
        let driver = NfsDriver::initialize_with(
            "nfs://fileserver:/exports/backup",
            &options_for(&root),
            &mounter,
        )
        .unwrap();

        fs::write(driver.local_path("manifest.json"), b"{}").unwrap();
        fs::create_dir(driver.local_path("weekly")).unwrap();

        assert_eq!(driver.list("").unwrap(), ["manifest.json", "weekly"]);
    }

    #[test]
    fn test_debug_names_the_store_and_hides_the_operator() {
        let root = TempDir::new().unwrap();
        let mounter = ScriptedMounter::always_succeeding();
        let driver = NfsDriver::initialize_with(
            "nfs://fileserver:/exports/backup",
            &options_for(&root),
            &mounter,
        )
        .unwrap();

        let rendered = format!("{driver:?}");
        assert!(rendered.contains("NfsDriver"), "got: {rendered}");
        assert!(
            rendered.contains("nfs://fileserver:/exports/backup"),
            "got: {rendered}"
        );
        assert!(rendered.contains("nfsvers=4.2"), "got: {rendered}");
        assert!(!rendered.contains("fsops"), "got: {rendered}");
    }

    #[test]
    fn test_registry_round_trip() {
        let root = TempDir::new().unwrap();
        let mut registry = DriverRegistry::new();
        register_nfs_driver(&mut registry, options_for(&root)).unwrap();

        // The scripted path is unavailable here, so drive the registry with
        // a descriptor error instead: the failure must come back through
        // the registry chained, not swallowed.
        let err = registry.open("nfs://fileserver").unwrap_err();
        match err {
            RegistryError::Driver { url, source } => {
                assert_eq!(url, "nfs://fileserver");
                assert!(source.to_string().contains("no export path"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            registry.open("s3://bucket/prefix").unwrap_err(),
            RegistryError::UnknownKind { .. }
        ));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let root = TempDir::new().unwrap();
        let mut registry = DriverRegistry::new();
        register_nfs_driver(&mut registry, options_for(&root)).unwrap();
        let err = register_nfs_driver(&mut registry, options_for(&root)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateKind(_)));
    }
}
