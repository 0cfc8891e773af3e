//! Core abstractions for stowage backup store drivers.
//!
//! A *backup store* is a remote location that holds backup data and is made
//! reachable through the local filesystem by a driver. This crate defines the
//! pieces every driver shares:
//!
//! # Components
//!
//! - [`BackupStoreDriver`] - Trait implemented by each store driver (NFS, ...)
//! - [`DriverRegistry`] - Maps destination URL schemes to driver constructors
//! - [`FileSystemOperator`] - Narrow filesystem interface drivers delegate to
//! - [`LocalFileSystemOperator`] - Operator backed by a local directory
//!
//! Drivers live in their own crates and register themselves into a
//! [`DriverRegistry`] owned by the caller. Opening a destination URL picks
//! the driver by scheme and hands back a ready-to-use [`BackupStoreDriver`].
//!
//! # Example
//!
//! ```no_run
//! use stowage_core::DriverRegistry;
//!
//! let registry = DriverRegistry::new();
//! // driver crates add their constructors via `registry.register(...)`
//! let driver = registry.open("nfs://fileserver:/exports/backup")?;
//! println!("backing directory: {}", driver.local_path("").display());
//! # Ok::<(), stowage_core::RegistryError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod driver;
mod fsops;
mod registry;

pub use driver::BackupStoreDriver;
pub use fsops::{FileSystemOperator, LocalFileSystemOperator, join_under};
pub use registry::{BoxedDriverError, DriverConstructor, DriverRegistry, RegistryError};
