//! NFS backup store driver.
//!
//! Turns an `nfs://<server>[:]/<export>[?nfsOptions=...]` destination into
//! a mounted, verified backup store. Parsing, mount point derivation,
//! version negotiation and root verification all happen during driver
//! construction; afterwards the driver is a passive view over the mounted
//! share.
//!
//! # Components
//!
//! - [`descriptor`]: destination URL parsing and mount point derivation
//! - [`negotiate`]: the NFSv4 minor-version ladder and pinned-option mounts
//! - [`driver`]: the [`NfsDriver`] lifecycle and registry hookup
//!
//! ```no_run
//! use stowage_nfs::{NfsDriver, NfsDriverOptions};
//!
//! # fn main() -> Result<(), stowage_nfs::InitError> {
//! let driver = NfsDriver::initialize(
//!     "nfs://fileserver:/exports/backup",
//!     &NfsDriverOptions::default(),
//! )?;
//! println!("mounted at {}", driver.mount_dir().display());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod descriptor;
pub mod driver;
pub mod negotiate;

pub use descriptor::{Descriptor, DescriptorError, KIND, MountSpec};
pub use driver::{InitError, NfsDriver, NfsDriverOptions, register_nfs_driver};
pub use negotiate::{
    AggregatedMountError, FSTYPE, MINOR_VERSIONS, MountAttemptError, MountCandidate,
    NegotiationError, NegotiationOutcome, candidates, ensure_mounted,
};
