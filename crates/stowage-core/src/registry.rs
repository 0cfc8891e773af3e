//! Driver registry keyed by destination URL scheme.
//!
//! The registry is a plain value the application owns and populates at
//! startup. There is no global table and no import-time side effect: what a
//! registry can open is exactly what was registered into it, which keeps
//! driver availability visible at the call site and independent registries
//! possible in tests.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::driver::BackupStoreDriver;

/// Error type driver constructors are allowed to fail with.
///
/// Drivers keep their own typed errors; the registry only needs something
/// it can report and chain.
pub type BoxedDriverError = Box<dyn std::error::Error + Send + Sync>;

/// Constructor registered for one driver kind.
///
/// Receives the full destination URL and returns a ready-to-use driver.
pub type DriverConstructor =
    Box<dyn Fn(&str) -> Result<Box<dyn BackupStoreDriver>, BoxedDriverError> + Send + Sync>;

/// Errors from registering and opening backup store drivers.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The destination URL was empty.
    #[error("destination URL has not been set")]
    EmptyUrl,

    /// The destination URL could not be parsed at all.
    #[error("invalid destination URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No driver is registered for the URL's scheme.
    #[error("no driver registered for kind {kind:?} (registered: {registered})")]
    UnknownKind {
        /// Scheme of the rejected URL.
        kind: String,
        /// Comma-separated list of registered kinds, or `none`.
        registered: String,
    },

    /// A driver for this kind is already registered.
    #[error("driver kind {0:?} is already registered")]
    DuplicateKind(String),

    /// The driver constructor itself failed.
    #[error("cannot open backup store at {url}")]
    Driver {
        /// The destination URL that was being opened.
        url: String,
        /// The driver's own error.
        #[source]
        source: BoxedDriverError,
    },
}

/// Maps destination URL schemes to driver constructors.
#[derive(Default)]
pub struct DriverRegistry {
    constructors: BTreeMap<String, DriverConstructor>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `kind`.
    ///
    /// `kind` doubles as the URL scheme the constructor is dispatched on.
    /// Registering the same kind twice is an error rather than a silent
    /// replacement.
    pub fn register<F>(&mut self, kind: &str, constructor: F) -> Result<(), RegistryError>
    where
        F: Fn(&str) -> Result<Box<dyn BackupStoreDriver>, BoxedDriverError>
            + Send
            + Sync
            + 'static,
    {
        if self.constructors.contains_key(kind) {
            return Err(RegistryError::DuplicateKind(kind.to_string()));
        }
        self.constructors
            .insert(kind.to_string(), Box::new(constructor));
        Ok(())
    }

    /// Registered driver kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Open a backup store at `dest_url` with the driver matching its scheme.
    pub fn open(&self, dest_url: &str) -> Result<Box<dyn BackupStoreDriver>, RegistryError> {
        if dest_url.is_empty() {
            return Err(RegistryError::EmptyUrl);
        }
        let parsed = Url::parse(dest_url)?;
        let kind = parsed.scheme();
        let constructor =
            self.constructors
                .get(kind)
                .ok_or_else(|| RegistryError::UnknownKind {
                    kind: kind.to_string(),
                    registered: self.registered_summary(),
                })?;

        debug!(kind, url = dest_url, "opening backup store");
        constructor(dest_url).map_err(|source| RegistryError::Driver {
            url: dest_url.to_string(),
            source,
        })
    }

    fn registered_summary(&self) -> String {
        if self.constructors.is_empty() {
            "none".to_string()
        } else {
            self.kinds().join(", ")
        }
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
