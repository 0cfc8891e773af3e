//! Destination descriptors and mount point derivation.
//!
//! An NFS backup store destination is written as
//! `nfs://<server>[:]/<export>[?nfsOptions=<opt>,<opt>,...]`. Parsing
//! splits that into the server host, the export path, and any pinned
//! mount options; derivation then maps the pair onto a deterministic
//! local mount directory.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

use stowage_core::join_under;
use stowage_mount::split_mount_options;

/// Driver kind, doubling as the destination URL scheme.
pub const KIND: &str = "nfs";

/// Query parameter carrying caller-pinned mount options.
const OPTIONS_PARAM: &str = "nfsOptions";

/// Ways a destination URL can fail to describe an NFS share.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The text is not a well-formed URL at all.
    #[error("invalid destination URL: {0}")]
    Parse(#[from] url::ParseError),

    /// The URL carries a scheme this driver does not handle.
    #[error("unsupported scheme {actual:?}, this driver handles {expected:?}")]
    SchemeMismatch {
        /// The scheme this driver accepts.
        expected: &'static str,
        /// The scheme that was given.
        actual: String,
    },

    /// The URL names no server.
    #[error("destination has no server host, expected nfs://server:/export")]
    MissingHost,

    /// The URL names no export path.
    #[error("destination has no export path, expected nfs://server:/export")]
    MissingPath,
}

/// A parsed NFS destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    host: String,
    export: String,
    options: Vec<String>,
}

impl Descriptor {
    /// Parse a destination URL.
    ///
    /// The host is kept exactly as written, including a port or a bare
    /// trailing colon: the mount source is assembled by concatenating
    /// host and export verbatim, so `nfs://server:/export` and
    /// `nfs://server/export` describe different mount sources even
    /// though they are the same URL after normalization.
    ///
    /// # Errors
    ///
    /// - [`DescriptorError::Parse`] for text that is not a URL
    /// - [`DescriptorError::SchemeMismatch`] for non-`nfs` schemes
    /// - [`DescriptorError::MissingHost`] / [`DescriptorError::MissingPath`]
    ///   when either component is absent
    pub fn parse(raw: &str) -> Result<Self, DescriptorError> {
        let raw = raw.trim();
        let url = Url::parse(raw)?;
        if url.scheme() != KIND {
            return Err(DescriptorError::SchemeMismatch {
                expected: KIND,
                actual: url.scheme().to_string(),
            });
        }

        let host = raw_host(raw).unwrap_or_default();
        if host.trim_end_matches(':').is_empty() {
            return Err(DescriptorError::MissingHost);
        }

        let export = percent_decode_str(url.path())
            .decode_utf8_lossy()
            .into_owned();
        if export.is_empty() {
            return Err(DescriptorError::MissingPath);
        }

        // The options parameter may repeat; every occurrence contributes,
        // in query order.
        let options = url
            .query_pairs()
            .filter(|(key, _)| key == OPTIONS_PARAM)
            .flat_map(|(_, value)| split_mount_options(&value))
            .collect();

        Ok(Self {
            host: host.to_string(),
            export,
            options,
        })
    }

    /// The server host as written, port or trailing colon included.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The export path, with its leading slash.
    pub fn export(&self) -> &str {
        &self.export
    }

    /// Mount options pinned in the URL; empty when none were given.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Pinned mount options, or `None` when the destination leaves option
    /// selection to version negotiation.
    pub fn pinned_options(&self) -> Option<&[String]> {
        if self.options.is_empty() {
            None
        } else {
            Some(&self.options)
        }
    }

    /// The mount source: host and export concatenated exactly as written.
    pub fn server_path(&self) -> String {
        format!("{}{}", self.host, self.export)
    }

    /// Canonical destination URL. Pinned options are configuration, not
    /// identity, so they are not part of it.
    pub fn dest_url(&self) -> String {
        format!("{KIND}://{}", self.server_path())
    }

    /// Where this destination mounts under `mount_root`.
    ///
    /// Pure derivation: the same descriptor and root always produce the
    /// same spec, mounted or not.
    pub fn mount_spec(&self, mount_root: &Path) -> MountSpec {
        let mount_dir = join_under(
            &mount_root.join(sanitize_host_dir(&self.host)),
            &self.export,
        );
        MountSpec {
            source: self.server_path(),
            mount_dir,
        }
    }
}

/// A destination resolved against a mount root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    /// Mount source handed to the mount program.
    pub source: String,
    /// Local directory the share gets mounted at.
    pub mount_dir: PathBuf,
}

/// The authority component exactly as the caller wrote it.
///
/// [`Url`] normalizes an empty port away, so `nfs://server:/export` comes
/// back from [`Url::host_str`] as plain `server`. That colon is
/// load-bearing for the mount source, which is why the authority is read
/// back out of the raw text. Userinfo is dropped; ports stay.
fn raw_host(raw: &str) -> Option<&str> {
    let (_, after_scheme) = raw.split_once("://")?;
    let end = after_scheme
        .find(['/', '?', '#'])
        .unwrap_or(after_scheme.len());
    let authority = &after_scheme[..end];
    Some(
        authority
            .rsplit_once('@')
            .map_or(authority, |(_, host)| host),
    )
}

/// Directory name for a host: dots become underscores so the component
/// reads as a single name, and a trailing colon (empty port marker) is
/// dropped.
fn sanitize_host_dir(host: &str) -> String {
    host.replace('.', "_").trim_end_matches(':').to_string()
}
