//! Operator tool for NFS backup store destinations.
//!
//! Mounts the destination the same way the driver does inside a backup
//! process, then reports where it landed and what the share root looks
//! like. Useful for verifying a destination URL and its mount options
//! before handing them to anything long-running.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stowage_core::BackupStoreDriver;
use stowage_mount::MountTimeouts;
use stowage_nfs::{NfsDriver, NfsDriverOptions};

/// Mount and verify an NFS backup store destination
#[derive(Parser, Debug)]
#[command(name = "stownfs", version, about)]
struct Args {
    /// Destination URL, nfs://server:/export[?nfsOptions=...]
    dest: String,

    /// Directory shares get mounted under
    #[arg(long, env = "STOWAGE_MOUNT_ROOT", default_value = "/var/lib/stowage/mounts")]
    mount_root: PathBuf,

    /// Poll interval for the mount command
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    interval: Duration,

    /// Deadline for each mount attempt
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    timeout: Duration,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let options = NfsDriverOptions {
        mount_root: args.mount_root,
        timeouts: MountTimeouts {
            interval: args.interval,
            timeout: args.timeout,
        },
    };

    let driver = NfsDriver::initialize(&args.dest, &options)
        .with_context(|| format!("cannot open backup store at {}", args.dest))?;

    println!("url:       {}", driver.url());
    println!("mounted:   {}", driver.mount_dir().display());
    println!("options:   {}", driver.mount_options().join(","));

    let entries = driver
        .list("")
        .context("share mounted but its root cannot be listed")?;
    println!("entries:   {}", entries.len());
    for name in entries.iter().take(10) {
        println!("  {name}");
    }
    if entries.len() > 10 {
        println!("  ... and {} more", entries.len() - 10);
    }

    Ok(())
}
