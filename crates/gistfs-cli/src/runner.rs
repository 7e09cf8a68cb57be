//! Mount lifecycle and logging initialization.

use anyhow::{Context, Result};
use fuser::MountOption;
use gistfs_client::HttpGistSource;
use gistfs_core::FsConfig;
use gistfs_core::cli::{ExitCode, LogFormat};
use gistfs_vfs::VirtualFs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::fuse::{GistFs, Ownership};

/// Initializes logging infrastructure.
///
/// `--verbose` forces `debug`; otherwise `RUST_LOG` wins over the
/// configured `level`. Logs always go to stderr.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: bool, level: &str, format: LogFormat) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    Ok(())
}

/// Builds the mount options for a CLI invocation.
#[must_use]
pub fn mount_options(cli: &Cli) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName("gistfs".to_string()),
        MountOption::Subtype("gistfs".to_string()),
        MountOption::DefaultPermissions,
    ];
    if cli.allow_other {
        options.push(MountOption::AllowOther);
    }
    if cli.auto_unmount {
        options.push(MountOption::AutoUnmount);
    }
    options
}

/// Ownership reported for mounted nodes: that of the mount point itself.
///
/// # Errors
///
/// Returns an error if the mount point cannot be inspected or is not a
/// directory.
pub fn mountpoint_ownership(mountpoint: &Path) -> Result<Ownership> {
    let metadata = std::fs::metadata(mountpoint)
        .with_context(|| format!("cannot access mount point {}", mountpoint.display()))?;
    if !metadata.is_dir() {
        anyhow::bail!("mount point {} is not a directory", mountpoint.display());
    }

    Ok(Ownership {
        uid: metadata.uid(),
        gid: metadata.gid(),
    })
}

/// Builds the filesystem, creates the configured owner directories and
/// mounts it. Blocks until the filesystem is unmounted.
///
/// # Errors
///
/// Returns an error if the runtime or the HTTP client cannot be created.
/// Mount failures are logged and reported as `ExitCode::MOUNT_ERROR`.
pub fn run(cli: &Cli, config: &FsConfig) -> Result<ExitCode> {
    let owner = match mountpoint_ownership(&cli.mountpoint) {
        Ok(owner) => owner,
        Err(e) => {
            error!("{e:#}");
            return Ok(ExitCode::INVALID_INPUT);
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("gistfs-worker")
        .build()
        .context("failed to start async runtime")?;

    let source = HttpGistSource::new(config)?;
    let vfs = Arc::new(VirtualFs::with_config(Arc::new(source), config));

    runtime.block_on(async {
        for owner in &config.owners {
            vfs.mkdir(vfs.root(), owner.as_str()).await?;
        }
        Ok::<_, gistfs_vfs::VfsError>(())
    })?;

    let fs = GistFs::new(Arc::clone(&vfs), runtime.handle().clone(), config, owner);
    let options = mount_options(cli);

    info!(
        "Mounting on {} ({} owners, endpoint {})",
        cli.mountpoint.display(),
        config.owners.len(),
        config.endpoint
    );

    match fuser::mount2(fs, &cli.mountpoint, &options) {
        Ok(()) => {
            info!("Unmounted {}", cli.mountpoint.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Failed to mount {}: {e}", cli.mountpoint.display());
            Ok(ExitCode::MOUNT_ERROR)
        }
    }
}

/// Exit code for the outcome of [`run`].
///
/// An error that escaped `run` is logged and reported as `ExitCode::ERROR`.
#[must_use]
pub fn exit_code(outcome: Result<ExitCode>) -> ExitCode {
    outcome.unwrap_or_else(|e| {
        error!("{e:#}");
        ExitCode::ERROR
    })
}
