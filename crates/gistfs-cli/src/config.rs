//! Configuration loading.
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/gistfs/config.toml`
//! - macOS: `~/Library/Application Support/gistfs/config.toml`
//!
//! or at the path given with `--config`. Command-line flags override values
//! from the file.

use crate::cli::Cli;
use anyhow::{Context, Result};
use gistfs_core::{FsConfig, Owner};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Gets the default configuration file path.
///
/// # Errors
///
/// Returns an error if the platform has no config directory.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("failed to determine config directory")?;

    Ok(config_dir.join("gistfs").join("config.toml"))
}

/// Loads configuration from `path`, or from the default location.
///
/// A missing file at the default location yields defaults; a missing file
/// that was named explicitly is an error.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<FsConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default_path = default_config_path()?;
            if !default_path.exists() {
                debug!("Config file not found, using defaults");
                return Ok(FsConfig::default());
            }
            default_path
        }
    };

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config file {}", config_path.display()))?;

    let config: FsConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", config_path.display()))?;

    debug!("Loaded config from {}", config_path.display());
    Ok(config)
}

/// Applies command-line overrides on top of a loaded configuration.
///
/// Owners given on the command line are appended after those from the
/// file, skipping duplicates.
///
/// # Errors
///
/// Returns an error if an owner name is not a valid path segment.
pub fn apply_overrides(config: &mut FsConfig, cli: &Cli) -> Result<()> {
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint.clone_from(endpoint);
    }

    if let Some(cache_size) = cli.cache_size {
        config.cache_capacity = cache_size;
    }

    if cli.verbose {
        config.log_level = "debug".to_string();
    }

    for name in &cli.owners {
        let owner = Owner::parse(name.as_str())
            .with_context(|| format!("invalid owner on command line: '{name}'"))?;
        if !config.owners.contains(&owner) {
            config.owners.push(owner);
        }
    }

    Ok(())
}

/// Loads, overrides and validates the configuration for a CLI invocation.
///
/// # Errors
///
/// Returns an error if loading fails, an override is invalid, or the
/// resulting configuration does not validate.
pub fn resolve(cli: &Cli) -> Result<FsConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, cli)?;

    for owner in &config.owners {
        Owner::parse(owner.as_str())
            .with_context(|| format!("invalid owner in config: '{owner}'"))?;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path().unwrap();
        assert!(path.ends_with("gistfs/config.toml"));
    }

    #[test]
    fn test_load_explicit_config() {
        let file = write_config(
            r#"
            endpoint = "http://127.0.0.1:9000/u/{owner}"
            cache_capacity = 8
            owners = ["alice"]
            "#,
        );

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.endpoint, "http://127.0.0.1:9000/u/{owner}");
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.owners, vec![Owner::new("alice")]);
        assert_eq!(config.dir_mode, 0o770);
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_malformed_config_fails() {
        let file = write_config("cache_capacity = \"lots\"");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config = FsConfig::builder()
            .endpoint("http://file/{owner}")
            .cache_capacity(16)
            .owner("alice")
            .build();

        let cli = Cli::parse_from([
            "gistfs",
            "--endpoint",
            "http://flag/{owner}",
            "--cache-size",
            "0",
            "-v",
            "/mnt",
            "bob",
            "alice",
        ]);
        apply_overrides(&mut config, &cli).unwrap();

        assert_eq!(config.endpoint, "http://flag/{owner}");
        assert_eq!(config.cache_capacity, 0);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.owners, vec![Owner::new("alice"), Owner::new("bob")]);
    }

    #[test]
    fn test_overrides_reject_bad_owner() {
        let mut config = FsConfig::default();
        let cli = Cli::parse_from(["gistfs", "/mnt", "a/b"]);
        assert!(apply_overrides(&mut config, &cli).is_err());
    }

    #[test]
    fn test_resolve_rejects_invalid_endpoint() {
        let file = write_config(r#"endpoint = "https://example.com/gists""#);
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["gistfs", "--config", path, "/mnt"]);
        let err = resolve(&cli).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn test_resolve_rejects_bad_owner_in_file() {
        let file = write_config(r#"owners = [".."]"#);
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["gistfs", "--config", path, "/mnt"]);
        assert!(resolve(&cli).is_err());
    }

    #[test]
    fn test_resolve_with_explicit_file() {
        let file = write_config("request_timeout_secs = 5\nowners = [\"alice\"]\n");
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["gistfs", "--config", path, "/mnt", "bob"]);
        let config = resolve(&cli).unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.owners.len(), 2);
    }
}
