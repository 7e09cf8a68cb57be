//! CLI argument definitions.

use clap::Parser;
use gistfs_core::cli::LogFormat;
use std::path::PathBuf;

/// Mount a remote owner's gists as a filesystem.
///
/// Every OWNER becomes a top-level directory whose files are the owner's
/// published gist files. Further owners can be added at runtime with
/// `mkdir <MOUNTPOINT>/<owner>`.
#[derive(Parser, Debug)]
#[command(name = "gistfs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory to mount the filesystem on
    pub mountpoint: PathBuf,

    /// Owners to expose as top-level directories
    pub owners: Vec<String>,

    /// Listing URL template; `{owner}` is replaced with the encoded owner name
    #[arg(long, env = "GISTFS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Number of opened files kept in memory (0 disables the cache)
    #[arg(long = "cache-size")]
    pub cache_size: Option<usize>,

    /// Path to a TOML configuration file
    #[arg(short, long, env = "GISTFS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Allow other users to access the mount
    #[arg(long)]
    pub allow_other: bool,

    /// Unmount automatically when the process exits
    #[arg(long)]
    pub auto_unmount: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format (text, json)
    #[arg(long = "log-format", default_value = "text")]
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parsing_mountpoint_only() {
        let cli = Cli::parse_from(["gistfs", "/mnt/gists"]);
        assert_eq!(cli.mountpoint, PathBuf::from("/mnt/gists"));
        assert!(cli.owners.is_empty());
        assert!(cli.endpoint.is_none());
        assert!(cli.cache_size.is_none());
        assert!(!cli.allow_other);
        assert!(!cli.auto_unmount);
        assert!(!cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_cli_parsing_owners() {
        let cli = Cli::parse_from(["gistfs", "/mnt/gists", "alice", "bob"]);
        assert_eq!(cli.owners, vec!["alice", "bob"]);
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "gistfs",
            "--endpoint",
            "http://localhost:8080/users/{owner}/gists",
            "--cache-size",
            "0",
            "--config",
            "/etc/gistfs.toml",
            "--allow-other",
            "--auto-unmount",
            "-v",
            "--log-format",
            "json",
            "/mnt/gists",
            "alice",
        ]);

        assert_eq!(
            cli.endpoint.as_deref(),
            Some("http://localhost:8080/users/{owner}/gists")
        );
        assert_eq!(cli.cache_size, Some(0));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/gistfs.toml")));
        assert!(cli.allow_other);
        assert!(cli.auto_unmount);
        assert!(cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.owners, vec!["alice"]);
    }

    #[test]
    fn test_cli_requires_mountpoint() {
        assert!(Cli::try_parse_from(["gistfs"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_log_format() {
        let result = Cli::try_parse_from(["gistfs", "--log-format", "yaml", "/mnt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_negative_cache_size() {
        let result = Cli::try_parse_from(["gistfs", "--cache-size", "-1", "/mnt"]);
        assert!(result.is_err());
    }
}
