//! gistfs: mount a remote owner's gists as a filesystem.
//!
//! # Examples
//!
//! ```bash
//! # Expose alice's gists under /mnt/gists/alice
//! gistfs /mnt/gists alice
//!
//! # Add owners later
//! mkdir /mnt/gists/bob
//!
//! # Against a local mirror, without content caching
//! gistfs --endpoint 'http://localhost:8080/users/{owner}/gists' --cache-size 0 /mnt/gists
//! ```

use clap::Parser;
use gistfs_cli::Cli;
use gistfs_cli::{config, runner};
use gistfs_core::cli::ExitCode;

fn main() {
    let cli = Cli::parse();

    let config = match config::resolve(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(ExitCode::INVALID_INPUT.as_i32());
        }
    };

    if let Err(e) = runner::init_logging(cli.verbose, &config.log_level, cli.log_format) {
        eprintln!("Error: {e:#}");
        std::process::exit(ExitCode::ERROR.as_i32());
    }

    let exit_code = runner::exit_code(runner::run(&cli, &config));

    std::process::exit(exit_code.as_i32());
}
