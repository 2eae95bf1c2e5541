//! Shared `tracing` subscriber setup for the `ust` binaries.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level implied by the command-line verbosity switches.
///
/// `-q` wins over any `-v`: warnings and errors only.
pub fn derive_level(n_verbosity: u8, if_quiet: bool) -> Level {
    if if_quiet {
        return Level::WARN;
    }
    match n_verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install a stderr `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity switches. Returns `false`
/// when a global subscriber was already installed.
pub fn init(n_verbosity: u8, if_quiet: bool) -> bool {
    let level = derive_level(n_verbosity, if_quiet);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
