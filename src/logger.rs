//! Logger setup for the command-line driver.

use log::LevelFilter;

/// Level used when `RUST_LOG` is not set.
pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose { LevelFilter::Debug } else { LevelFilter::Warn }
}

/// Initializes the global logger.
///
/// # Arguments
///
/// * `verbose` - Whether debug output is enabled. `RUST_LOG` still wins when set.
pub fn init(verbose: bool) {
    let _ = env_logger::Builder::new()
        .filter_level(default_level(verbose))
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
    log::debug!("Verbose output enabled");
}
