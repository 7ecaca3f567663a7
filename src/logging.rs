use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Logs go to stderr so stdout only carries the run's result. `RUST_LOG`
/// wins over the verbosity flag when set.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
