use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Logs go to stderr so command output on
/// stdout stays clean. `RUST_LOG` wins over `verbose` when set.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("fidelis=debug")
        } else {
            EnvFilter::new("fidelis=warn")
        }
    });

    // A subscriber may already be installed (e.g. by a test harness)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
