use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Use a filter value such as
/// "converge=DEBUG" or "=TRACE" to widen the scope; `None` falls back to the
/// RUST_LOG environment variable.
pub fn setup_tracing(level: Option<String>) {
    let filter = match level {
        Some(directives) => EnvFilter::builder().parse_lossy(directives),
        None => EnvFilter::from_default_env(),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
