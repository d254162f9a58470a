//! Standard tracing subscriber setup for binaries embedding agents.

/// Initialize a tracing subscriber with env-based filtering, writing to
/// stderr so command output on stdout stays machine-readable.
///
/// Default directives:
/// - `a2a_rt=info`
/// - `a2a_agent_runner=info`
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("a2a_rt=info".parse().unwrap_or_default())
        .add_directive("a2a_agent_runner=info".parse().unwrap_or_default());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
