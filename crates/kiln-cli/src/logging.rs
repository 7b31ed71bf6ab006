//! Tracing setup.
//!
//! The subscriber is only installed when `KILN_LOG` (or `RUST_LOG`) is set.
//! Both use the usual filter syntax, e.g. `KILN_LOG=kiln_java=debug`.

use tracing_subscriber::EnvFilter;

fn build_filter() -> Option<EnvFilter> {
    if let Ok(value) = std::env::var("KILN_LOG") {
        return Some(EnvFilter::builder().parse_lossy(value));
    }
    std::env::var("RUST_LOG")
        .is_ok()
        .then(EnvFilter::from_default_env)
}

/// Installs a plain text subscriber writing to stderr, so that logs never
/// mix with command output.
pub fn init_tracing() {
    let Some(filter) = build_filter() else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
