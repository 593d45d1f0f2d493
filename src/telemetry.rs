use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber; logs go to stderr so stdout stays card output
///
/// `RUST_LOG` wins over `fallback` when set. Calling this twice is harmless.
pub fn init(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
