//! Tracing setup for the CLI and the in-container server.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Must be called once at process startup. The default level is `info`
/// (`debug` when `verbose` is set); `RUST_LOG` overrides both.
///
/// # Panics
/// Panics if called more than once.
pub fn init(verbose: bool) {
    let default_level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_target(true).with_level(true))
        .init();
}
