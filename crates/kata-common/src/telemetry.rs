//! Console tracing for kata binaries.
//!
//! ```ignore
//! use kata_common::telemetry;
//!
//! fn main() {
//!     telemetry::init(tracing::Level::INFO);
//!     tracing::info!("ready");
//! }
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` overrides `default_level` when set. Calling this twice is
/// harmless: the second install is ignored.
pub fn init(default_level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();

    if installed.is_ok() {
        tracing::debug!(level = %default_level, "tracing initialized");
    }
}
