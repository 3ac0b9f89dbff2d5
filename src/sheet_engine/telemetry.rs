//! Tracing subscriber setup for binaries and demos embedding the engine.
//!
//! - `LOG_LEVEL` holds the filter directives (default `info`).
//! - `LOG_FORMAT=json` switches to JSON lines; anything else is the plain
//!   fmt output.
//!
//! The library itself only emits events; calling this is up to the host.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("info,mathsheet_gen=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    // try_init: a host may already have installed a subscriber.
    let _ = match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().try_init(),
        _ => builder.try_init(),
    };
}
