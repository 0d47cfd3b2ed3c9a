//! Tracing setup for applications embedding Brook.
//!
//! Brook logs through [`tracing`] under the `brook` target family (`brook::hydrate`,
//! `brook::ssr`, `brook::dom`, `brook::reactive`). [`init`] installs a subscriber that prints
//! them; applications with their own subscriber skip it.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

static TRACING_INSTALLED: Once = Once::new();

/// Installs a global subscriber with an `EnvFilter` and a fmt layer (idempotent).
///
/// The call that performs the installation returns `false` when a global subscriber was
/// already set elsewhere; every later call returns `true`.
pub fn init() -> bool {
    init_with(DEFAULT_FILTER)
}

/// Like [`init`], with an explicit fallback filter for when `RUST_LOG` is unset.
pub fn init_with(default_filter: &str) -> bool {
    let mut installed = true;
    TRACING_INSTALLED.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        installed = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_filter(filter))
            .try_init()
            .is_ok();
    });
    installed
}
