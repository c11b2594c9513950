//! Log output for the server binary. The filter is swapped once the
//! configuration has been loaded.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(default_level));
    let (layer, handle) = reload::Layer::new(filter);
    if tracing_subscriber::registry()
        .with(layer)
        .with(fmt::layer())
        .try_init()
        .is_ok()
    {
        let _ = FILTER_HANDLE.set(handle);
    }
}

/// Switches to the configured level. Returns `false` when `RUST_LOG` is set
/// or no subscriber was installed by [`init_tracing`].
pub fn apply_logging_level(level: &str) -> bool {
    if std::env::var_os("RUST_LOG").is_some() {
        return false;
    }
    FILTER_HANDLE
        .get()
        .is_some_and(|handle| handle.modify(|filter| *filter = level_filter(level)).is_ok())
}
