//! Gated logging macros and logger bootstrap.
//!
//! Every module that logs declares two constants and then uses the macros
//! exported at the crate root:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TARGET: &str = "wellcam::capture";
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("device granted for generation {}", generation);
//! ```
//! Flipping `ENABLE_LOGS` to `false` silences a noisy module without touching
//! the global filter.

use std::sync::atomic::{AtomicBool, Ordering};

/// Environment variable that forces verbose (debug level) output.
pub const DEBUG_ENV_VAR: &str = "WELLCAM_DEBUG";

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Initialize `env_logger` (honours `RUST_LOG`). Safe to call more than once.
///
/// The logger itself admits debug records; the global max level follows the
/// verbose gate, so `Settings::verbose` can raise it at any time.
pub fn init_logging() {
    let verbose = verbose() || debug_env_enabled();

    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    set_verbose(verbose);
}

/// True when `WELLCAM_DEBUG` is `1` or `true` (any case).
pub fn debug_env_enabled() -> bool {
    std::env::var(DEBUG_ENV_VAR)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Whether debug-level capture and engine traces are wanted.
pub fn verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub(crate) fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
    log::set_max_level(if enabled {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
}

/// Conditional info logging, gated by the caller's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Conditional warn logging, gated by the caller's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Conditional error logging, gated by the caller's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Debug logging that additionally requires verbose mode
/// (`WELLCAM_DEBUG` or `Settings::verbose`).
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS && $crate::utils::logging::verbose() {
            log::debug!(target: LOG_TARGET, $($arg)*);
        }
    };
}
