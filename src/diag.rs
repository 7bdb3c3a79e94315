//! Stderr diagnostics, gated by the `MINIMODEM_DEBUG` environment variable.

use std::sync::OnceLock;

fn debug_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var_os("MINIMODEM_DEBUG").is_some())
}

#[doc(hidden)]
pub fn debug_enabled_for_macro() -> bool {
    debug_enabled()
}

/// Prints to stderr only when `MINIMODEM_DEBUG` is set in the environment.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        if $crate::diag::debug_enabled_for_macro() {
            eprintln!($($arg)*);
        }
    };
}
