// src/macros.rs

//! Diagnostic logging.
//!
//! Readings, delivery errors and usage text are user output and go through
//! `Console`. These macros carry diagnostics only. With the `logging` feature
//! they forward to `tracing`; without it errors still reach stderr and the
//! other levels only type-check their arguments.

#![allow(unused_macros)]

/// Expand one level: `tracing` when enabled, otherwise the given fallback.
macro_rules! log_at {
    ($level:ident, $fallback:ident, $($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        {
            ::tracing::$level!($($arg)*);
        }
        #[cfg(not(feature = "logging"))]
        {
            $crate::macros::log_at!(@fallback $fallback, $($arg)*);
        }
    }};
    (@fallback stderr, $($arg:tt)*) => {
        ::std::eprintln!($($arg)*)
    };
    (@fallback silent, $($arg:tt)*) => {
        if false {
            let _ = ::std::format!($($arg)*);
        }
    };
}

macro_rules! log_error {
    ($($arg:tt)*) => { $crate::macros::log_at!(error, stderr, $($arg)*) };
}

macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::macros::log_at!(warn, silent, $($arg)*) };
}

macro_rules! log_info {
    ($($arg:tt)*) => { $crate::macros::log_at!(info, silent, $($arg)*) };
}

macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::macros::log_at!(debug, silent, $($arg)*) };
}

pub(crate) use log_at;
pub(crate) use log_debug;
pub(crate) use log_error;
pub(crate) use log_info;
pub(crate) use log_warn;
