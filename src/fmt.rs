//! Logging shims.
//!
//! The driver logs through `log` or `defmt`, whichever feature is enabled.
//! With neither feature the macros expand to nothing.

#![allow(unused_macros)]

macro_rules! debug {
    ($($arg:tt)*) => {{
        cfg_if::cfg_if! {
            if #[cfg(feature = "log")] {
                log::debug!($($arg)*);
            } else if #[cfg(feature = "defmt")] {
                defmt::debug!($($arg)*);
            }
        }
    }};
}

macro_rules! warn {
    ($($arg:tt)*) => {{
        cfg_if::cfg_if! {
            if #[cfg(feature = "log")] {
                log::warn!($($arg)*);
            } else if #[cfg(feature = "defmt")] {
                defmt::warn!($($arg)*);
            }
        }
    }};
}
