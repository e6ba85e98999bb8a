//! Logging macros that forward to `log` or `defmt`, whichever feature is
//! enabled, and do nothing when neither is (so the core stays usable on
//! targets with no logging backend at all). Dispatch follows the
//! teacher's own `cfg_if!`-based log/defmt selection.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "log")] {
        macro_rules! trace { ($($arg:tt)*) => { log::trace!($($arg)*) }; }
        macro_rules! debug { ($($arg:tt)*) => { log::debug!($($arg)*) }; }
        macro_rules! warn { ($($arg:tt)*) => { log::warn!($($arg)*) }; }
    } else if #[cfg(feature = "defmt")] {
        macro_rules! trace { ($($arg:tt)*) => { defmt::trace!($($arg)*) }; }
        macro_rules! debug { ($($arg:tt)*) => { defmt::debug!($($arg)*) }; }
        macro_rules! warn { ($($arg:tt)*) => { defmt::warn!($($arg)*) }; }
    } else {
        macro_rules! trace { ($($arg:tt)*) => {}; }
        macro_rules! debug { ($($arg:tt)*) => {}; }
        macro_rules! warn { ($($arg:tt)*) => {}; }
    }
}

pub(crate) use {debug, trace, warn};
