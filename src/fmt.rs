//! Logging shims.
//!
//! The macros forward to `defmt` or `log` depending on the enabled feature and
//! compile away when neither is enabled.
#![allow(unused_macros)]

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        macro_rules! trace {
            ($($t:tt)*) => { defmt::trace!($($t)*) };
        }
        macro_rules! debug {
            ($($t:tt)*) => { defmt::debug!($($t)*) };
        }
        macro_rules! warn {
            ($($t:tt)*) => { defmt::warn!($($t)*) };
        }
        macro_rules! error {
            ($($t:tt)*) => { defmt::error!($($t)*) };
        }
    } else if #[cfg(feature = "log")] {
        macro_rules! trace {
            ($($t:tt)*) => { log::trace!($($t)*) };
        }
        macro_rules! debug {
            ($($t:tt)*) => { log::debug!($($t)*) };
        }
        macro_rules! warn {
            ($($t:tt)*) => { log::warn!($($t)*) };
        }
        macro_rules! error {
            ($($t:tt)*) => { log::error!($($t)*) };
        }
    } else {
        macro_rules! trace {
            ($s:literal $(, $x:expr)* $(,)?) => {{
                #[allow(unused_parens)]
                let _ = ($( & $x ),*);
            }};
        }
        macro_rules! debug {
            ($s:literal $(, $x:expr)* $(,)?) => {{
                #[allow(unused_parens)]
                let _ = ($( & $x ),*);
            }};
        }
        macro_rules! warn {
            ($s:literal $(, $x:expr)* $(,)?) => {{
                #[allow(unused_parens)]
                let _ = ($( & $x ),*);
            }};
        }
        macro_rules! error {
            ($s:literal $(, $x:expr)* $(,)?) => {{
                #[allow(unused_parens)]
                let _ = ($( & $x ),*);
            }};
        }
    }
}
