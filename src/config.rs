//! # Codec Configuration
//!
//! This module provides the `Config` value threaded into every writer and
//! view at construction time. There is no hidden global: anything that wants
//! the escape hatch has to carry it explicitly.
//!
//! ## Bounds Checking
//!
//! Bounds checking on fixed-slot and variable-region accesses defaults to ON.
//! Disabling it removes per-access range checks for throughput at the cost of
//! safety on malformed buffers; behavior on corrupt input is then undefined
//! (typically a slice-index panic rather than a clean error). The toggle can
//! be resolved once from the process environment via [`Config::from_env`],
//! mirroring the conventional `*_ENABLE_UNSAFE_ACCESS` flag, but nothing in
//! this crate reads the environment implicitly.

/// Word size of the row format. Null bitsets, fixed slots, and all cursor
/// advances are multiples of this.
pub const WORD_SIZE: usize = 8;

/// Environment variable consulted by [`Config::from_env`]. Setting it to the
/// literal string `true` disables bounds checking.
pub const UNSAFE_ACCESS_ENV: &str = "ROWBIN_ENABLE_UNSAFE_ACCESS";

/// Configuration threaded into codec, writer, and view construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Check ordinals, element indices, and slot references on every access.
    pub bounds_checking: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bounds_checking: true,
        }
    }
}

impl Config {
    /// Resolves the bounds-checking toggle from the process environment.
    /// Safe mode unless `ROWBIN_ENABLE_UNSAFE_ACCESS=true`.
    pub fn from_env() -> Self {
        let unsafe_access = std::env::var(UNSAFE_ACCESS_ENV)
            .map(|v| v == "true")
            .unwrap_or(false);
        Self {
            bounds_checking: !unsafe_access,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_checking_defaults_on() {
        assert!(Config::default().bounds_checking);
    }

    #[test]
    fn env_flag_disables_bounds_checking() {
        std::env::remove_var(UNSAFE_ACCESS_ENV);
        assert!(Config::from_env().bounds_checking);
        std::env::set_var(UNSAFE_ACCESS_ENV, "1");
        assert!(Config::from_env().bounds_checking);
        std::env::set_var(UNSAFE_ACCESS_ENV, "true");
        assert!(!Config::from_env().bounds_checking);
        std::env::remove_var(UNSAFE_ACCESS_ENV);
    }
}
