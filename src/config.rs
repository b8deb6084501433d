//! Runtime feature toggles for the ambient caches and the observer layer.
//!
//! Grounded in the reference implementation's config surface (an embedder
//! sets a handful of named flags before constructing the VM); reworked here
//! as a plain key/value setter over the process-wide caches themselves,
//! since this crate's caches are global (`cache::ANALYSIS_CACHE`,
//! `cache::KECCAK_CACHE`) rather than owned per-VM.

use crate::cache::{ANALYSIS_CACHE, KECCAK_CACHE};
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether the default tracer used by `execute`/`step_n` when none is
/// supplied explicitly should print to stdout. Off by default.
static LOGGING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Whether `Profiler`-based call sites should collect full (`true`) or
/// external-only (`false`) statistics; the inverse of the `"profiling_external"`
/// toggle, which defaults to off (so profiling defaults to `Full` scope).
static PROFILING_FULL: AtomicBool = AtomicBool::new(true);

/// Whether profiling is enabled at all.
static PROFILING_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn logging_enabled() -> bool {
    LOGGING_ENABLED.load(Ordering::Relaxed)
}

pub fn profiling_enabled() -> bool {
    PROFILING_ENABLED.load(Ordering::Relaxed)
}

pub fn profiling_full() -> bool {
    PROFILING_FULL.load(Ordering::Relaxed)
}

/// Set a named toggle. `value` must be `"true"` or `"false"`.
///
/// Recognized names: `"logging"`, `"analysis_cache"`, `"sha3_cache"`,
/// `"profiling"`, `"profiling_external"`.
pub fn set(name: &str, value: &str) -> Result<(), &'static str> {
    let enabled = match value {
        "true" => true,
        "false" => false,
        _ => return Err("invalid value"),
    };

    match name {
        "logging" => LOGGING_ENABLED.store(enabled, Ordering::Relaxed),
        "analysis_cache" => ANALYSIS_CACHE.lock().set_enabled(enabled),
        "sha3_cache" => KECCAK_CACHE.set_enabled(enabled),
        "profiling" => PROFILING_ENABLED.store(enabled, Ordering::Relaxed),
        "profiling_external" => PROFILING_FULL.store(!enabled, Ordering::Relaxed),
        _ => return Err("invalid name"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_name() {
        assert_eq!(set("not_a_real_toggle", "true"), Err("invalid name"));
    }

    #[test]
    fn rejects_non_boolean_value() {
        assert_eq!(set("logging", "yes"), Err("invalid value"));
    }

    #[test]
    fn toggles_logging() {
        assert_eq!(set("logging", "true"), Ok(()));
        assert!(logging_enabled());
        assert_eq!(set("logging", "false"), Ok(()));
        assert!(!logging_enabled());
    }

    #[test]
    fn toggles_analysis_cache() {
        assert_eq!(set("analysis_cache", "false"), Ok(()));
        assert!(!ANALYSIS_CACHE.lock().enabled());
        assert_eq!(set("analysis_cache", "true"), Ok(()));
        assert!(ANALYSIS_CACHE.lock().enabled());
    }
}
