//! Profiler toggles
//!
//! Both switches are read once from the environment when a profiler is built:
//!
//! - `LOADPROF_PRINT_LIVE`: stream BEGIN/END lines to stderr as loads happen
//! - `LOADPROF_PROFILE_MEMORY`: also account resident memory per load
//!
//! A switch is on when its variable is set to anything other than an empty
//! string or `false`.

use std::env;

/// Environment variable enabling live output
pub const PRINT_LIVE_VAR: &str = "LOADPROF_PRINT_LIVE";
/// Environment variable enabling memory profiling
pub const PROFILE_MEMORY_VAR: &str = "LOADPROF_PROFILE_MEMORY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfilerConfig {
    /// Emit BEGIN/END lines while loads run
    pub print_live: bool,
    /// Sample RSS around each load and keep the memory log
    pub profile_memory: bool,
}

impl ProfilerConfig {
    /// Read both toggles from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read toggles through an arbitrary lookup (used by tests and embedders
    /// that keep settings somewhere other than the environment)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            print_live: is_enabled(lookup(PRINT_LIVE_VAR).as_deref()),
            profile_memory: is_enabled(lookup(PROFILE_MEMORY_VAR).as_deref()),
        }
    }

    pub fn with_print_live(mut self, on: bool) -> Self {
        self.print_live = on;
        self
    }

    pub fn with_profile_memory(mut self, on: bool) -> Self {
        self.profile_memory = on;
        self
    }
}

fn is_enabled(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(v) => {
            let v = v.trim();
            !v.is_empty() && !v.eq_ignore_ascii_case("false")
        }
    }
}
