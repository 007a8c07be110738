//! loadprof - load-time profiler for scripting runtimes
//!
//! Intercepts a runtime's "load a unit of code" primitives and records, for
//! every load, its wall-clock and (optionally) resident-memory cost, split
//! into self cost and the cost of nested loads it triggered.
//!
//! The pieces:
//! - [`loader`]: the [`Loader`] seam and the [`ProfiledLoader`] interceptor
//! - [`profiler`]: per-load accounting and the timing/memory logs
//! - [`report`]: chronological and cost-sorted text reports
//! - [`manifest`]: a synthetic loader driven by a TOML unit manifest

pub mod cli;
pub mod clock;
pub mod config;
pub mod event;
pub mod loader;
pub mod manifest;
pub mod memory;
pub mod profiler;
pub mod report;

pub use config::ProfilerConfig;
pub use event::{LoadEvent, LoadKind, LoadRequest, MemoryEvent, TimingEvent};
pub use loader::{DirectLoader, LoadHost, Loader, ProfiledLoader};
pub use manifest::{Manifest, ManifestLoader, UnitError};
pub use profiler::{Profiler, ProfilerBuilder};
