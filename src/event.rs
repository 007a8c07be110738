//! Recorded load events

use std::fmt;
use std::time::Duration;

/// Which intercepted entry point produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadKind {
    /// `require`: load once, later calls are no-ops
    Requiring,
    /// `load`: execute the unit every time
    Loading,
}

impl LoadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadKind::Requiring => "requiring",
            LoadKind::Loading => "loading",
        }
    }
}

impl fmt::Display for LoadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of one load call, kept verbatim for display
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadRequest {
    /// Unit identifier (feature name or path)
    pub unit: String,
    /// Optional flags passed alongside the unit
    pub flags: Vec<String>,
}

impl LoadRequest {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            flags: Vec::new(),
        }
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }
}

impl From<&str> for LoadRequest {
    fn from(unit: &str) -> Self {
        Self::new(unit)
    }
}

impl From<String> for LoadRequest {
    fn from(unit: String) -> Self {
        Self::new(unit)
    }
}

/// Renders as an inspected argument list: `["a", "wrap"]`
impl fmt::Display for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entry(&self.unit)
            .entries(self.flags.iter())
            .finish()
    }
}

/// One completed load
///
/// `C` is the cost unit: [`Duration`] in the timing log, signed bytes in the
/// memory log. Memory cost is negative when the runtime freed more than the
/// load allocated.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadEvent<C> {
    /// Cost of the load excluding nested loads
    pub self_cost: C,
    /// Cost of the load including nested loads
    pub total_cost: C,
    /// Cost elapsed since the profiler started, at completion
    pub cumulative_cost: C,
    /// One space per call depth at the start of the load
    pub indent: String,
    pub kind: LoadKind,
    pub request: LoadRequest,
}

impl<C> LoadEvent<C> {
    /// Call depth the load started at
    pub fn depth(&self) -> usize {
        self.indent.len()
    }
}

pub type TimingEvent = LoadEvent<Duration>;
pub type MemoryEvent = LoadEvent<i64>;
