//! Load accounting
//!
//! Every intercepted load runs inside [`Profiler::time_and_record`], which
//! measures its total cost and subtracts what its nested loads already
//! reported to get its self cost.
//!
//! Child cost is tracked on an explicit stack of accumulator frames. The
//! bottom frame belongs to the top level and is never popped; each running
//! load owns one frame above it. When a load completes, its total cost is
//! credited to the frame below (its parent), so the parent's own subtraction
//! sees exactly the child cost accrued while the parent was running,
//! grandchildren included.

use crate::clock::{Clock, SystemClock};
use crate::config::ProfilerConfig;
use crate::event::{LoadEvent, LoadKind, LoadRequest, MemoryEvent, TimingEvent};
use crate::memory::{MemorySampler, ProcessRss};
use crate::report;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

/// Total cost of the completed direct nested loads of one running load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Frame {
    child_time: Duration,
    child_memory: i64,
}

impl Frame {
    fn absorb(&mut self, other: Frame) {
        self.child_time += other.child_time;
        self.child_memory += other.child_memory;
    }
}

/// Pops the frame pushed for one load on every exit path
///
/// When dropped without [`FrameGuard::complete`] (the load failed or
/// panicked), the frame's child costs move to the parent frame. Nested loads
/// that finished before the failure therefore stay counted by ancestors.
struct FrameGuard<'a> {
    frames: &'a RefCell<Vec<Frame>>,
    armed: bool,
}

impl<'a> FrameGuard<'a> {
    fn push(frames: &'a RefCell<Vec<Frame>>) -> Self {
        frames.borrow_mut().push(Frame::default());
        Self {
            frames,
            armed: true,
        }
    }

    fn complete(mut self) -> Frame {
        self.armed = false;
        self.frames.borrow_mut().pop().unwrap_or_default()
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut frames = self.frames.borrow_mut();
        if let Some(frame) = frames.pop() {
            if let Some(parent) = frames.last_mut() {
                parent.absorb(frame);
            }
        }
    }
}

/// Profiler context: configuration, measurement sources, and the two logs
///
/// Single-threaded by construction (`!Send`, `!Sync`). Share it between the
/// interceptor and the embedding application with `Rc`.
pub struct Profiler {
    config: ProfilerConfig,
    clock: Box<dyn Clock>,
    memory: Box<dyn MemorySampler>,
    start: Duration,
    start_memory: u64,
    frames: RefCell<Vec<Frame>>,
    timing_log: RefCell<Vec<TimingEvent>>,
    memory_log: RefCell<Vec<MemoryEvent>>,
    diagnostics: RefCell<Box<dyn Write>>,
}

impl fmt::Debug for Profiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profiler")
            .field("config", &self.config)
            .field("depth", &self.depth())
            .field("timing_events", &self.timing_log.borrow().len())
            .field("memory_events", &self.memory_log.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Profiler`]
///
/// Defaults: [`SystemClock`], [`ProcessRss`], diagnostics on stderr.
pub struct ProfilerBuilder {
    config: ProfilerConfig,
    clock: Box<dyn Clock>,
    memory: Box<dyn MemorySampler>,
    diagnostics: Box<dyn Write>,
}

impl ProfilerBuilder {
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn memory_sampler(mut self, sampler: impl MemorySampler + 'static) -> Self {
        self.memory = Box::new(sampler);
        self
    }

    /// Where live lines and reports go
    pub fn diagnostics(mut self, out: impl Write + 'static) -> Self {
        self.diagnostics = Box::new(out);
        self
    }

    /// Capture the start readings and build the profiler
    pub fn build(self) -> Profiler {
        let start = self.clock.now();
        let start_memory = if self.config.profile_memory {
            self.memory.rss_bytes()
        } else {
            0
        };

        tracing::debug!(
            print_live = self.config.print_live,
            profile_memory = self.config.profile_memory,
            start_memory,
            "profiler started"
        );

        Profiler {
            config: self.config,
            clock: self.clock,
            memory: self.memory,
            start,
            start_memory,
            frames: RefCell::new(vec![Frame::default()]),
            timing_log: RefCell::new(Vec::new()),
            memory_log: RefCell::new(Vec::new()),
            diagnostics: RefCell::new(self.diagnostics),
        }
    }
}

impl Profiler {
    /// Profiler with the default clock, RSS sampler and stderr output
    pub fn new(config: ProfilerConfig) -> Self {
        Self::builder(config).build()
    }

    /// Profiler configured from `LOADPROF_*` environment variables
    pub fn from_env() -> Self {
        Self::new(ProfilerConfig::from_env())
    }

    pub fn builder(config: ProfilerConfig) -> ProfilerBuilder {
        ProfilerBuilder {
            config,
            clock: Box::new(SystemClock::new()),
            memory: Box::new(ProcessRss::new()),
            diagnostics: Box::new(io::stderr()),
        }
    }

    pub fn config(&self) -> ProfilerConfig {
        self.config
    }

    /// Number of loads currently running
    pub fn depth(&self) -> usize {
        self.frames.borrow().len().saturating_sub(1)
    }

    /// Completed loads in completion order
    ///
    /// Drop the returned borrow before starting another load.
    pub fn timing_log(&self) -> Ref<'_, [TimingEvent]> {
        Ref::map(self.timing_log.borrow(), Vec::as_slice)
    }

    /// Memory costs of completed loads; empty unless memory profiling is on
    pub fn memory_log(&self) -> Ref<'_, [MemoryEvent]> {
        Ref::map(self.memory_log.borrow(), Vec::as_slice)
    }

    /// Run one load and record its cost
    ///
    /// `f` performs the actual load and may re-enter this profiler for nested
    /// loads. Its result is returned untouched. A failed load is not
    /// recorded.
    pub fn time_and_record<T, E, F>(&self, kind: LoadKind, request: &LoadRequest, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let indent = " ".repeat(self.depth());
        let start_at = self.clock.now();
        let start_memory = self.config.profile_memory.then(|| self.memory.rss_bytes());

        if self.config.print_live {
            self.live_begin(kind, request, &indent, start_at, start_memory);
        }

        let guard = FrameGuard::push(&self.frames);
        tracing::trace!(depth = self.depth(), unit = %request.unit, "{} begin", kind);

        let value = match f() {
            Ok(value) => value,
            Err(err) => {
                drop(guard);
                tracing::debug!(depth = self.depth(), unit = %request.unit, "{} failed, cost discarded", kind);
                return Err(err);
            }
        };
        let children = guard.complete();

        let end_at = self.clock.now();
        let end_memory = start_memory.map(|_| self.memory.rss_bytes());

        let total_time = end_at.saturating_sub(start_at);
        let timing = LoadEvent {
            self_cost: total_time.saturating_sub(children.child_time),
            total_cost: total_time,
            cumulative_cost: end_at.saturating_sub(self.start),
            indent,
            kind,
            request: request.clone(),
        };

        let memory = start_memory.zip(end_memory).map(|(start_bytes, end_bytes)| {
            let total = byte_delta(end_bytes, start_bytes);
            LoadEvent {
                self_cost: total - children.child_memory,
                total_cost: total,
                cumulative_cost: byte_delta(end_bytes, self.start_memory),
                indent: timing.indent.clone(),
                kind,
                request: request.clone(),
            }
        });

        if self.config.print_live {
            self.live_end(&timing, memory.as_ref());
        }

        // Equals the total cost unless the self time saturated at zero
        let credit = Frame {
            child_time: children.child_time + timing.self_cost,
            child_memory: memory
                .as_ref()
                .map_or(0, |m| children.child_memory + m.self_cost),
        };

        tracing::trace!(
            depth = self.depth(),
            unit = %request.unit,
            self_us = timing.self_cost.as_micros() as u64,
            total_us = timing.total_cost.as_micros() as u64,
            "{} end",
            kind
        );

        self.timing_log.borrow_mut().push(timing);
        if let Some(memory) = memory {
            self.memory_log.borrow_mut().push(memory);
        }
        if let Some(parent) = self.frames.borrow_mut().last_mut() {
            parent.absorb(credit);
        }

        Ok(value)
    }

    /// Timing log, chronological
    pub fn print_timing_info(&self) -> io::Result<()> {
        report::write_timing_info(&mut **self.diagnostics.borrow_mut(), &self.timing_log())
    }

    /// Timing log, cheapest self cost first
    pub fn print_timing_info_for_optimization(&self) -> io::Result<()> {
        report::write_timing_info_for_optimization(
            &mut **self.diagnostics.borrow_mut(),
            &self.timing_log(),
        )
    }

    /// Memory log, chronological
    pub fn print_memory_info(&self) -> io::Result<()> {
        report::write_memory_info(&mut **self.diagnostics.borrow_mut(), &self.memory_log())
    }

    /// Memory log, smallest self cost first
    pub fn print_memory_info_for_optimization(&self) -> io::Result<()> {
        report::write_memory_info_for_optimization(
            &mut **self.diagnostics.borrow_mut(),
            &self.memory_log(),
        )
    }

    // Live output is best effort: a broken diagnostics stream must not turn
    // into a load failure.
    fn live_begin(
        &self,
        kind: LoadKind,
        request: &LoadRequest,
        indent: &str,
        start_at: Duration,
        start_memory: Option<u64>,
    ) {
        let mut out = self.diagnostics.borrow_mut();
        let cumulative = start_at.saturating_sub(self.start);
        let _ = writeln!(out, "{}", report::timing_begin_line(cumulative, indent, kind, request));
        if let Some(bytes) = start_memory {
            let cumulative = byte_delta(bytes, self.start_memory);
            let _ = writeln!(out, "{}", report::memory_begin_line(cumulative, indent, kind, request));
        }
    }

    fn live_end(&self, timing: &TimingEvent, memory: Option<&MemoryEvent>) {
        let mut out = self.diagnostics.borrow_mut();
        let _ = writeln!(out, "{}", report::timing_end_line(timing));
        if let Some(memory) = memory {
            let _ = writeln!(out, "{}", report::memory_end_line(memory));
        }
    }
}

fn byte_delta(to: u64, from: u64) -> i64 {
    (to as i64).wrapping_sub(from as i64)
}
