//! Text rendering of load events
//!
//! Two views per log: chronological (completion order, indented by depth)
//! and "for optimization" (ascending by self cost, so the heaviest loads end
//! up at the bottom of the terminal). None of these touch profiler state.

use crate::event::{LoadKind, LoadRequest, MemoryEvent, TimingEvent};
use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;

fn secs(d: Duration) -> String {
    format!("{:.6}", d.as_secs_f64())
}

fn entry_line(
    cumulative: impl Display,
    total: impl Display,
    self_cost: impl Display,
    unit: &str,
    indent: &str,
    name: impl Display,
    request: &LoadRequest,
) -> String {
    format!(
        "[{cumulative}{unit}] {indent}{name} {request}. Took a cumulative {total}{unit} ({self_cost}{unit} outside of sub-loads)."
    )
}

pub(crate) fn timing_begin_line(
    cumulative: Duration,
    indent: &str,
    kind: LoadKind,
    request: &LoadRequest,
) -> String {
    format!("[{}s] {}BEGIN {} {}...", secs(cumulative), indent, kind, request)
}

pub(crate) fn memory_begin_line(
    cumulative: i64,
    indent: &str,
    kind: LoadKind,
    request: &LoadRequest,
) -> String {
    format!("[{}b] {}BEGIN {} {}...", cumulative, indent, kind, request)
}

pub(crate) fn timing_end_line(event: &TimingEvent) -> String {
    entry_line(
        secs(event.cumulative_cost),
        secs(event.total_cost),
        secs(event.self_cost),
        "s",
        &event.indent,
        format_args!("END {}", event.kind),
        &event.request,
    )
}

pub(crate) fn memory_end_line(event: &MemoryEvent) -> String {
    entry_line(
        event.cumulative_cost,
        event.total_cost,
        event.self_cost,
        "b",
        &event.indent,
        format_args!("END {}", event.kind),
        &event.request,
    )
}

/// One chronological timing line
pub fn timing_line(event: &TimingEvent) -> String {
    entry_line(
        secs(event.cumulative_cost),
        secs(event.total_cost),
        secs(event.self_cost),
        "s",
        &event.indent,
        event.kind,
        &event.request,
    )
}

/// One chronological memory line
pub fn memory_line(event: &MemoryEvent) -> String {
    entry_line(
        event.cumulative_cost,
        event.total_cost,
        event.self_cost,
        "b",
        &event.indent,
        event.kind,
        &event.request,
    )
}

pub fn write_timing_info<W: Write + ?Sized>(out: &mut W, events: &[TimingEvent]) -> io::Result<()> {
    for event in events {
        writeln!(out, "{}", timing_line(event))?;
    }
    Ok(())
}

pub fn write_timing_info_for_optimization<W: Write + ?Sized>(
    out: &mut W,
    events: &[TimingEvent],
) -> io::Result<()> {
    let mut sorted: Vec<_> = events.iter().collect();
    sorted.sort_by_key(|e| e.self_cost);

    for event in sorted {
        writeln!(out, "{} s -- {} {}", secs(event.self_cost), event.kind, event.request)?;
    }
    Ok(())
}

pub fn write_memory_info<W: Write + ?Sized>(out: &mut W, events: &[MemoryEvent]) -> io::Result<()> {
    for event in events {
        writeln!(out, "{}", memory_line(event))?;
    }
    Ok(())
}

pub fn write_memory_info_for_optimization<W: Write + ?Sized>(
    out: &mut W,
    events: &[MemoryEvent],
) -> io::Result<()> {
    let mut sorted: Vec<_> = events.iter().collect();
    sorted.sort_by_key(|e| e.self_cost);

    for event in sorted {
        writeln!(out, "{} b -- {} {}", event.self_cost, event.kind, event.request)?;
    }
    Ok(())
}
