//! Resident set size sampling
//!
//! The accountant only needs "how many bytes are resident right now". On Linux
//! this comes from `/proc/self/statm`; elsewhere we fall back to the peak RSS
//! reported by `getrusage`, which is monotonic but still useful for spotting
//! heavy loads.

use nix::sys::resource::{getrusage, UsageWho};
use nix::unistd::{sysconf, SysconfVar};
use std::cell::Cell;
use std::fs;

/// A source of resident-set-size readings, in bytes
pub trait MemorySampler {
    fn rss_bytes(&self) -> u64;
}

/// RSS of the current process
#[derive(Debug, Default)]
pub struct ProcessRss {
    warned: Cell<bool>,
}

impl ProcessRss {
    pub fn new() -> Self {
        Self::default()
    }

    fn statm_bytes() -> Option<u64> {
        let statm = fs::read_to_string("/proc/self/statm").ok()?;
        parse_statm_resident(&statm, page_size()?)
    }

    fn rusage_bytes() -> Option<u64> {
        let usage = getrusage(UsageWho::RUSAGE_SELF).ok()?;
        let max_rss = u64::try_from(usage.max_rss()).ok()?;
        // ru_maxrss is reported in bytes on macOS and kilobytes everywhere else
        if cfg!(target_os = "macos") {
            Some(max_rss)
        } else {
            Some(max_rss * 1024)
        }
    }
}

impl MemorySampler for ProcessRss {
    fn rss_bytes(&self) -> u64 {
        if let Some(bytes) = Self::statm_bytes().or_else(Self::rusage_bytes) {
            return bytes;
        }
        if !self.warned.replace(true) {
            tracing::warn!("resident set size unavailable on this platform, reporting 0 bytes");
        }
        0
    }
}

fn page_size() -> Option<u64> {
    let size = sysconf(SysconfVar::PAGE_SIZE).ok()??;
    u64::try_from(size).ok().filter(|&s| s > 0)
}

/// Second field of statm is the resident page count
fn parse_statm_resident(statm: &str, page_size: u64) -> Option<u64> {
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(pages * page_size)
}

/// Sampler whose reading is set explicitly
///
/// Pairs with [`crate::clock::ManualClock`] to give loads exact memory costs.
#[derive(Debug, Default)]
pub struct ManualRss {
    bytes: Cell<u64>,
}

impl ManualRss {
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes: Cell::new(bytes),
        }
    }

    /// Grow (or, with a negative delta, shrink) the resident size
    pub fn adjust(&self, delta: i64) {
        let bytes = self.bytes.get().saturating_add_signed(delta);
        self.bytes.set(bytes);
    }

    pub fn set(&self, bytes: u64) {
        self.bytes.set(bytes);
    }
}

impl MemorySampler for ManualRss {
    fn rss_bytes(&self) -> u64 {
        self.bytes.get()
    }
}

impl<M: MemorySampler + ?Sized> MemorySampler for std::rc::Rc<M> {
    fn rss_bytes(&self) -> u64 {
        (**self).rss_bytes()
    }
}
