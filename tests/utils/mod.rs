// Shared helpers for integration tests
//
// Deterministic profilers (manual clock and RSS) and a capturing writer for
// the diagnostics stream.

#![allow(dead_code)]

use loadprof::clock::ManualClock;
use loadprof::memory::ManualRss;
use loadprof::{Manifest, ManifestLoader, ProfiledLoader, Profiler, ProfilerConfig};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

/// Writer whose contents can be read back after the profiler wrote to it
#[derive(Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Profiler on a manual clock and manual RSS, with captured diagnostics
pub struct Harness {
    pub profiler: Rc<Profiler>,
    pub clock: Rc<ManualClock>,
    pub rss: Rc<ManualRss>,
    pub output: Capture,
}

impl Harness {
    pub fn new(config: ProfilerConfig) -> Self {
        let clock = Rc::new(ManualClock::new());
        let rss = Rc::new(ManualRss::new(64 * 1024 * 1024));
        let output = Capture::default();
        let profiler = Rc::new(
            Profiler::builder(config)
                .clock(Rc::clone(&clock))
                .memory_sampler(Rc::clone(&rss))
                .diagnostics(output.clone())
                .build(),
        );
        Self {
            profiler,
            clock,
            rss,
            output,
        }
    }

    /// Loader over `manifest` where each unit's work advances the manual
    /// clock by `work_ms` and grows RSS by one kilobyte per millisecond
    pub fn loader(&self, manifest: &str) -> ProfiledLoader<ManifestLoader<impl Fn(Duration)>> {
        let manifest = Manifest::from_toml_str(manifest).expect("valid manifest");
        let clock = Rc::clone(&self.clock);
        let rss = Rc::clone(&self.rss);
        let work = move |d: Duration| {
            clock.advance(d);
            rss.adjust(d.as_millis() as i64 * 1024);
        };
        ProfiledLoader::new(
            ManifestLoader::with_work(manifest, work),
            Rc::clone(&self.profiler),
        )
    }

    pub fn units(&self) -> Vec<String> {
        self.profiler
            .timing_log()
            .iter()
            .map(|e| e.request.unit.clone())
            .collect()
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
