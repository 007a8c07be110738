//! Synthetic load trees
//!
//! A manifest describes units of code by what they load and how long their
//! own body takes. [`ManifestLoader`] "executes" them, which lets the profiler
//! be exercised (and demonstrated) without an embedded runtime.
//!
//! # Example manifest
//!
//! ```toml
//! roots = ["app"]
//!
//! [units.app]
//! requires = ["json", "net"]
//! work_ms = 5
//!
//! [units.json]
//! work_ms = 10
//!
//! [units.net]
//! requires = ["json"]
//! loads = ["net_config"]
//! work_ms = 2
//!
//! [units.net_config]
//! work_ms = 1
//! fail = "missing certificate"
//! ```

use crate::event::LoadRequest;
use crate::loader::{LoadHost, Loader};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Failures raised while loading a unit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("cannot load such unit -- {0}")]
    NotFound(String),

    #[error("{unit}: {message}")]
    Raised { unit: String, message: String },
}

/// One unit of code
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct UnitSpec {
    /// Units pulled in with `require`, in order
    #[serde(default)]
    pub requires: Vec<String>,
    /// Units pulled in with `load`, after the requires
    #[serde(default)]
    pub loads: Vec<String>,
    /// Time the unit's own body takes
    #[serde(default)]
    pub work_ms: u64,
    /// Raise this message once the body has run
    #[serde(default)]
    pub fail: Option<String>,
}

/// Root of a manifest file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Manifest {
    /// Units required when no roots are given on the command line
    #[serde(default)]
    pub roots: Vec<String>,
    #[serde(default)]
    pub units: BTreeMap<String, UnitSpec>,
}

impl Manifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid manifest {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Names referenced by a unit or root but never defined
    pub fn undefined_units(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = self
            .roots
            .iter()
            .chain(self.units.values().flat_map(|u| u.requires.iter().chain(u.loads.iter())))
            .map(String::as_str)
            .filter(|name| !self.units.contains_key(*name))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}

/// How a unit's own work is spent
pub trait Work {
    fn perform(&self, duration: Duration);
}

/// Blocks the thread for the unit's work time
#[derive(Debug, Default, Clone, Copy)]
pub struct Sleep;

impl Work for Sleep {
    fn perform(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

impl<F: Fn(Duration)> Work for F {
    fn perform(&self, duration: Duration) {
        self(duration)
    }
}

/// Executes manifest units with `require`-once and `load`-always semantics
///
/// `require` returns `Ok(false)` for a unit that is already loaded or is
/// still loading further up the stack (a cycle).
#[derive(Debug)]
pub struct ManifestLoader<W = Sleep> {
    manifest: Manifest,
    work: W,
    loaded: RefCell<HashSet<String>>,
}

impl ManifestLoader<Sleep> {
    pub fn new(manifest: Manifest) -> Self {
        Self::with_work(manifest, Sleep)
    }
}

impl<W: Work> ManifestLoader<W> {
    pub fn with_work(manifest: Manifest, work: W) -> Self {
        Self {
            manifest,
            work,
            loaded: RefCell::new(HashSet::new()),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn is_loaded(&self, unit: &str) -> bool {
        self.loaded.borrow().contains(unit)
    }

    fn execute(&self, unit: &str, host: &dyn LoadHost<bool, UnitError>) -> Result<(), UnitError> {
        let spec = self
            .manifest
            .units
            .get(unit)
            .ok_or_else(|| UnitError::NotFound(unit.to_string()))?;

        for dep in &spec.requires {
            host.require(&LoadRequest::new(dep.as_str()))?;
        }
        for dep in &spec.loads {
            host.load(&LoadRequest::new(dep.as_str()))?;
        }

        self.work.perform(Duration::from_millis(spec.work_ms));

        match &spec.fail {
            Some(message) => Err(UnitError::Raised {
                unit: unit.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl<W: Work> Loader for ManifestLoader<W> {
    type Output = bool;
    type Error = UnitError;

    fn require(&self, request: &LoadRequest, host: &dyn LoadHost<bool, UnitError>) -> Result<bool, UnitError> {
        if !self.manifest.units.contains_key(&request.unit) {
            return Err(UnitError::NotFound(request.unit.clone()));
        }
        // Marked before executing so cycles terminate, and removed again on
        // failure so a later require retries the unit.
        if !self.loaded.borrow_mut().insert(request.unit.clone()) {
            return Ok(false);
        }
        match self.execute(&request.unit, host) {
            Ok(()) => Ok(true),
            Err(err) => {
                self.loaded.borrow_mut().remove(&request.unit);
                Err(err)
            }
        }
    }

    fn load(&self, request: &LoadRequest, host: &dyn LoadHost<bool, UnitError>) -> Result<bool, UnitError> {
        self.execute(&request.unit, host)?;
        Ok(true)
    }
}
