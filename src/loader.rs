//! Load interception
//!
//! A runtime exposes its "load a unit of code" primitives by implementing
//! [`Loader`]. Wrapping it in a [`ProfiledLoader`] routes every call through
//! the profiler. Nested loads are intercepted too, because the wrapped loader
//! receives the wrapper as its [`LoadHost`] and issues nested loads through it.
//!
//! ```
//! use loadprof::{LoadHost, LoadRequest, Loader, ProfiledLoader, Profiler, ProfilerConfig};
//! use std::rc::Rc;
//!
//! struct Echo;
//!
//! impl Loader for Echo {
//!     type Output = String;
//!     type Error = std::convert::Infallible;
//!
//!     fn require(&self, request: &LoadRequest, _host: &dyn LoadHost<String, Self::Error>)
//!         -> Result<String, Self::Error> {
//!         Ok(request.unit.clone())
//!     }
//!
//!     fn load(&self, request: &LoadRequest, host: &dyn LoadHost<String, Self::Error>)
//!         -> Result<String, Self::Error> {
//!         self.require(request, host)
//!     }
//! }
//!
//! let profiler = Rc::new(Profiler::builder(ProfilerConfig::default())
//!     .diagnostics(std::io::sink())
//!     .build());
//! let loader = ProfiledLoader::new(Echo, Rc::clone(&profiler));
//!
//! assert_eq!(loader.require(&"json".into()).unwrap(), "json");
//! assert_eq!(profiler.timing_log().len(), 1);
//! ```

use crate::event::{LoadKind, LoadRequest};
use crate::profiler::Profiler;
use std::rc::Rc;

/// Entry points nested loads are issued through
pub trait LoadHost<O, E> {
    fn require(&self, request: &LoadRequest) -> Result<O, E>;
    fn load(&self, request: &LoadRequest) -> Result<O, E>;
}

/// The runtime's own load primitives
pub trait Loader {
    /// What a load returns (for `require`, typically "was it loaded now")
    type Output;
    /// What a failing load raises
    type Error;

    /// Load `request` unless it is already loaded
    fn require(
        &self,
        request: &LoadRequest,
        host: &dyn LoadHost<Self::Output, Self::Error>,
    ) -> Result<Self::Output, Self::Error>;

    /// Load `request` unconditionally
    fn load(
        &self,
        request: &LoadRequest,
        host: &dyn LoadHost<Self::Output, Self::Error>,
    ) -> Result<Self::Output, Self::Error>;
}

/// Interceptor: forwards to the wrapped loader, recording each call
#[derive(Debug)]
pub struct ProfiledLoader<L> {
    inner: L,
    profiler: Rc<Profiler>,
}

impl<L: Loader> ProfiledLoader<L> {
    pub fn new(inner: L, profiler: Rc<Profiler>) -> Self {
        Self { inner, profiler }
    }

    pub fn profiler(&self) -> &Rc<Profiler> {
        &self.profiler
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: Loader> LoadHost<L::Output, L::Error> for ProfiledLoader<L> {
    fn require(&self, request: &LoadRequest) -> Result<L::Output, L::Error> {
        self.profiler
            .time_and_record(LoadKind::Requiring, request, || self.inner.require(request, self))
    }

    fn load(&self, request: &LoadRequest) -> Result<L::Output, L::Error> {
        self.profiler
            .time_and_record(LoadKind::Loading, request, || self.inner.load(request, self))
    }
}

/// Host that calls the wrapped loader with no accounting at all
///
/// What an embedding uses when profiling is switched off.
#[derive(Debug, Default)]
pub struct DirectLoader<L> {
    inner: L,
}

impl<L: Loader> DirectLoader<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: Loader> LoadHost<L::Output, L::Error> for DirectLoader<L> {
    fn require(&self, request: &LoadRequest) -> Result<L::Output, L::Error> {
        self.inner.require(request, self)
    }

    fn load(&self, request: &LoadRequest) -> Result<L::Output, L::Error> {
        self.inner.load(request, self)
    }
}
