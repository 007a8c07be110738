//! CLI argument parsing for loadprof

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "loadprof")]
#[command(version)]
#[command(about = "Profile the load tree of a synthetic unit manifest", long_about = None)]
pub struct Cli {
    /// Stream BEGIN/END lines while loads run (also LOADPROF_PRINT_LIVE)
    #[arg(short = 'l', long = "print-live")]
    pub print_live: bool,

    /// Account resident memory per load (also LOADPROF_PROFILE_MEMORY)
    #[arg(short = 'm', long = "profile-memory")]
    pub profile_memory: bool,

    /// Print loads sorted by self cost instead of in completion order
    #[arg(short = 's', long = "sort")]
    pub sort: bool,

    /// Enable debug tracing of the profiler itself
    #[arg(long = "debug")]
    pub debug: bool,

    /// TOML manifest describing the units
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Units to require (defaults to the manifest's `roots`)
    #[arg(value_name = "UNIT")]
    pub roots: Vec<String>,
}
