use anyhow::Result;
use clap::Parser;
use loadprof::{cli::Cli, LoadHost, LoadRequest, Manifest, ManifestLoader, ProfiledLoader, Profiler, ProfilerConfig};
use std::process::ExitCode;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Print the collected logs, in the order selected on the command line
fn print_reports(profiler: &Profiler, sort: bool) -> Result<()> {
    if sort {
        profiler.print_timing_info_for_optimization()?;
    } else {
        profiler.print_timing_info()?;
    }

    if profiler.config().profile_memory {
        if sort {
            profiler.print_memory_info_for_optimization()?;
        } else {
            profiler.print_memory_info()?;
        }
    }
    Ok(())
}

fn run(args: Cli) -> Result<bool> {
    let manifest = Manifest::from_file(&args.manifest)?;

    let undefined = manifest.undefined_units();
    if !undefined.is_empty() {
        tracing::warn!(units = ?undefined, "manifest references undefined units");
    }

    let roots = if args.roots.is_empty() {
        manifest.roots.clone()
    } else {
        args.roots
    };
    if roots.is_empty() {
        anyhow::bail!(
            "No units to load: pass UNIT arguments or set `roots` in {}",
            args.manifest.display()
        );
    }

    let config = ProfilerConfig::from_env();
    let config = config
        .with_print_live(config.print_live || args.print_live)
        .with_profile_memory(config.profile_memory || args.profile_memory);

    let profiler = Rc::new(Profiler::new(config));
    let loader = ProfiledLoader::new(ManifestLoader::new(manifest), Rc::clone(&profiler));

    let mut all_loaded = true;
    for root in &roots {
        if let Err(err) = loader.require(&LoadRequest::new(root.as_str())) {
            eprintln!("loadprof: {}", err);
            all_loaded = false;
        }
    }

    print_reports(&profiler, args.sort)?;
    Ok(all_loaded)
}

fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    if run(args)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
