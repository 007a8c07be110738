/// Interception overhead benchmarks
///
/// Measures what a profiled load costs on top of the loader itself, with and
/// without memory sampling, for flat and nested load trees.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use loadprof::{DirectLoader, LoadHost, LoadRequest, Manifest, ManifestLoader, ProfiledLoader, Profiler, ProfilerConfig};
use std::rc::Rc;
use std::time::Duration;

fn no_work(_: Duration) {}

/// `depth` units chained by `loads`, so every iteration re-executes them all
fn chain_manifest(depth: usize) -> Manifest {
    let mut toml = String::new();
    for i in 0..depth {
        toml.push_str(&format!("[units.u{}]\n", i));
        if i + 1 < depth {
            toml.push_str(&format!("loads = [\"u{}\"]\n", i + 1));
        }
    }
    Manifest::from_toml_str(&toml).expect("valid manifest")
}

fn quiet_profiler(config: ProfilerConfig) -> Rc<Profiler> {
    Rc::new(
        Profiler::builder(config)
            .diagnostics(std::io::sink())
            .build(),
    )
}

fn bench_load_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_chain");
    let request = LoadRequest::new("u0");

    for depth in [1usize, 8, 32] {
        group.bench_with_input(BenchmarkId::new("direct", depth), &depth, |b, &depth| {
            let host = DirectLoader::new(ManifestLoader::with_work(chain_manifest(depth), no_work));
            b.iter(|| black_box(host.load(&request)))
        });

        group.bench_with_input(BenchmarkId::new("profiled", depth), &depth, |b, &depth| {
            let host = ProfiledLoader::new(
                ManifestLoader::with_work(chain_manifest(depth), no_work),
                quiet_profiler(ProfilerConfig::default()),
            );
            b.iter(|| black_box(host.load(&request)))
        });

        group.bench_with_input(
            BenchmarkId::new("profiled_memory", depth),
            &depth,
            |b, &depth| {
                let host = ProfiledLoader::new(
                    ManifestLoader::with_work(chain_manifest(depth), no_work),
                    quiet_profiler(ProfilerConfig::default().with_profile_memory(true)),
                );
                b.iter(|| black_box(host.load(&request)))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_load_chain);
criterion_main!(benches);
