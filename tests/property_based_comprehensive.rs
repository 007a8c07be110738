//! Property-based tests for load accounting
//!
//! Random load trees with random per-unit work (and random failures) on a
//! manual clock:
//! 1. total cost = self cost + total cost of direct children
//! 2. self costs of all events sum to the top-level totals
//! 3. depth returns to zero, whatever failed
//! 4. the optimization view is a sorted permutation of the log

mod utils;

use loadprof::clock::Clock;
use loadprof::{LoadHost, LoadRequest, ProfilerConfig};
use proptest::prelude::*;
use std::time::Duration;
use utils::Harness;

/// Unit `u{i}` may only require units with a larger index, so every tree is
/// acyclic and the requires are honoured on first load.
fn manifest_strategy() -> impl Strategy<Value = String> {
    (2usize..8)
        .prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec((0u64..50, prop::collection::vec(any::<bool>(), n), any::<bool>()), n),
            )
        })
        .prop_map(|(n, units)| {
            let mut toml = String::new();
            for (i, (work_ms, edges, loads)) in units.into_iter().enumerate() {
                let children: Vec<String> = (i + 1..n)
                    .filter(|j| edges[*j])
                    .map(|j| format!("\"u{}\"", j))
                    .collect();
                let key = if loads { "loads" } else { "requires" };
                toml.push_str(&format!(
                    "[units.u{}]\n{} = [{}]\nwork_ms = {}\n\n",
                    i,
                    key,
                    children.join(", "),
                    work_ms
                ));
            }
            toml
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_total_is_self_plus_children(manifest in manifest_strategy()) {
        let h = Harness::new(ProfilerConfig::default());
        let loader = h.loader(&manifest);

        loader.require(&LoadRequest::new("u0")).unwrap();

        let log = h.profiler.timing_log();
        // Post-order: an event's direct children are the preceding events one
        // level deeper, back to the previous event at its own depth or above.
        for (i, event) in log.iter().enumerate() {
            let mut children_total = Duration::ZERO;
            for earlier in log[..i].iter().rev() {
                if earlier.depth() <= event.depth() {
                    break;
                }
                if earlier.depth() == event.depth() + 1 {
                    children_total += earlier.total_cost;
                }
            }
            prop_assert_eq!(event.total_cost, event.self_cost + children_total);
        }

        let self_sum: Duration = log.iter().map(|e| e.self_cost).sum();
        let top_total: Duration = log.iter().filter(|e| e.depth() == 0).map(|e| e.total_cost).sum();
        prop_assert_eq!(self_sum, top_total);
        prop_assert_eq!(top_total, h.clock.now());
    }

    #[test]
    fn prop_depth_recovers_after_failures(manifest in manifest_strategy(), failing in 0usize..8) {
        let manifest = manifest.replace(
            &format!("[units.u{}]\n", failing),
            &format!("[units.u{}]\nfail = \"boom\"\n", failing),
        );
        let h = Harness::new(ProfilerConfig::default().with_profile_memory(true));
        let loader = h.loader(&manifest);

        let _ = loader.require(&LoadRequest::new("u0"));
        prop_assert_eq!(h.profiler.depth(), 0);

        // Memory log always mirrors the timing log
        prop_assert_eq!(h.profiler.memory_log().len(), h.profiler.timing_log().len());
        for (t, m) in h.profiler.timing_log().iter().zip(h.profiler.memory_log().iter()) {
            prop_assert_eq!(&t.request, &m.request);
            prop_assert_eq!(&t.indent, &m.indent);
        }
        let failed = format!("u{}", failing);
        prop_assert!(h.profiler.timing_log().iter().all(|e| e.request.unit != failed));
    }

    #[test]
    fn prop_optimization_view_is_sorted_permutation(manifest in manifest_strategy()) {
        let h = Harness::new(ProfilerConfig::default());
        let loader = h.loader(&manifest);
        loader.require(&LoadRequest::new("u0")).unwrap();

        h.profiler.print_timing_info_for_optimization().unwrap();
        let lines = h.output.lines();
        prop_assert_eq!(lines.len(), h.profiler.timing_log().len());

        let costs: Vec<f64> = lines
            .iter()
            .map(|l| l.split(' ').next().unwrap().parse().unwrap())
            .collect();
        prop_assert!(costs.windows(2).all(|w| w[0] <= w[1]));
    }
}
