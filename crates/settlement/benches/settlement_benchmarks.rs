use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use splitledger_core::{Money, UserId};
use splitledger_settlement::{NetBalances, SettlementMode, SettlementPlanner};

/// Deterministic zero-sum balances with plenty of small zero groups.
fn balances(n: usize) -> NetBalances {
    let mut cents: Vec<i64> = (0..n - 1)
        .map(|i| ((i as i64 * 7919) % 23 - 11) * 100)
        .collect();
    let closing: i64 = -cents.iter().sum::<i64>();
    cents.push(closing);

    NetBalances::new(
        cents
            .into_iter()
            .enumerate()
            .map(|(i, c)| (UserId::from_u128(i as u128 + 1), Money::from_cents(c))),
    )
    .unwrap()
}

fn bench_modes(c: &mut Criterion) {
    let planner = SettlementPlanner::default();
    let mut group = c.benchmark_group("settlement_plan");

    for n in [4usize, 8, 12] {
        let snapshot = balances(n);
        for mode in [SettlementMode::Greedy, SettlementMode::Backtracking, SettlementMode::Exact] {
            group.bench_with_input(BenchmarkId::new(mode.as_str(), n), &snapshot, |b, s| {
                b.iter(|| planner.settlement_plan(black_box(s), mode))
            });
        }
    }

    group.finish();
}

fn bench_exact_scaling(c: &mut Criterion) {
    let planner = SettlementPlanner::default();
    let mut group = c.benchmark_group("exact_minimum");
    group.sample_size(10);

    for n in [10usize, 13, 16] {
        let snapshot = balances(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &snapshot, |b, s| {
            b.iter(|| planner.optimal_minimum_settlements(black_box(s)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_modes, bench_exact_scaling);
criterion_main!(benches);
