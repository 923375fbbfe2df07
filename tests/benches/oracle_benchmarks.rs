//! # Beacon Oracle Benchmarks
//!
//! | Operation | Target |
//! |-----------|--------|
//! | Report submission, full frame of members | < 1ms per report |
//! | Member removal with eviction | < 1ms |
//! | Snapshot encode/decode | < 1ms at 256 members |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_18_beacon_oracle::{
    BeaconSpec, ConsensusEngine, MemberAddress, MembershipRegistry, OracleSnapshot, ReportData,
    MAX_MEMBERS,
};
use std::time::Duration;

const GENESIS: u64 = 1_000;
const NOW: u64 = GENESIS + 120;

fn spec() -> BeaconSpec {
    BeaconSpec {
        epochs_per_frame: 10,
        slots_per_epoch: 2,
        seconds_per_slot: 5,
        genesis_time: GENESIS,
    }
}

fn member(n: usize) -> MemberAddress {
    let mut bytes = [0u8; 20];
    bytes[18..].copy_from_slice(&(n as u16).to_be_bytes());
    MemberAddress::new(bytes)
}

/// Engine where no variant can reach `quorum` before every member reported
fn engine(members: usize, quorum: u32) -> ConsensusEngine {
    let mut registry = MembershipRegistry::new();
    for n in 0..members {
        registry.add(member(n)).expect("member fits");
    }
    registry.set_quorum(quorum).expect("non-zero quorum");
    ConsensusEngine::with_membership(spec(), registry, NOW).expect("valid spec")
}

/// Report variant for member `n`; members split over `variants` disagreeing values
fn report(n: usize, variants: usize) -> ReportData {
    ReportData::new(11, 32_000_000_000 + (n % variants) as u128, 1_000)
}

fn bench_submit_full_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-submit-report");
    group.measurement_time(Duration::from_secs(10));

    for members in [16, 64, MAX_MEMBERS] {
        group.throughput(Throughput::Elements(members as u64));
        group.bench_with_input(
            BenchmarkId::new("disagreeing_members", members),
            &members,
            |b, &members| {
                b.iter_batched(
                    || engine(members, members as u32),
                    |mut engine| {
                        for n in 0..members {
                            let status = engine.submit_report(member(n), report(n, 4), NOW);
                            black_box(status.is_ok());
                        }
                        engine
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_remove_member(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-remove-member");

    group.bench_function("evict_from_full_frame", |b| {
        b.iter_batched(
            || {
                let mut engine = engine(MAX_MEMBERS, MAX_MEMBERS as u32);
                for n in 0..MAX_MEMBERS - 1 {
                    let _ = engine.submit_report(member(n), report(n, 8), NOW);
                }
                engine
            },
            |mut engine| black_box(engine.remove_member(member(0), NOW).is_ok()),
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-snapshot");

    let mut engine = engine(MAX_MEMBERS, MAX_MEMBERS as u32);
    for n in 0..MAX_MEMBERS - 1 {
        let _ = engine.submit_report(member(n), report(n, 8), NOW);
    }
    let encoded = engine.snapshot().to_bytes().expect("encodable");

    group.bench_function("encode", |b| {
        b.iter(|| black_box(engine.snapshot().to_bytes().map(|bytes| bytes.len())))
    });
    group.bench_function("decode_and_restore", |b| {
        b.iter(|| {
            let snapshot = OracleSnapshot::from_bytes(&encoded).expect("decodable");
            black_box(ConsensusEngine::restore(snapshot).is_ok())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_submit_full_frame,
    bench_remove_member,
    bench_snapshot
);
criterion_main!(benches);
