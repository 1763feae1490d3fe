use criterion::{criterion_group, criterion_main, Bencher, BenchmarkId, Criterion, Throughput};
use itertools::Itertools;
use rand::Rng;

use redis_core_ds::IntSet;

const SIZES: [usize; 3] = [128, 4096, 65536];
const TOTAL_OPERATIONS: u64 = 1000;

fn random_values(n: usize) -> Vec<i64> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.gen_range(-1_000_000..1_000_000)).collect()
}

fn intset(c: &mut Criterion) {
    let mut group = c.benchmark_group("intset");
    group.throughput(Throughput::Elements(TOTAL_OPERATIONS));

    for &size in SIZES.iter() {
        group.bench_with_input(BenchmarkId::new("add", size), &size, |b, &size| {
            add(b, size)
        });
        group.bench_with_input(BenchmarkId::new("find", size), &size, |b, &size| {
            find(b, size)
        });
    }

    for input in SIZES.iter().cartesian_product(["small", "wide"].iter()) {
        let (&size, &kind) = input;
        group.bench_with_input(
            BenchmarkId::new("upgrade", format!("{}/{}", kind, size)),
            &size,
            |b, &size| upgrade(b, size, kind == "wide"),
        );
    }

    group.finish()
}

fn seeded(size: usize) -> IntSet {
    let mut set = IntSet::new();
    for v in random_values(size) {
        set.add(v);
    }
    set
}

fn add(b: &mut Bencher, size: usize) {
    let values = random_values(TOTAL_OPERATIONS as usize);
    b.iter(|| {
        let mut set = seeded(size);
        for v in values.iter() {
            set.add(*v);
        }
    });
}

fn find(b: &mut Bencher, size: usize) {
    let set = seeded(size);
    let values = random_values(TOTAL_OPERATIONS as usize);
    b.iter(|| {
        for v in values.iter() {
            let _ = set.find(*v);
        }
    });
}

fn upgrade(b: &mut Bencher, size: usize, wide: bool) {
    let base: Vec<i64> = (0..size as i64).collect();
    b.iter(|| {
        let mut set: IntSet = base.iter().copied().collect();
        if wide {
            set.add(50_000_000_000);
        } else {
            set.add(size as i64 + 1);
        }
    });
}

criterion_group!(benches, intset);
criterion_main!(benches);
