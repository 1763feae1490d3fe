use std::collections::HashSet;

use redis_core_ds::Dict;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn rehash_correctness_across_a_full_table_size_of_steps() {
    init();
    let mut d: Dict<i64, i64> = Dict::new();
    for i in 0..99 {
        d.add(i, i * 2).unwrap();
    }
    d.expand(1024).unwrap();
    assert!(d.is_rehashing());

    let table0_size = d.capacity();
    for _ in 0..table0_size {
        d.rehash(1);
    }
    assert!(!d.is_rehashing());

    for i in 0..99 {
        assert_eq!(d.find(&i), Some(&(i * 2)));
    }
}

#[test]
fn incremental_correctness_under_interleaved_find_add_delete() {
    let mut d: Dict<i64, i64> = Dict::new();
    for i in 0..150 {
        d.add(i, i).unwrap();
    }
    d.expand(2048).unwrap();
    assert!(d.is_rehashing());

    // `find`, `remove`, and `add` each advance the rehash by one step per
    // spec.md §4.3.3, so this loop needs no extra explicit `d.rehash(..)`
    // call to drain the table — the three ops' own opportunistic stepping
    // is what the spec's interleaving scenario actually exercises.
    while d.is_rehashing() {
        assert_eq!(d.find(&10), Some(&10));
        d.remove(&20);
        d.add(9999, 9999).unwrap();
    }

    assert_eq!(d.find(&20), None);
    assert_eq!(d.find(&9999), Some(&9999));
    for i in 0..150 {
        if i != 20 {
            assert_eq!(d.find(&i), Some(&i));
        }
    }
}

#[test]
fn scan_completeness_under_growth_with_interleaved_rehash() {
    let mut d: Dict<i64, i64> = Dict::new();
    for i in 0..999 {
        d.add(i, i).unwrap();
    }
    d.expand(4096).unwrap();

    let mut seen: HashSet<i64> = HashSet::new();
    let mut cursor = 0u64;
    loop {
        cursor = d.scan(cursor, |k, _| {
            seen.insert(*k);
        });
        d.rehash(16);
        if cursor == 0 {
            break;
        }
    }
    while d.rehash(16) {}

    for i in 0..999 {
        assert!(seen.contains(&i), "scan missed key {i}");
    }
}
