use redis_core_ds::intset::Encoding;
use redis_core_ds::IntSet;

#[test]
fn upgrade_sequence_widens_encoding_and_keeps_members_sorted() {
    let mut set = IntSet::new();
    set.add(1);
    set.add(7);
    set.add(42);
    assert_eq!(set.encoding(), Encoding::I16);

    set.add(70_000);
    assert_eq!(set.encoding(), Encoding::I32);

    set.add(-5_000_000_000);
    assert_eq!(set.encoding(), Encoding::I64);

    let members: Vec<i64> = set.iter().collect();
    assert_eq!(members, vec![-5_000_000_000, 1, 7, 42, 70_000]);
    for v in &members {
        assert!(set.find(*v));
    }
}
