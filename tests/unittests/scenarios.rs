// End-to-end scenarios across the allocator, cells, and quoting.

use quill::{
    classify_slice, quotify, unquotify, Cell, Kind, MemConfig, PointerClass, PoolId,
    PoolSpec, Pools,
};

/// A minimal pool table and five allocations: the first segment holds
/// four units, so the fifth allocation grows the pool by exactly one more
/// segment. Every pointer is distinct and 8-aligned, and growth does not
/// move previously issued units.
#[test]
fn scenario_pool_growth() {
    let mut pools = Pools::new(MemConfig {
        specs: vec![PoolSpec::new(16, 4)],
        ballast: 4 * 1024 * 1024,
    });
    let id = PoolId(0);

    let mut nodes = Vec::new();
    let mut addrs = Vec::new();
    for i in 0..5 {
        let node = pools.alloc(id);
        addrs.push(pools.unit_addr(node));
        nodes.push(node);
        let expected_segments = if i < 4 { 1 } else { 2 };
        assert_eq!(pools.segment_count(id), expected_segments);
    }

    for (i, addr) in addrs.iter().enumerate() {
        assert_eq!(addr % 8, 0, "node {} misaligned", i);
        for other in &addrs[i + 1..] {
            assert_ne!(addr, other, "duplicate live address");
        }
    }

    // Earlier units still resolve to the same addresses after growth.
    for (node, addr) in nodes.iter().zip(&addrs) {
        assert_eq!(pools.unit_addr(*node), *addr);
    }
}

/// An integer quoted twice stays inline: same kind underneath, payload
/// intact, and unquoting recovers the original.
#[test]
fn scenario_shallow_quote() {
    let mut pools = Pools::new(MemConfig::standard());
    let mut value = Cell::integer(42);

    quotify(&mut pools, &mut value, 2);
    assert!(value.is_quoted());
    assert_eq!(value.quote_depth(), 2);
    assert_eq!(value.kind(), Kind::Integer);

    unquotify(&mut pools, &mut value, 2);
    assert!(!value.is_quoted());
    assert_eq!(value.kind(), Kind::Integer);
    assert_eq!(value.as_integer(), Some(42));
}

/// Depth five cannot be represented inline: the cell switches to the
/// escaped form backed by a singular array, and unquoting all the way
/// releases that storage.
#[test]
fn scenario_deep_quote_releases_storage() {
    let mut pools = Pools::new(MemConfig::standard());

    // Warm the stub pool so segment growth doesn't skew the counters.
    let warm = quill::make_singular(&mut pools, Cell::blank());
    quill::free_series(&mut pools, warm);
    let stub_free = pools.units_free(pools.stub_pool());

    let original = Cell::integer(7);
    let mut value = original;
    quotify(&mut pools, &mut value, 5);

    assert_eq!(value.kind(), Kind::Escaped);
    assert_eq!(value.quote_depth(), 5);
    assert_eq!(value.unquoted_kind(&pools), Kind::Integer);
    assert!(pools.units_free(pools.stub_pool()) < stub_free);

    unquotify(&mut pools, &mut value, 5);
    assert_eq!(value, original);
    assert_eq!(pools.units_free(pools.stub_pool()), stub_free);
}

/// The classifier distinguishes text from node memory without any side
/// channel: plain strings classify as text, and the end signal written
/// into array content classifies as the end marker.
#[test]
fn scenario_classification_end_to_end() {
    assert_eq!(classify_slice("sample text".as_bytes()), PointerClass::Utf8);
    assert_eq!(classify_slice("émigré".as_bytes()), PointerClass::Utf8);

    let end = Cell::end_signal();
    assert!(end.is_end());
}
