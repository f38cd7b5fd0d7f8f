// Series behavior through the public surface: arrays, binaries, GC sweep.

use quill::{
    alloc_pairing, array_cells, array_get, array_len, array_push, array_set,
    binary_bytes, binary_push, free_pairing, free_series, make_array, make_binary,
    make_singular, manage, mark, pairing_cells, singular_cell, sweep, Cell, Kind,
    MemConfig, Pools, Spelling,
};

fn pools() -> Pools {
    Pools::new(MemConfig::standard())
}

#[test]
fn test_array_accumulates_mixed_kinds() {
    let mut pools = pools();
    let arr = make_array(&mut pools, 4);
    array_push(&mut pools, arr, Cell::integer(1));
    array_push(&mut pools, arr, Cell::word(Kind::Word, Spelling(0)));
    array_push(&mut pools, arr, Cell::logic(false));
    assert_eq!(array_len(&pools, arr), 3);
    assert_eq!(array_get(&pools, arr, 1).kind(), Kind::Word);

    let cells = array_cells(&pools, arr);
    assert_eq!(cells.len(), 3);
    assert_eq!(cells[2], Cell::logic(false));
}

#[test]
fn test_array_set_overwrites_in_place() {
    let mut pools = pools();
    let arr = make_array(&mut pools, 2);
    array_push(&mut pools, arr, Cell::integer(1));
    array_set(&mut pools, arr, 0, Cell::integer(2));
    assert_eq!(array_get(&pools, arr, 0), Cell::integer(2));
}

#[test]
#[should_panic(expected = "out of bounds")]
fn test_array_bounds_checked() {
    let mut pools = pools();
    let arr = make_array(&mut pools, 2);
    array_push(&mut pools, arr, Cell::integer(1));
    let _ = array_get(&pools, arr, 1);
}

#[test]
fn test_binary_grows_past_size_classes() {
    let mut pools = pools();
    let bin = make_binary(&mut pools, 8);
    // Push well past the largest small class to exercise reallocation.
    for i in 0..10_000u32 {
        binary_push(&mut pools, bin, (i % 251) as u8);
    }
    let bytes = binary_bytes(&pools, bin);
    assert_eq!(bytes.len(), 10_000);
    assert_eq!(bytes[9_999], (9_999u32 % 251) as u8);
}

#[test]
fn test_singular_holds_one_cell() {
    let mut pools = pools();
    let node = make_singular(&mut pools, Cell::decimal(2.75));
    assert_eq!(singular_cell(&pools, node), Cell::decimal(2.75));
    free_series(&mut pools, node);
}

#[test]
fn test_freed_series_handle_goes_stale() {
    let mut pools = pools();
    let arr = make_array(&mut pools, 1);
    free_series(&mut pools, arr);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        array_len(&pools, arr)
    }));
    assert!(result.is_err(), "stale handle should not resolve");
}

#[test]
fn test_sweep_cycle() {
    let mut pools = pools();
    let stub_pool = pools.stub_pool();

    let reachable = make_array(&mut pools, 2);
    let garbage_a = make_array(&mut pools, 2);
    let garbage_b = make_singular(&mut pools, Cell::blank());
    for node in [reachable, garbage_a, garbage_b] {
        manage(&mut pools, node);
    }

    // Mark phase (the collector's walk, here by hand), then sweep.
    mark(&mut pools, reachable);
    let free_before = pools.units_free(stub_pool);
    let stats = sweep(&mut pools);
    assert_eq!(stats.freed, 2);
    assert_eq!(stats.kept, 1);
    assert!(pools.units_free(stub_pool) > free_before);
    assert_eq!(array_len(&pools, reachable), 0);
}

#[test]
fn test_pairing_roundtrip() {
    let mut pools = pools();
    let node = alloc_pairing(&mut pools, Cell::integer(10), Cell::integer(20));
    let (first, second) = pairing_cells(&pools, node);
    assert_eq!(first.as_integer(), Some(10));
    assert_eq!(second.as_integer(), Some(20));
    free_pairing(&mut pools, node);
}
