// Cell-level behavior: kinds, flags, accessors, equality.

use quill::value::{
    bitset_set, bitset_test, handle_data, init_bitset, init_handle, init_map, map_find,
    map_hashlist, map_insert, map_len, map_pairlist,
};
use quill::{Cell, DateBits, Kind, MemConfig, Pools, Spelling};

fn pools() -> Pools {
    Pools::new(MemConfig::standard())
}

#[test]
fn test_scalar_cells_roundtrip() {
    assert_eq!(Cell::integer(i64::MIN).as_integer(), Some(i64::MIN));
    assert_eq!(Cell::decimal(f64::MAX).as_decimal(), Some(f64::MAX));
    assert_eq!(Cell::character('本').as_char(), Some('本'));
    assert_eq!(Cell::logic(true).as_logic(), Some(true));
    assert_eq!(Cell::time(86_400_000_000_000).time_nanos(), Some(86_400_000_000_000));
}

#[test]
fn test_kind_category_predicates() {
    assert!(Kind::Integer.is_inert());
    assert!(Kind::Map.is_inert());
    assert!(Kind::SetWord.is_word_kind());
    assert!(Kind::Group.is_array_kind());
    assert!(Kind::Tag.is_string_kind());
    assert!(Kind::Binary.is_series_kind());
    assert!(Kind::Frame.is_context_kind());
    assert!(Kind::Path.is_bindable());
    assert!(!Kind::Decimal.is_bindable());
    assert!(!Kind::Escaped.is_bindable());
}

#[test]
fn test_date_cell() {
    let bits = DateBits::new(2026, 8, 6, 8);
    let date = Cell::date(bits, None);
    assert_eq!(date.kind(), Kind::Date);
    let bits = date.date_bits().unwrap();
    assert_eq!((bits.year(), bits.month(), bits.day()), (2026, 8, 6));
    assert_eq!(bits.zone_minutes(), 120);
}

#[test]
fn test_word_cells_compare_by_spelling() {
    let a = Cell::word(Kind::Word, Spelling(3));
    let b = Cell::word(Kind::Word, Spelling(3));
    let c = Cell::word(Kind::Word, Spelling(4));
    let d = Cell::word(Kind::SetWord, Spelling(3));
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d); // kind participates in equality
}

#[test]
fn test_protected_flag_survives_copies() {
    let mut cell = Cell::integer(1);
    cell.protect();
    let copy = cell;
    assert!(copy.is_protected());
    let mut copy = copy;
    copy.unprotect();
    assert!(!copy.is_protected());
    assert!(cell.is_protected());
}

#[test]
fn test_bitset_cell_end_to_end() {
    let mut pools = pools();
    let set = init_bitset(&mut pools, 128);
    for bit in [0u32, 7, 63, 64, 127] {
        bitset_set(&mut pools, &set, bit, true).unwrap();
    }
    assert!(bitset_test(&pools, &set, 63).unwrap());
    assert!(!bitset_test(&pools, &set, 62).unwrap());
}

#[test]
fn test_handle_cell_end_to_end() {
    let mut pools = pools();
    let handle = init_handle(&mut pools, 0xCAFE, 32, None);
    assert_eq!(handle.kind(), Kind::Handle);
    assert_eq!(handle_data(&pools, &handle).unwrap(), (0xCAFE, 32));
    // Wrong-kind access reports, not panics.
    assert!(handle_data(&pools, &Cell::integer(1)).is_err());
}

#[test]
fn test_map_cell_end_to_end() {
    let mut pools = pools();
    let map = init_map(&mut pools, 8);
    assert_eq!(map.kind(), Kind::Map);
    assert!(map_pairlist(&map).is_some());
    assert!(map_hashlist(&pools, &map).is_some());

    let key = Cell::word(Kind::Word, Spelling(1));
    map_insert(&mut pools, &map, key, Cell::integer(99)).unwrap();
    assert_eq!(map_len(&pools, &map), 1);
    assert_eq!(map_find(&pools, &map, &key).unwrap(), Some(Cell::integer(99)));
}
