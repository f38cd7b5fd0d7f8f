// Hook table dispatch through the public surface.

use std::cmp::Ordering;

use quill::{Cell, CoreError, HookKind, HookTable, Kind, MemConfig, Pools, SpellingTable};

fn pools() -> Pools {
    Pools::new(MemConfig::standard())
}

#[test]
fn test_lookup_is_total_over_kinds() {
    let table = HookTable::standard();
    for byte in 1..quill::value::KIND_LIMIT as u8 {
        let kind = Kind::from_byte(byte).unwrap();
        let _row = table.row(kind);
    }
}

#[test]
fn test_stub_slots_report_no_such_operation() {
    let table = HookTable::standard();
    let pools = pools();
    let spellings = SpellingTable::new();
    let mut out = String::new();

    // Bitset has no mold hook installed; the stub reports instead of
    // crashing through a null slot.
    let mut p2 = Pools::new(MemConfig::standard());
    let bitset = quill::value::init_bitset(&mut p2, 8);
    let err = (table.row(Kind::Bitset).mold)(&pools, &bitset, &spellings, &mut out);
    assert_eq!(
        err,
        Err(CoreError::NoSuchOperation {
            kind: Kind::Bitset,
            op: HookKind::Mold
        })
    );
}

#[test]
fn test_compare_dispatch_per_kind() {
    let table = HookTable::standard();
    let compare = table.row(Kind::Time).compare;
    assert_eq!(
        compare(&Cell::time(100), &Cell::time(200)),
        Ok(Ordering::Less)
    );

    let compare = table.row(Kind::Char).compare;
    assert_eq!(
        compare(&Cell::character('a'), &Cell::character('a')),
        Ok(Ordering::Equal)
    );
}

#[test]
fn test_make_dispatch() {
    let table = HookTable::standard();
    let mut pools = pools();
    let made = (table.row(Kind::Logic).make)(&mut pools, Kind::Logic, &Cell::blank());
    assert_eq!(made, Ok(Cell::logic(false)));
}

#[test]
fn test_mold_composes_source_text() {
    let table = HookTable::standard();
    let pools = pools();
    let mut spellings = SpellingTable::new();
    let x = spellings.intern("x");

    let mut out = String::new();
    (table.row(Kind::SetWord).mold)(
        &pools,
        &Cell::word(Kind::SetWord, x),
        &spellings,
        &mut out,
    )
    .unwrap();
    out.push(' ');
    (table.row(Kind::Integer).mold)(&pools, &Cell::integer(10), &spellings, &mut out).unwrap();
    assert_eq!(out, "x: 10");
}
