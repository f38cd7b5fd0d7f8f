// Shared proptest strategies for cell generation.

use proptest::prelude::*;
use quill::{Binding, Cell, DateBits, Kind, NodeRef, PoolId, Spelling};

/// Any scalar or word cell — no pool-backed storage, so strategies stay
/// independent of allocator state. Decimals exclude NaN (NaN breaks value
/// equality, which these properties are about).
pub fn scalar_cell() -> impl Strategy<Value = Cell> {
    prop_oneof![
        Just(Cell::blank()),
        any::<bool>().prop_map(Cell::logic),
        any::<i64>().prop_map(Cell::integer),
        any::<f64>()
            .prop_filter("NaN has no value identity", |f| !f.is_nan())
            .prop_map(Cell::decimal),
        any::<char>().prop_map(Cell::character),
        any::<i64>().prop_map(Cell::time),
        date_cell(),
        word_cell(),
    ]
}

pub fn date_cell() -> impl Strategy<Value = Cell> {
    (1u16..=9999, 1u8..=12, 1u8..=28, -48i8..=48, proptest::option::of(0i64..86_400_000_000_000))
        .prop_map(|(year, month, day, zone, nanos)| {
            Cell::date(DateBits::new(year, month, day, zone), nanos)
        })
}

/// Word cells, some carrying a context binding — bindings must survive
/// quoting round-trips, so the strategies produce them.
pub fn word_cell() -> impl Strategy<Value = Cell> {
    let kinds = prop_oneof![
        Just(Kind::Word),
        Just(Kind::SetWord),
        Just(Kind::GetWord),
        Just(Kind::Issue),
    ];
    (kinds, 0u32..10_000, proptest::option::of((0u32..64, 0u32..16))).prop_map(
        |(kind, spelling, binding)| {
            let mut cell = Cell::word(kind, Spelling(spelling));
            if let Some((unit, index)) = binding {
                cell.set_binding(Binding::Context {
                    varlist: NodeRef {
                        pool: PoolId(0),
                        unit,
                        generation: 0,
                    },
                    index,
                });
            }
            cell
        },
    )
}
