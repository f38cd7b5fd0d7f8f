//! # Quill core — value cells and pooled memory
//!
//! This crate is the value representation and memory substrate of the
//! Quill runtime: the fixed-size tagged cell that represents every
//! datatype, and the segmented pool allocator that backs every heap
//! object (series, contexts, maps) the cells point at. The evaluator,
//! reader, and host live in other crates and consume this one.
//!
//! ## Quick Start
//!
//! ```
//! use quill::{quotify, unquotify, Cell, MemConfig, Pools};
//!
//! let mut pools = Pools::new(MemConfig::standard());
//! let mut value = Cell::integer(42);
//!
//! quotify(&mut pools, &mut value, 2);
//! assert!(value.is_quoted());
//!
//! unquotify(&mut pools, &mut value, 2);
//! assert_eq!(value.as_integer(), Some(42));
//! ```
//!
//! ## Architecture
//!
//! - **Pools** ([`pool`]) — size-classed segment allocator handing out
//!   fixed-width units behind generation-checked handles.
//! - **Nodes** ([`node`]) — the packed header word every heap unit leads
//!   with; its byte scheme keeps node memory distinguishable from UTF-8.
//! - **Classifier** ([`classify`]) — tells text, live nodes, freed nodes,
//!   and end signals apart from two leading bytes.
//! - **Cells** ([`value`]) — the `Copy`, pool-formattable value struct:
//!   kind byte, flags, payload sum, binding extra, and the two-tier
//!   quoting encoding.
//! - **Series** ([`series`]) — stubs for arrays, strings, and the
//!   auxiliary storage behind bitsets, handles, and maps.
//! - **Hooks** ([`hooks`]) — the per-kind dispatch rows the evaluator
//!   calls through.
//!
//! Everything here is single-threaded by design: one evaluation context
//! owns the pools, and the collector runs only at safe points.

pub mod bind;
pub mod classify;
pub mod config;
pub mod error;
pub mod hooks;
pub mod intern;
pub mod node;
pub mod pool;
pub mod series;
pub mod value;

pub use bind::{derelativize, Binding, RelativeCell, Specifier};
pub use classify::{classify, classify_slice, verify_byte_invariants, PointerClass};
pub use config::MemConfig;
pub use error::CoreError;
pub use hooks::{HookKind, HookRow, HookTable};
pub use intern::{Spelling, SpellingTable};
pub use node::Lease;
pub use pool::{DataRef, NodeRef, PoolId, PoolSpec, Pools, UnitClass};
pub use series::{
    alloc_pairing, array_cells, array_get, array_get_relative, array_len, array_push,
    array_set, binary_bytes, binary_len, binary_push, free_pairing, free_series,
    make_array, make_binary, make_singular, manage, mark, pairing_cells, singular_cell,
    sweep, SweepStats,
};
pub use value::{quotify, unquotify, Cell, DateBits, Extra, Kind, Payload};

/// Contract checks: on in debug builds and under the `strict-checks`
/// feature, compiled out otherwise. Violations are programmer errors, not
/// recoverable conditions.
macro_rules! contract {
    ($cond:expr $(, $($arg:tt)+)?) => {
        if cfg!(any(debug_assertions, feature = "strict-checks")) {
            assert!($cond $(, $($arg)+)?);
        }
    };
}
pub(crate) use contract;
