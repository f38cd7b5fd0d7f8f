//! The cell representation: kinds, payloads, quoting, and typed accessors.

mod accessors;
mod cell;
mod kind;
mod payload;
mod quote;

pub use accessors::{
    action_body, action_paramlist, bitset_backing, bitset_set, bitset_test,
    context_append, context_get, context_len, context_set, context_varlist,
    handle_cleanup, handle_data, handle_stub, init_bitset, init_handle, init_map,
    make_action, make_context, map_find, map_hashlist, map_insert, map_len,
    map_pairlist, specifier_of,
};
pub use cell::{Cell, FALSEY, NEWLINE_BEFORE, PROTECTED, UNEVALUATED};
pub use kind::{Kind, KIND_LIMIT};
pub use payload::{DateBits, Extra, HandleCleanup, Payload};
pub use quote::{quotify, unquotify};
