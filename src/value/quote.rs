//! Quoting and escaping.
//!
//! A cell carries up to three quote levels inline, in the two-bit depth
//! field of its flag byte — no allocation, and the payload is untouched.
//! Past three levels the cell is rewritten to the escaped form: the value
//! moves into a one-cell singular array and the outer cell becomes an
//! `Escaped` wrapper holding the singular plus an explicit depth counter.
//!
//! The outer wrapper mirrors the wrapped value's binding only when the
//! wrapped kind is bindable; otherwise the outer binding is forced empty,
//! so "is this bindable" stays answerable at the outer cell without
//! chasing the singular.
//!
//! Quoting then unquoting by the same depth is value-preserving, binding
//! included, across the inline/escaped boundary in both directions.

use crate::pool::Pools;
use crate::series::{free_series, make_singular, singular_cell};
use crate::value::cell::{MAX_INLINE_QUOTE, QUOTE_MASK};
use crate::value::{Cell, Extra, Kind, Payload};

impl Cell {
    /// Inline quote depth (0..=3). Escaped cells keep their depth in the
    /// payload instead.
    #[inline]
    pub(crate) fn inline_quotes(&self) -> u8 {
        self.header.layer_byte() & QUOTE_MASK
    }

    #[inline]
    pub(crate) fn set_inline_quotes(&mut self, depth: u8) {
        debug_assert!(depth <= MAX_INLINE_QUOTE);
        let byte = self.header.layer_byte() & !QUOTE_MASK;
        self.header.set_layer_byte(byte | depth);
    }

    /// Total quote depth, whichever encoding is in use.
    #[inline]
    pub fn quote_depth(&self) -> u8 {
        match self.payload {
            Payload::Escaped { depth, .. } => depth,
            _ => self.inline_quotes(),
        }
    }

    /// True for any nonzero quoting, inline or escaped.
    #[inline]
    pub fn is_quoted(&self) -> bool {
        self.inline_quotes() != 0 || self.header.subclass() == Kind::Escaped.byte()
    }

    /// The kind underneath any quoting. Escaped cells consult their
    /// singular.
    pub fn unquoted_kind(&self, pools: &Pools) -> Kind {
        match self.payload {
            Payload::Escaped { singular, .. } => singular_cell(pools, singular).kind(),
            _ => self.kind(),
        }
    }
}

/// Add `depth` quote levels to the cell in place.
///
/// Stays inline while the total fits in two bits; otherwise the value is
/// boxed into a singular and the cell becomes the escaped wrapper. A cell
/// already escaped just has its counter raised.
pub fn quotify(pools: &mut Pools, cell: &mut Cell, depth: u8) {
    if depth == 0 {
        return;
    }
    if let Payload::Escaped {
        singular,
        depth: current,
    } = cell.payload
    {
        let total = current.checked_add(depth);
        crate::contract!(total.is_some(), "quote depth overflow");
        cell.payload = Payload::Escaped {
            singular,
            depth: total.unwrap_or(u8::MAX),
        };
        return;
    }

    let total = cell.inline_quotes() as u16 + depth as u16;
    if total <= MAX_INLINE_QUOTE as u16 {
        cell.set_inline_quotes(total as u8);
        return;
    }

    // Escape: move the value (depth bits cleared) into a singular and
    // rewrite this cell as the wrapper. Node flags describe the slot and
    // stay put.
    let mut inner = *cell;
    inner.set_inline_quotes(0);
    let extra = if inner.kind().is_bindable() {
        inner.extra
    } else {
        Extra::None
    };
    let singular = make_singular(pools, inner);

    let node_byte = cell.header.leading_byte();
    cell.header = crate::node::Header::cell(Kind::Escaped.byte());
    cell.header.0[0] = node_byte;
    cell.payload = Payload::Escaped {
        singular,
        depth: total as u8,
    };
    cell.extra = extra;
}

/// Remove `depth` quote levels. Removing past zero is a contract
/// violation. When an escaped cell drops back to three levels or fewer,
/// the singular's value is unwrapped into the cell and the singular's
/// storage is released.
pub fn unquotify(pools: &mut Pools, cell: &mut Cell, depth: u8) {
    if depth == 0 {
        return;
    }
    match cell.payload {
        Payload::Escaped { singular, depth: current } => {
            crate::contract!(
                depth <= current,
                "quote depth underflow: removing {} from {}",
                depth,
                current
            );
            let remaining = current.saturating_sub(depth);
            if remaining > MAX_INLINE_QUOTE {
                cell.payload = Payload::Escaped {
                    singular,
                    depth: remaining,
                };
            } else {
                let mut inner = singular_cell(pools, singular);
                free_series(pools, singular);
                inner.set_inline_quotes(remaining);
                inner.header.0[0] = cell.header.leading_byte();
                *cell = inner;
            }
        }
        _ => {
            let current = cell.inline_quotes();
            crate::contract!(
                depth <= current,
                "quote depth underflow: removing {} from {}",
                depth,
                current
            );
            cell.set_inline_quotes(current.saturating_sub(depth));
        }
    }
}
