//! The cell: one fixed-size value slot.
//!
//! Cells are never heap-allocated on their own. They live inside array
//! content, context varlists, pairings, and stack frames, formatted in
//! place; their lifetime is their container's. Every cell is `Copy`, and
//! the whole struct is plain old data so it can sit in pooled memory.
//!
//! Header layout (see [`crate::node`] for byte 0):
//!
//! ```text
//! byte 0: node flags (NODE|CELL plus MANAGED/ROOT/STACK as applicable)
//! byte 1: kind byte
//! byte 2: cell flags — FALSEY PROTECTED UNEVALUATED NEWLINE  .. qq
//!         (low two bits: inline quote depth)
//! byte 3: kind-specific flags
//! ```

use std::mem::{align_of, size_of};

use crate::node::Header;
use crate::value::{Extra, Kind, Payload};

/// Cell flag bits, in header byte 2.
pub const FALSEY: u8 = 0x80;
pub const PROTECTED: u8 = 0x40;
pub const UNEVALUATED: u8 = 0x20;
pub const NEWLINE_BEFORE: u8 = 0x10;

/// Inline quote depth: two bits, so at most 3 before the escaped fallback.
pub(crate) const QUOTE_MASK: u8 = 0x03;
pub(crate) const MAX_INLINE_QUOTE: u8 = 3;

/// A single runtime value.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Cell {
    pub(crate) header: Header,
    pub(crate) payload: Payload,
    pub(crate) extra: Extra,
}

const _: () = {
    assert!(size_of::<Cell>() % 8 == 0);
    assert!(align_of::<Cell>() == 8);
};

impl Cell {
    /// A formatted cell of the given kind with payload still unset.
    /// Accessors reject it until an init writes the payload.
    #[inline]
    pub(crate) fn formatted(kind: Kind) -> Cell {
        Cell {
            header: Header::cell(kind.byte()),
            payload: Payload::Corrupt,
            extra: Extra::None,
        }
    }

    /// The end-of-array signal: a header-only pattern, distinguishable
    /// from every live cell by its zero subclass byte. Array content uses
    /// it to terminate cell runs without spending a full formatted cell.
    #[inline]
    pub fn end_signal() -> Cell {
        Cell {
            header: Header::end_signal(),
            payload: Payload::Blank,
            extra: Extra::None,
        }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.header.is_end_signal()
    }

    /// Overwrite the header and kind, clearing stale flags and quoting.
    /// The payload and extra are left for the caller's init to fill.
    ///
    /// The slot must already be a formatted cell (the CELL header bit was
    /// set when its container was created); resetting arbitrary memory is
    /// a contract violation.
    pub fn reset(&mut self, kind: Kind) {
        crate::contract!(
            self.header.is_node() && self.header.is_cell_shaped(),
            "reset of a non-cell slot"
        );
        // Node flags (ROOT, MANAGED, STACK) describe the slot, not the
        // value; they survive the reset.
        let node_byte = self.header.leading_byte();
        self.header = Header::cell(kind.byte());
        self.header.0[0] = node_byte;
        self.payload = Payload::Corrupt;
        self.extra = Extra::None;
    }

    /// The cell's kind. Not meaningful for the end signal.
    #[inline]
    pub fn kind(&self) -> Kind {
        crate::contract!(!self.is_end(), "kind of an end signal");
        match Kind::from_byte(self.header.subclass()) {
            Some(kind) => kind,
            None => unreachable!("cell carries invalid kind byte"),
        }
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    #[inline]
    pub fn blank() -> Cell {
        let mut cell = Cell::formatted(Kind::Blank);
        cell.payload = Payload::Blank;
        cell.set_cell_flag(FALSEY);
        cell
    }

    #[inline]
    pub fn logic(value: bool) -> Cell {
        let mut cell = Cell::formatted(Kind::Logic);
        cell.payload = Payload::Logic(value);
        if !value {
            cell.set_cell_flag(FALSEY);
        }
        cell
    }

    #[inline]
    pub fn integer(value: i64) -> Cell {
        let mut cell = Cell::formatted(Kind::Integer);
        cell.payload = Payload::Integer(value);
        cell
    }

    #[inline]
    pub fn decimal(value: f64) -> Cell {
        let mut cell = Cell::formatted(Kind::Decimal);
        cell.payload = Payload::Decimal(value);
        cell
    }

    #[inline]
    pub fn character(value: char) -> Cell {
        let mut cell = Cell::formatted(Kind::Char);
        cell.payload = Payload::Char(value);
        cell
    }

    /// A word-class cell. Unbound until a binder fills the extra slot.
    #[inline]
    pub fn word(kind: Kind, spelling: crate::intern::Spelling) -> Cell {
        crate::contract!(kind.is_word_kind(), "word cell of kind {:?}", kind);
        let mut cell = Cell::formatted(kind);
        cell.payload = Payload::Word { spelling };
        cell
    }

    /// A series-backed cell (array, string, or binary kinds) positioned
    /// at `index`.
    #[inline]
    pub fn series(kind: Kind, stub: crate::pool::NodeRef, index: u32) -> Cell {
        crate::contract!(kind.is_series_kind(), "series cell of kind {:?}", kind);
        let mut cell = Cell::formatted(kind);
        cell.payload = Payload::Series { stub, index };
        cell
    }

    // =========================================================================
    // Flags
    // =========================================================================

    #[inline]
    pub(crate) fn get_cell_flag(&self, flag: u8) -> bool {
        self.header.layer_byte() & flag != 0
    }

    #[inline]
    pub(crate) fn set_cell_flag(&mut self, flag: u8) {
        let byte = self.header.layer_byte();
        self.header.set_layer_byte(byte | flag);
    }

    #[inline]
    pub(crate) fn clear_cell_flag(&mut self, flag: u8) {
        let byte = self.header.layer_byte();
        self.header.set_layer_byte(byte & !flag);
    }

    /// Branch-free truthiness: everything is truthy except cells carrying
    /// the FALSEY flag (false and blank).
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !self.get_cell_flag(FALSEY)
    }

    #[inline]
    pub fn is_protected(&self) -> bool {
        self.get_cell_flag(PROTECTED)
    }

    #[inline]
    pub fn protect(&mut self) {
        self.set_cell_flag(PROTECTED);
    }

    #[inline]
    pub fn unprotect(&mut self) {
        self.clear_cell_flag(PROTECTED);
    }

    /// Marks a value that should not be evaluated again (quoted output).
    #[inline]
    pub fn is_unevaluated(&self) -> bool {
        self.get_cell_flag(UNEVALUATED)
    }

    #[inline]
    pub fn set_unevaluated(&mut self) {
        self.set_cell_flag(UNEVALUATED);
    }

    /// Source formatting: a newline preceded this value in its array.
    #[inline]
    pub fn has_newline_before(&self) -> bool {
        self.get_cell_flag(NEWLINE_BEFORE)
    }

    #[inline]
    pub fn set_newline_before(&mut self) {
        self.set_cell_flag(NEWLINE_BEFORE);
    }
}

/// Equality is value equality: kind, quote depth, payload, and binding.
/// Formatting flags (newline, protection) do not participate.
impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.header.subclass() == other.header.subclass()
            && self.header.layer_byte() & QUOTE_MASK == other.header.layer_byte() & QUOTE_MASK
            && self.payload == other.payload
            && self.extra == other.extra
    }
}
