//! Typed errors for the memory substrate.
//!
//! Everything recoverable at this layer is represented as a `CoreError`
//! variant rather than a bare string. Allocation exhaustion is deliberately
//! *not* here: it is fatal (see [`out_of_memory`]) and never surfaces as a
//! return value, keeping the hot allocation path free of error plumbing.

use std::error::Error as StdError;
use std::fmt;

use crate::hooks::HookKind;
use crate::value::Kind;

/// Errors reportable by cell accessors and hook dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A type-hook slot had no implementation for this kind.
    NoSuchOperation { kind: Kind, op: HookKind },

    /// A typed accessor was applied to a cell of the wrong kind.
    TypeMismatch { expected: &'static str, got: Kind },

    /// Unquote requested more levels than the cell carries.
    QuoteUnderflow { depth: u8, requested: u8 },

    /// A node handle outlived the node it referred to.
    StaleNodeRef { pool: u8, unit: u32 },

    /// Series index past the live length.
    IndexOutOfBounds { index: usize, len: usize },

    /// A requested allocation size does not fit the addressable range.
    SizeOverflow { bytes: usize },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::NoSuchOperation { kind, op } => {
                write!(f, "no {} operation for {} values", op, kind.name())
            }
            CoreError::TypeMismatch { expected, got } => {
                write!(f, "expected {}, got {}", expected, got.name())
            }
            CoreError::QuoteUnderflow { depth, requested } => {
                write!(
                    f,
                    "cannot remove {} quote levels from a depth-{} value",
                    requested, depth
                )
            }
            CoreError::StaleNodeRef { pool, unit } => {
                write!(f, "stale node reference (pool {}, unit {})", pool, unit)
            }
            CoreError::IndexOutOfBounds { index, len } => {
                write!(f, "index {} out of bounds (length {})", index, len)
            }
            CoreError::SizeOverflow { bytes } => {
                write!(f, "allocation of {} bytes exceeds addressable size", bytes)
            }
        }
    }
}

impl StdError for CoreError {}

/// Fatal out-of-memory path.
///
/// Segment allocation failure and size-arithmetic overflow funnel here.
/// There is no per-call recovery: the panic unwinds out of the current
/// evaluation, and the host decides whether to catch it at its own
/// boundary. Callers inside this crate never wrap it in a `Result`.
#[cold]
pub fn out_of_memory(bytes: usize) -> ! {
    panic!("out of memory: failed to allocate {} bytes", bytes);
}
