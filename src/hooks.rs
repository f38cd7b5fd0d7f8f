//! The type-hook dispatch table.
//!
//! Six function-pointer slots per kind: generic verb, compare, path
//! picking, make, to-conversion, and mold. The table is built once at
//! startup; every slot is callable — kinds without an implementation get a
//! stub that reports [`CoreError::NoSuchOperation`], never a null that
//! call sites would have to test for.
//!
//! The evaluator dispatches through [`HookTable::row`] by kind byte; this
//! module owns the table and the scalar implementations that make the
//! dispatch path real.

use std::cmp::Ordering;
use std::fmt;

use crate::error::CoreError;
use crate::intern::{Spelling, SpellingTable};
use crate::pool::Pools;
use crate::value::{Cell, Kind, Payload, KIND_LIMIT};

/// Which of the six slots is being dispatched, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Verb,
    Compare,
    Path,
    Make,
    To,
    Mold,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::Verb => "verb",
            HookKind::Compare => "compare",
            HookKind::Path => "path",
            HookKind::Make => "make",
            HookKind::To => "to",
            HookKind::Mold => "mold",
        };
        f.write_str(name)
    }
}

/// Generic verb dispatch: `verb` applied to `target` with `args`.
pub type VerbHook =
    fn(pools: &mut Pools, target: &mut Cell, verb: Spelling, args: &[Cell]) -> Result<Cell, CoreError>;

/// Total ordering within a kind (or across coercible kinds).
pub type CompareHook = fn(a: &Cell, b: &Cell) -> Result<Ordering, CoreError>;

/// One path step: pick `picker` out of `target`.
pub type PathHook = fn(pools: &Pools, target: &Cell, picker: &Cell) -> Result<Cell, CoreError>;

/// Construct a value of `kind` from a definition.
pub type MakeHook = fn(pools: &mut Pools, kind: Kind, def: &Cell) -> Result<Cell, CoreError>;

/// Convert a value to `kind`, preserving meaning.
pub type ToHook = fn(pools: &mut Pools, kind: Kind, value: &Cell) -> Result<Cell, CoreError>;

/// Render a value's source form into `out`.
pub type MoldHook =
    fn(pools: &Pools, value: &Cell, spellings: &SpellingTable, out: &mut String) -> Result<(), CoreError>;

/// One kind's hook row.
#[derive(Clone, Copy)]
pub struct HookRow {
    pub verb: VerbHook,
    pub compare: CompareHook,
    pub path: PathHook,
    pub make: MakeHook,
    pub to: ToHook,
    pub mold: MoldHook,
}

/// The per-kind dispatch table.
pub struct HookTable {
    rows: [HookRow; KIND_LIMIT],
}

impl HookTable {
    /// Build the standard table: stubs everywhere, then the scalar and
    /// word rows overridden with real implementations.
    pub fn standard() -> HookTable {
        let stub_row = HookRow {
            verb: stub_verb,
            compare: stub_compare,
            path: stub_path,
            make: stub_make,
            to: stub_to,
            mold: stub_mold,
        };
        let mut rows = [stub_row; KIND_LIMIT];

        for kind in [
            Kind::Blank,
            Kind::Logic,
            Kind::Integer,
            Kind::Decimal,
            Kind::Char,
            Kind::Time,
            Kind::Date,
        ] {
            let row = &mut rows[kind.byte() as usize];
            row.compare = compare_scalar;
            row.mold = mold_scalar;
        }
        rows[Kind::Logic.byte() as usize].make = make_logic;
        rows[Kind::Integer.byte() as usize].make = make_integer;
        rows[Kind::Integer.byte() as usize].to = to_integer;
        rows[Kind::Decimal.byte() as usize].to = to_decimal;

        for kind in [Kind::Word, Kind::SetWord, Kind::GetWord, Kind::Issue] {
            let row = &mut rows[kind.byte() as usize];
            row.compare = compare_word;
            row.mold = mold_word;
        }

        HookTable { rows }
    }

    /// The hook row for a kind. Direct index; never fails.
    #[inline]
    pub fn row(&self, kind: Kind) -> &HookRow {
        &self.rows[kind.byte() as usize]
    }
}

impl Default for HookTable {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// Stubs
// =============================================================================

fn stub_verb(
    _pools: &mut Pools,
    target: &mut Cell,
    _verb: Spelling,
    _args: &[Cell],
) -> Result<Cell, CoreError> {
    Err(CoreError::NoSuchOperation {
        kind: target.kind(),
        op: HookKind::Verb,
    })
}

fn stub_compare(a: &Cell, _b: &Cell) -> Result<Ordering, CoreError> {
    Err(CoreError::NoSuchOperation {
        kind: a.kind(),
        op: HookKind::Compare,
    })
}

fn stub_path(_pools: &Pools, target: &Cell, _picker: &Cell) -> Result<Cell, CoreError> {
    Err(CoreError::NoSuchOperation {
        kind: target.kind(),
        op: HookKind::Path,
    })
}

fn stub_make(_pools: &mut Pools, kind: Kind, _def: &Cell) -> Result<Cell, CoreError> {
    Err(CoreError::NoSuchOperation {
        kind,
        op: HookKind::Make,
    })
}

fn stub_to(_pools: &mut Pools, kind: Kind, _value: &Cell) -> Result<Cell, CoreError> {
    Err(CoreError::NoSuchOperation {
        kind,
        op: HookKind::To,
    })
}

fn stub_mold(
    _pools: &Pools,
    value: &Cell,
    _spellings: &SpellingTable,
    _out: &mut String,
) -> Result<(), CoreError> {
    Err(CoreError::NoSuchOperation {
        kind: value.kind(),
        op: HookKind::Mold,
    })
}

// =============================================================================
// Scalar hooks
// =============================================================================

fn compare_scalar(a: &Cell, b: &Cell) -> Result<Ordering, CoreError> {
    match (a.payload, b.payload) {
        (Payload::Integer(x), Payload::Integer(y)) => Ok(x.cmp(&y)),
        (Payload::Logic(x), Payload::Logic(y)) => Ok(x.cmp(&y)),
        (Payload::Char(x), Payload::Char(y)) => Ok(x.cmp(&y)),
        (Payload::Time { nanos: x }, Payload::Time { nanos: y }) => Ok(x.cmp(&y)),
        (Payload::Date { .. }, Payload::Date { .. }) => {
            let (xb, yb) = (a.date_bits(), b.date_bits());
            let key = |bits: crate::value::DateBits, nanos: Option<i64>| {
                (bits.year(), bits.month(), bits.day(), nanos.unwrap_or(0))
            };
            match (xb, yb) {
                (Some(xb), Some(yb)) => {
                    Ok(key(xb, a.date_nanos()).cmp(&key(yb, b.date_nanos())))
                }
                _ => Err(CoreError::TypeMismatch {
                    expected: "date",
                    got: b.kind(),
                }),
            }
        }
        _ => {
            // Numeric coercion across integer/decimal.
            match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => Ok(x.partial_cmp(&y).unwrap_or(Ordering::Equal)),
                _ => Err(CoreError::TypeMismatch {
                    expected: a.kind().name(),
                    got: b.kind(),
                }),
            }
        }
    }
}

fn compare_word(a: &Cell, b: &Cell) -> Result<Ordering, CoreError> {
    match (a.word_spelling(), b.word_spelling()) {
        // Spelling ids give a stable (if arbitrary) total order.
        (Some(x), Some(y)) => Ok(x.cmp(&y)),
        _ => Err(CoreError::TypeMismatch {
            expected: "word",
            got: b.kind(),
        }),
    }
}

fn make_logic(_pools: &mut Pools, _kind: Kind, def: &Cell) -> Result<Cell, CoreError> {
    match def.payload {
        Payload::Logic(b) => Ok(Cell::logic(b)),
        Payload::Integer(n) => Ok(Cell::logic(n != 0)),
        Payload::Blank => Ok(Cell::logic(false)),
        _ => Err(CoreError::TypeMismatch {
            expected: "logic definition",
            got: def.kind(),
        }),
    }
}

fn make_integer(_pools: &mut Pools, _kind: Kind, def: &Cell) -> Result<Cell, CoreError> {
    match def.payload {
        Payload::Integer(n) => Ok(Cell::integer(n)),
        Payload::Decimal(f) => Ok(Cell::integer(f as i64)),
        Payload::Logic(b) => Ok(Cell::integer(b as i64)),
        Payload::Char(c) => Ok(Cell::integer(c as i64)),
        _ => Err(CoreError::TypeMismatch {
            expected: "integer definition",
            got: def.kind(),
        }),
    }
}

fn to_integer(_pools: &mut Pools, _kind: Kind, value: &Cell) -> Result<Cell, CoreError> {
    match value.payload {
        Payload::Integer(n) => Ok(Cell::integer(n)),
        Payload::Decimal(f) => Ok(Cell::integer(f.trunc() as i64)),
        Payload::Char(c) => Ok(Cell::integer(c as i64)),
        _ => Err(CoreError::TypeMismatch {
            expected: "number or char",
            got: value.kind(),
        }),
    }
}

fn to_decimal(_pools: &mut Pools, _kind: Kind, value: &Cell) -> Result<Cell, CoreError> {
    match value.as_number() {
        Some(f) => Ok(Cell::decimal(f)),
        None => Err(CoreError::TypeMismatch {
            expected: "number",
            got: value.kind(),
        }),
    }
}

fn mold_scalar(
    _pools: &Pools,
    value: &Cell,
    _spellings: &SpellingTable,
    out: &mut String,
) -> Result<(), CoreError> {
    use std::fmt::Write;
    match value.payload {
        Payload::Blank => out.push('_'),
        Payload::Logic(b) => out.push_str(if b { "true" } else { "false" }),
        Payload::Integer(n) => {
            let _ = write!(out, "{}", n);
        }
        Payload::Decimal(f) => {
            let _ = write!(out, "{:?}", f);
        }
        Payload::Char(c) => {
            let _ = write!(out, "#\"{}\"", c);
        }
        Payload::Time { nanos } => {
            let total_seconds = nanos / 1_000_000_000;
            let frac = (nanos % 1_000_000_000).abs();
            let _ = write!(
                out,
                "{}:{:02}:{:02}",
                total_seconds / 3600,
                (total_seconds.abs() / 60) % 60,
                total_seconds.abs() % 60
            );
            if frac != 0 {
                let _ = write!(out, ".{:09}", frac);
            }
        }
        Payload::Date { nanos } => {
            let bits = value.date_bits().ok_or(CoreError::TypeMismatch {
                expected: "date",
                got: value.kind(),
            })?;
            let _ = write!(out, "{:04}-{:02}-{:02}", bits.year(), bits.month(), bits.day());
            if let Some(nanos) = nanos {
                out.push('/');
                let seconds = nanos / 1_000_000_000;
                let _ = write!(
                    out,
                    "{}:{:02}:{:02}",
                    seconds / 3600,
                    (seconds / 60) % 60,
                    seconds % 60
                );
            }
        }
        _ => {
            return Err(CoreError::NoSuchOperation {
                kind: value.kind(),
                op: HookKind::Mold,
            })
        }
    }
    Ok(())
}

fn mold_word(
    _pools: &Pools,
    value: &Cell,
    spellings: &SpellingTable,
    out: &mut String,
) -> Result<(), CoreError> {
    let spelling = value.word_spelling().ok_or(CoreError::TypeMismatch {
        expected: "word",
        got: value.kind(),
    })?;
    let name = spellings.name(spelling).unwrap_or("~anonymous~");
    match value.kind() {
        Kind::SetWord => {
            out.push_str(name);
            out.push(':');
        }
        Kind::GetWord => {
            out.push(':');
            out.push_str(name);
        }
        Kind::Issue => {
            out.push('#');
            out.push_str(name);
        }
        _ => out.push_str(name),
    }
    Ok(())
}
