//! Typed views over cells, one small surface per value category.
//!
//! Scalar accessors return `Option` and never allocate. Categories backed
//! by auxiliary heap storage (bitsets, handles, maps, contexts) have
//! `init_*` constructors that draw that storage from the pools, and
//! accessors that take `&Pools` to reach it.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::bind::{Binding, Specifier};
use crate::error::CoreError;
use crate::intern::Spelling;
use crate::pool::{NodeRef, Pools};
use crate::series::{
    array_get, array_len, array_push, array_set, binary_len, binary_push, byte_at,
    hash_slot, hashlist_buckets, make_byte_run, make_cell_run, make_handle_stub,
    make_hashlist, set_byte_at, set_hash_slot, set_series_link, series_link, Flavor,
};
use crate::value::{Cell, DateBits, Extra, HandleCleanup, Kind, Payload};

// =============================================================================
// Scalars
// =============================================================================

impl Cell {
    #[inline]
    pub fn as_logic(&self) -> Option<bool> {
        match self.payload {
            Payload::Logic(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self.payload {
            Payload::Integer(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_decimal(&self) -> Option<f64> {
        match self.payload {
            Payload::Decimal(f) => Some(f),
            _ => None,
        }
    }

    /// Either numeric kind, coerced to a decimal.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self.payload {
            Payload::Integer(n) => Some(n as f64),
            Payload::Decimal(f) => Some(f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_char(&self) -> Option<char> {
        match self.payload {
            Payload::Char(c) => Some(c),
            _ => None,
        }
    }

    /// Time of day or duration in nanoseconds.
    #[inline]
    pub fn time_nanos(&self) -> Option<i64> {
        match self.payload {
            Payload::Time { nanos } => Some(nanos),
            _ => None,
        }
    }

    #[inline]
    pub fn time(nanos: i64) -> Cell {
        let mut cell = Cell::formatted(Kind::Time);
        cell.payload = Payload::Time { nanos };
        cell
    }

    /// A calendar date, optionally with a time of day.
    pub fn date(bits: DateBits, nanos: Option<i64>) -> Cell {
        let mut cell = Cell::formatted(Kind::Date);
        cell.payload = Payload::Date { nanos };
        cell.extra = Extra::Date(bits);
        cell
    }

    #[inline]
    pub fn date_bits(&self) -> Option<DateBits> {
        match (self.kind_byte_is(Kind::Date), self.extra) {
            (true, Extra::Date(bits)) => Some(bits),
            _ => None,
        }
    }

    /// Time-of-day nanoseconds of a date, if it carries one.
    #[inline]
    pub fn date_nanos(&self) -> Option<i64> {
        match self.payload {
            Payload::Date { nanos } => nanos,
            _ => None,
        }
    }

    #[inline]
    fn kind_byte_is(&self, kind: Kind) -> bool {
        self.header.subclass() == kind.byte()
    }
}

// =============================================================================
// Words and bindings
// =============================================================================

impl Cell {
    #[inline]
    pub fn word_spelling(&self) -> Option<Spelling> {
        match self.payload {
            Payload::Word { spelling } => Some(spelling),
            _ => None,
        }
    }

    /// The cell's binding, for bindable kinds that carry one.
    #[inline]
    pub fn binding(&self) -> Option<Binding> {
        match self.extra {
            Extra::Binding(binding) => Some(binding),
            _ => None,
        }
    }

    /// Bind this cell. Only bindable kinds may carry a binding.
    pub fn set_binding(&mut self, binding: Binding) {
        crate::contract!(
            self.kind().is_bindable(),
            "binding set on {:?} cell",
            self.kind()
        );
        self.extra = Extra::Binding(binding);
    }

    pub fn clear_binding(&mut self) {
        self.extra = Extra::None;
    }
}

// =============================================================================
// Bitsets
// =============================================================================

/// A character-set cell with room for `bits` bits, all clear.
pub fn init_bitset(pools: &mut Pools, bits: u32) -> Cell {
    let bytes = (bits as usize + 7) / 8;
    let stub = make_byte_run(pools, Flavor::Bitset, bytes as u32);
    let mut cell = Cell::formatted(Kind::Bitset);
    cell.payload = Payload::Bitset { stub };
    cell
}

fn bitset_stub(cell: &Cell) -> Result<NodeRef, CoreError> {
    match cell.payload {
        Payload::Bitset { stub } => Ok(stub),
        _ => Err(CoreError::TypeMismatch {
            expected: "bitset",
            got: cell.kind(),
        }),
    }
}

/// The byte series backing a bitset.
pub fn bitset_backing(cell: &Cell) -> Option<NodeRef> {
    match cell.payload {
        Payload::Bitset { stub } => Some(stub),
        _ => None,
    }
}

/// Test one bit. Bits past the backing store read as clear.
pub fn bitset_test(pools: &Pools, cell: &Cell, bit: u32) -> Result<bool, CoreError> {
    let stub = bitset_stub(cell)?;
    let byte = (bit / 8) as usize;
    if byte >= binary_len(pools, stub) {
        return Ok(false);
    }
    Ok(byte_at(pools, stub, byte) & (1 << (bit % 8)) != 0)
}

/// Set or clear one bit, extending the backing store as needed.
pub fn bitset_set(pools: &mut Pools, cell: &Cell, bit: u32, on: bool) -> Result<(), CoreError> {
    let stub = bitset_stub(cell)?;
    let byte = (bit / 8) as usize;
    while byte >= binary_len(pools, stub) {
        binary_push(pools, stub, 0);
    }
    let mask = 1u8 << (bit % 8);
    let current = byte_at(pools, stub, byte);
    let updated = if on { current | mask } else { current & !mask };
    set_byte_at(pools, stub, byte, updated);
    Ok(())
}

// =============================================================================
// Handles
// =============================================================================

/// Box a foreign pointer/length. Every copy of the returned cell shares
/// one stub, so the cleanup runs exactly once when the stub is freed.
pub fn init_handle(
    pools: &mut Pools,
    data: usize,
    len: usize,
    cleanup: Option<HandleCleanup>,
) -> Cell {
    let stub = make_handle_stub(pools, data, len, cleanup);
    let mut cell = Cell::formatted(Kind::Handle);
    cell.payload = Payload::Handle { stub };
    cell
}

/// The handle's pointer and length.
pub fn handle_data(pools: &Pools, cell: &Cell) -> Result<(usize, usize), CoreError> {
    match cell.payload {
        Payload::Handle { stub } => {
            let (data, len, _) = crate::series::handle_stub_parts(pools, stub);
            Ok((data, len))
        }
        _ => Err(CoreError::TypeMismatch {
            expected: "handle",
            got: cell.kind(),
        }),
    }
}

/// The stub shared by all copies of this handle.
pub fn handle_stub(cell: &Cell) -> Option<NodeRef> {
    match cell.payload {
        Payload::Handle { stub } => Some(stub),
        _ => None,
    }
}

/// The handle's cleanup callback, if one was registered.
pub fn handle_cleanup(pools: &Pools, cell: &Cell) -> Option<HandleCleanup> {
    let stub = handle_stub(cell)?;
    let (_, _, cleanup) = crate::series::handle_stub_parts(pools, stub);
    cleanup
}

// =============================================================================
// Maps
// =============================================================================

/// Hashable map key kinds: scalars and words. Series keys would need
/// content hashing and are not supported at this layer.
fn key_hash(cell: &Cell) -> Result<u64, CoreError> {
    let mut hasher = FxHasher::default();
    cell.header.subclass().hash(&mut hasher);
    match cell.payload {
        Payload::Integer(n) => n.hash(&mut hasher),
        Payload::Char(c) => c.hash(&mut hasher),
        Payload::Logic(b) => b.hash(&mut hasher),
        Payload::Word { spelling } => spelling.0.hash(&mut hasher),
        _ => {
            return Err(CoreError::TypeMismatch {
                expected: "scalar or word key",
                got: cell.kind(),
            })
        }
    }
    Ok(hasher.finish())
}

fn keys_equal(a: &Cell, b: &Cell) -> bool {
    a.header.subclass() == b.header.subclass() && a.payload == b.payload
}

/// An empty map with capacity hints.
pub fn init_map(pools: &mut Pools, capacity: u32) -> Cell {
    let pairlist = make_cell_run(pools, Flavor::Pairlist, capacity * 2);
    let buckets = (capacity * 2).max(8).next_power_of_two();
    let hashlist = make_hashlist(pools, buckets);
    set_series_link(pools, pairlist, Some(hashlist));

    let mut cell = Cell::formatted(Kind::Map);
    cell.payload = Payload::Map { pairlist };
    cell
}

/// The map's key/value pair list.
pub fn map_pairlist(cell: &Cell) -> Option<NodeRef> {
    match cell.payload {
        Payload::Map { pairlist } => Some(pairlist),
        _ => None,
    }
}

/// The map's hash list (bucket store).
pub fn map_hashlist(pools: &Pools, cell: &Cell) -> Option<NodeRef> {
    map_pairlist(cell).and_then(|pairs| series_link(pools, pairs))
}

pub fn map_len(pools: &Pools, cell: &Cell) -> usize {
    map_pairlist(cell).map_or(0, |pairs| array_len(pools, pairs) / 2)
}

/// Find a key's pair index by probing the hashlist. Slots store pair
/// index + 1; zero means empty.
fn probe(
    pools: &Pools,
    pairs: NodeRef,
    hashes: NodeRef,
    key: &Cell,
) -> Result<(usize, Option<usize>), CoreError> {
    let buckets = hashlist_buckets(pools, hashes);
    let mut bucket = (key_hash(key)? % buckets as u64) as usize;
    loop {
        let slot = hash_slot(pools, hashes, bucket);
        if slot == 0 {
            return Ok((bucket, None));
        }
        let pair_index = (slot - 1) as usize * 2;
        let stored = array_get(pools, pairs, pair_index);
        if keys_equal(&stored, key) {
            return Ok((bucket, Some(pair_index)));
        }
        bucket = (bucket + 1) % buckets;
    }
}

/// Insert or update one key.
pub fn map_insert(
    pools: &mut Pools,
    cell: &Cell,
    key: Cell,
    value: Cell,
) -> Result<(), CoreError> {
    let pairs = map_pairlist(cell).ok_or(CoreError::TypeMismatch {
        expected: "map",
        got: cell.kind(),
    })?;
    let mut hashes = map_hashlist(pools, cell).expect("map without hashlist");

    // Keep the table under two-thirds full.
    let pair_count = array_len(pools, pairs) / 2;
    if (pair_count + 1) * 3 > hashlist_buckets(pools, hashes) * 2 {
        hashes = rehash(pools, pairs, hashes)?;
    }

    let (bucket, existing) = probe(pools, pairs, hashes, &key)?;
    match existing {
        Some(pair_index) => {
            array_set(pools, pairs, pair_index + 1, value);
        }
        None => {
            let pair_index = array_len(pools, pairs);
            array_push(pools, pairs, key);
            array_push(pools, pairs, value);
            set_hash_slot(pools, hashes, bucket, (pair_index / 2) as u32 + 1);
        }
    }
    Ok(())
}

/// Look up a key's value.
pub fn map_find(pools: &Pools, cell: &Cell, key: &Cell) -> Result<Option<Cell>, CoreError> {
    let pairs = map_pairlist(cell).ok_or(CoreError::TypeMismatch {
        expected: "map",
        got: cell.kind(),
    })?;
    let hashes = map_hashlist(pools, cell).expect("map without hashlist");
    let (_, existing) = probe(pools, pairs, hashes, key)?;
    Ok(existing.map(|pair_index| array_get(pools, pairs, pair_index + 1)))
}

/// Double the bucket store and reinsert every pair.
fn rehash(pools: &mut Pools, pairs: NodeRef, old: NodeRef) -> Result<NodeRef, CoreError> {
    let new_buckets = (hashlist_buckets(pools, old) * 2).max(8) as u32;
    let fresh = make_hashlist(pools, new_buckets);
    let pair_count = array_len(pools, pairs) / 2;
    for i in 0..pair_count {
        let key = array_get(pools, pairs, i * 2);
        let buckets = new_buckets as u64;
        let mut bucket = (key_hash(&key)? % buckets) as usize;
        while hash_slot(pools, fresh, bucket) != 0 {
            bucket = (bucket + 1) % buckets as usize;
        }
        set_hash_slot(pools, fresh, bucket, i as u32 + 1);
    }
    set_series_link(pools, pairs, Some(fresh));
    crate::series::free_series(pools, old);
    Ok(fresh)
}

// =============================================================================
// Contexts and actions
// =============================================================================

/// An empty context with a varlist of the given capacity.
pub fn make_context(pools: &mut Pools, capacity: u32) -> Cell {
    let varlist = make_cell_run(pools, Flavor::Varlist, capacity);
    let mut cell = Cell::formatted(Kind::Context);
    cell.payload = Payload::Context { varlist };
    cell
}

pub fn context_varlist(cell: &Cell) -> Option<NodeRef> {
    match cell.payload {
        Payload::Context { varlist } => Some(varlist),
        _ => None,
    }
}

pub fn context_len(pools: &Pools, cell: &Cell) -> usize {
    context_varlist(cell).map_or(0, |v| array_len(pools, v))
}

/// Append a value slot, returning its index.
pub fn context_append(pools: &mut Pools, cell: &Cell, value: Cell) -> u32 {
    let varlist = context_varlist(cell).expect("not a context");
    let index = array_len(pools, varlist) as u32;
    array_push(pools, varlist, value);
    index
}

pub fn context_get(pools: &Pools, cell: &Cell, index: u32) -> Cell {
    let varlist = context_varlist(cell).expect("not a context");
    array_get(pools, varlist, index as usize)
}

pub fn context_set(pools: &mut Pools, cell: &Cell, index: u32, value: Cell) {
    let varlist = context_varlist(cell).expect("not a context");
    array_set(pools, varlist, index as usize, value);
}

/// The specifier resolving relative values against this context.
pub fn specifier_of(cell: &Cell) -> Option<Specifier> {
    context_varlist(cell).map(Specifier::new)
}

/// An action from its parameter spellings and body array.
pub fn make_action(pools: &mut Pools, params: &[Spelling], body: NodeRef) -> Cell {
    let paramlist = make_cell_run(pools, Flavor::Paramlist, params.len() as u32);
    for spelling in params {
        array_push(pools, paramlist, Cell::word(Kind::Word, *spelling));
    }
    let mut cell = Cell::formatted(Kind::Action);
    cell.payload = Payload::Action { paramlist, body };
    cell
}

pub fn action_paramlist(cell: &Cell) -> Option<NodeRef> {
    match cell.payload {
        Payload::Action { paramlist, .. } => Some(paramlist),
        _ => None,
    }
}

pub fn action_body(cell: &Cell) -> Option<NodeRef> {
    match cell.payload {
        Payload::Action { body, .. } => Some(body),
        _ => None,
    }
}
