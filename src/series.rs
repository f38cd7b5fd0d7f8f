//! Series stubs: the heap objects behind arrays, strings, and friends.
//!
//! A stub is a fixed-size node in the stub pool describing one series:
//! flavor, live length, and where the content lives (a raw pool unit or a
//! large-object slot). Content units hold cells for array-class flavors
//! and bytes or hash slots otherwise. Cell runs end with the end-signal
//! pattern so a cell-by-cell walk can stop without consulting the stub.
//!
//! Growth reallocates content into a bigger size class and copies; the
//! stub itself never moves, so cells pointing at the series stay valid.
//!
//! Typed access goes through by-value reads and writes of the `Copy` stub
//! struct — read, modify, write back — which keeps the unsafe pointer work
//! in this module's few helpers.

use std::mem::size_of;
use std::ptr;
use std::slice;

use crate::bind::RelativeCell;
use crate::node::{Header, CELL, FREE, MANAGED, MARKED, NODE};
use crate::pool::{DataRef, NodeRef, PoolId, Pools, UnitClass};
use crate::value::{Cell, HandleCleanup};

/// Stub flavor byte. Nonzero, like kind bytes: zero is the end signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Flavor {
    /// General cell array.
    Array = 1,
    /// Byte string / binary content.
    Binary = 2,
    /// One-cell array (deep-quote fallback, literal boxes).
    Singular = 3,
    /// Map key/value pair list.
    Pairlist = 4,
    /// Map hash buckets (u32 slots).
    Hashlist = 5,
    /// Character-set backing bytes.
    Bitset = 6,
    /// Boxed foreign handle.
    Handle = 7,
    /// Context variable list.
    Varlist = 8,
    /// Action parameter list.
    Paramlist = 9,
}

impl Flavor {
    #[inline]
    pub fn byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Flavor> {
        match byte {
            1 => Some(Flavor::Array),
            2 => Some(Flavor::Binary),
            3 => Some(Flavor::Singular),
            4 => Some(Flavor::Pairlist),
            5 => Some(Flavor::Hashlist),
            6 => Some(Flavor::Bitset),
            7 => Some(Flavor::Handle),
            8 => Some(Flavor::Varlist),
            9 => Some(Flavor::Paramlist),
            _ => None,
        }
    }

    /// Element width of this flavor's content.
    #[inline]
    fn elem_wide(self) -> usize {
        match self {
            Flavor::Binary | Flavor::Bitset => 1,
            Flavor::Hashlist => 4,
            Flavor::Handle => 0,
            _ => size_of::<Cell>(),
        }
    }

    /// Cell-run flavors terminate content with the end signal.
    #[inline]
    fn holds_cells(self) -> bool {
        self.elem_wide() == size_of::<Cell>()
    }
}

/// Stub body: series content bookkeeping, or the boxed handle fields.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, u8)]
pub enum StubBody {
    Content {
        /// Capacity in elements (cell runs reserve one more slot for the
        /// end signal).
        cap: u32,
        data: Option<DataRef>,
        /// Auxiliary series (a pairlist's hashlist). Owned by this stub
        /// and freed with it; never independently GC-managed.
        link: Option<NodeRef>,
    },
    Handle {
        data: usize,
        len: usize,
        cleanup: Option<HandleCleanup>,
    },
}

/// A series header node.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Stub {
    pub(crate) header: Header,
    pub(crate) len: u32,
    pub(crate) body: StubBody,
}

const _: () = assert!(size_of::<Stub>() % 8 == 0);

impl Stub {
    #[inline]
    pub fn flavor(&self) -> Flavor {
        match Flavor::from_byte(self.header.subclass()) {
            Some(flavor) => flavor,
            None => unreachable!("stub carries invalid flavor byte"),
        }
    }
}

// =============================================================================
// Typed stub access
// =============================================================================

/// Read a stub by value.
///
/// Panics if the unit's leading byte is not a live stub header — freed
/// units and cell-shaped nodes never reach the typed read.
pub fn stub(pools: &Pools, node: NodeRef) -> Stub {
    let p = pools.unit_ptr(node).as_ptr();
    let b0 = unsafe { *p };
    assert!(
        b0 & NODE != 0 && b0 & FREE == 0 && b0 & CELL == 0,
        "unit {:#04x} is not a live stub",
        b0
    );
    unsafe { ptr::read(p as *const Stub) }
}

fn write_stub(pools: &mut Pools, node: NodeRef, stub: Stub) {
    let p = pools.unit_ptr(node).as_ptr();
    // The unit is stub-pool sized and 8-aligned; Stub is Copy, so no drop.
    unsafe { ptr::write(p as *mut Stub, stub) }
}

fn cell_slot(pools: &Pools, data: DataRef, index: usize) -> *mut Cell {
    let p = pools.data_ptr(data).as_ptr();
    unsafe { (p as *mut Cell).add(index) }
}

fn write_end_signal(pools: &Pools, data: DataRef, index: usize) {
    unsafe { ptr::write(cell_slot(pools, data, index), Cell::end_signal()) }
}

/// Allocate and format a stub with fresh content storage.
pub(crate) fn make_stub(pools: &mut Pools, flavor: Flavor, cap: u32) -> NodeRef {
    let node = pools.alloc(pools.stub_pool());
    debug_assert!(pools.unit_wide(pools.stub_pool()) >= size_of::<Stub>());

    let data = if flavor == Flavor::Handle {
        None
    } else {
        let slots = if flavor.holds_cells() { cap + 1 } else { cap.max(1) };
        Some(pools.alloc_data(slots as usize * flavor.elem_wide()))
    };
    if let (Some(d), true) = (data, flavor.holds_cells()) {
        write_end_signal(pools, d, 0);
    }
    write_stub(
        pools,
        node,
        Stub {
            header: Header::stub(flavor.byte()),
            len: 0,
            body: StubBody::Content {
                cap,
                data,
                link: None,
            },
        },
    );
    node
}

/// Free a series: its auxiliary link, its content, and (for handles) run
/// the cleanup callback, then return the stub to its pool.
pub fn free_series(pools: &mut Pools, node: NodeRef) {
    let s = stub(pools, node);
    match s.body {
        StubBody::Content { data, link, .. } => {
            if let Some(link) = link {
                free_series(pools, link);
            }
            if let Some(data) = data {
                pools.free_data(data);
            }
        }
        StubBody::Handle { data, len, cleanup } => {
            if let Some(cleanup) = cleanup {
                cleanup(data, len);
            }
        }
    }
    pools.free(node);
}

/// The auxiliary link (a pairlist's hashlist).
pub fn series_link(pools: &Pools, node: NodeRef) -> Option<NodeRef> {
    match stub(pools, node).body {
        StubBody::Content { link, .. } => link,
        StubBody::Handle { .. } => None,
    }
}

pub fn set_series_link(pools: &mut Pools, node: NodeRef, new_link: Option<NodeRef>) {
    let mut s = stub(pools, node);
    match &mut s.body {
        StubBody::Content { link, .. } => *link = new_link,
        StubBody::Handle { .. } => panic!("handle stubs carry no link"),
    }
    write_stub(pools, node, s);
}

// =============================================================================
// Arrays (cell runs)
// =============================================================================

/// A general array with room for `cap` cells.
pub fn make_array(pools: &mut Pools, cap: u32) -> NodeRef {
    make_stub(pools, Flavor::Array, cap)
}

/// A flavored cell array (varlist, paramlist, pairlist).
pub(crate) fn make_cell_run(pools: &mut Pools, flavor: Flavor, cap: u32) -> NodeRef {
    debug_assert!(flavor.holds_cells());
    make_stub(pools, flavor, cap)
}

pub fn array_len(pools: &Pools, node: NodeRef) -> usize {
    stub(pools, node).len as usize
}

fn content_parts(s: &Stub) -> (u32, Option<DataRef>) {
    match s.body {
        StubBody::Content { cap, data, .. } => (cap, data),
        StubBody::Handle { .. } => panic!("handle stub has no content"),
    }
}

/// Copy out one cell. The slot must hold a specific (non-relative) value;
/// use [`array_get_relative`] when reading out of a function template.
pub fn array_get(pools: &Pools, node: NodeRef, index: usize) -> Cell {
    let cell = read_slot(pools, node, index);
    crate::contract!(
        !cell.is_relative(),
        "relative cell read without a specifier"
    );
    cell
}

/// Copy out one cell, which may carry a relative binding.
pub fn array_get_relative(pools: &Pools, node: NodeRef, index: usize) -> RelativeCell {
    RelativeCell::new(read_slot(pools, node, index))
}

fn read_slot(pools: &Pools, node: NodeRef, index: usize) -> Cell {
    let s = stub(pools, node);
    assert!(
        index < s.len as usize,
        "index {} out of bounds (length {})",
        index,
        s.len
    );
    let (_, data) = content_parts(&s);
    unsafe { ptr::read(cell_slot(pools, data.expect("non-empty array"), index)) }
}

/// Overwrite one cell in place.
pub fn array_set(pools: &mut Pools, node: NodeRef, index: usize, cell: Cell) {
    crate::contract!(
        !cell.is_relative(),
        "relative cell stored without being resolved"
    );
    store_slot(pools, node, index, cell);
}

/// Overwrite one cell in a function-template body, where relative
/// bindings are the point.
pub fn array_set_template(pools: &mut Pools, node: NodeRef, index: usize, cell: Cell) {
    store_slot(pools, node, index, cell);
}

fn store_slot(pools: &mut Pools, node: NodeRef, index: usize, cell: Cell) {
    let s = stub(pools, node);
    assert!(
        index < s.len as usize,
        "index {} out of bounds (length {})",
        index,
        s.len
    );
    let (_, data) = content_parts(&s);
    unsafe { ptr::write(cell_slot(pools, data.expect("non-empty array"), index), cell) }
}

/// Append a specific cell, growing the content if full.
pub fn array_push(pools: &mut Pools, node: NodeRef, cell: Cell) {
    crate::contract!(
        !cell.is_relative(),
        "relative cell stored without being resolved"
    );
    push_slot(pools, node, cell);
}

/// Append into a template body (relative cells allowed).
pub fn array_push_template(pools: &mut Pools, node: NodeRef, cell: Cell) {
    push_slot(pools, node, cell);
}

fn push_slot(pools: &mut Pools, node: NodeRef, cell: Cell) {
    let mut s = stub(pools, node);
    let (cap, data) = content_parts(&s);
    let len = s.len;

    let data = if len >= cap || data.is_none() {
        grow_cells(pools, &mut s, len.max(cap) * 2 + 4)
    } else {
        data.expect("content present under capacity")
    };

    unsafe { ptr::write(cell_slot(pools, data, len as usize), cell) };
    write_end_signal(pools, data, len as usize + 1);
    s.len = len + 1;
    write_stub(pools, node, s);
}

/// Move cell content into a bigger size class. Returns the new data ref;
/// the caller still owns writing the stub back.
fn grow_cells(pools: &mut Pools, s: &mut Stub, new_cap: u32) -> DataRef {
    let (_, old_data) = content_parts(s);
    let new_data = pools.alloc_data((new_cap as usize + 1) * size_of::<Cell>());
    if let Some(old) = old_data {
        let src = pools.data_ptr(old).as_ptr() as *const Cell;
        let dst = pools.data_ptr(new_data).as_ptr() as *mut Cell;
        unsafe { ptr::copy_nonoverlapping(src, dst, s.len as usize) };
        pools.free_data(old);
    }
    write_end_signal(pools, new_data, s.len as usize);
    match &mut s.body {
        StubBody::Content { cap, data, .. } => {
            *cap = new_cap;
            *data = Some(new_data);
        }
        StubBody::Handle { .. } => unreachable!(),
    }
    new_data
}

/// Raw view of an array's cells, end signal excluded.
pub fn array_cells(pools: &Pools, node: NodeRef) -> &[Cell] {
    let s = stub(pools, node);
    let (_, data) = content_parts(&s);
    match data {
        Some(d) if s.len > 0 => unsafe {
            slice::from_raw_parts(cell_slot(pools, d, 0), s.len as usize)
        },
        _ => &[],
    }
}

// =============================================================================
// Singulars
// =============================================================================

/// A one-cell array holding `cell`.
pub fn make_singular(pools: &mut Pools, cell: Cell) -> NodeRef {
    let node = make_stub(pools, Flavor::Singular, 1);
    push_slot(pools, node, cell);
    node
}

/// The singular's sole cell.
pub fn singular_cell(pools: &Pools, node: NodeRef) -> Cell {
    read_slot(pools, node, 0)
}

// =============================================================================
// Binaries (byte runs)
// =============================================================================

pub fn make_binary(pools: &mut Pools, cap: u32) -> NodeRef {
    make_stub(pools, Flavor::Binary, cap)
}

pub(crate) fn make_byte_run(pools: &mut Pools, flavor: Flavor, len: u32) -> NodeRef {
    debug_assert!(flavor.elem_wide() == 1);
    let node = make_stub(pools, flavor, len);
    let mut s = stub(pools, node);
    // Recycled units carry stale bytes; a fresh run starts all-clear.
    let (_, data) = content_parts(&s);
    if let Some(d) = data {
        unsafe { ptr::write_bytes(pools.data_ptr(d).as_ptr(), 0, len.max(1) as usize) };
    }
    s.len = len;
    write_stub(pools, node, s);
    node
}

pub fn binary_len(pools: &Pools, node: NodeRef) -> usize {
    stub(pools, node).len as usize
}

pub fn binary_bytes(pools: &Pools, node: NodeRef) -> &[u8] {
    let s = stub(pools, node);
    let (_, data) = content_parts(&s);
    match data {
        Some(d) if s.len > 0 => unsafe {
            slice::from_raw_parts(pools.data_ptr(d).as_ptr(), s.len as usize)
        },
        _ => &[],
    }
}

pub fn binary_push(pools: &mut Pools, node: NodeRef, byte: u8) {
    let mut s = stub(pools, node);
    let (cap, data) = content_parts(&s);
    let len = s.len;

    let data = if len >= cap || data.is_none() {
        let new_cap = (len.max(cap) * 2 + 8).max(16);
        let new_data = pools.alloc_data(new_cap as usize);
        if let Some(old) = data {
            let src = pools.data_ptr(old).as_ptr();
            let dst = pools.data_ptr(new_data).as_ptr();
            unsafe { ptr::copy_nonoverlapping(src, dst, len as usize) };
            pools.free_data(old);
        }
        match &mut s.body {
            StubBody::Content { cap, data, .. } => {
                *cap = new_cap;
                *data = Some(new_data);
            }
            StubBody::Handle { .. } => unreachable!(),
        }
        new_data
    } else {
        data.expect("content present under capacity")
    };

    unsafe { *pools.data_ptr(data).as_ptr().add(len as usize) = byte };
    s.len = len + 1;
    write_stub(pools, node, s);
}

pub(crate) fn byte_at(pools: &Pools, node: NodeRef, index: usize) -> u8 {
    let s = stub(pools, node);
    assert!(index < s.len as usize, "byte index {} out of bounds", index);
    let (_, data) = content_parts(&s);
    unsafe { *pools.data_ptr(data.expect("non-empty run")).as_ptr().add(index) }
}

pub(crate) fn set_byte_at(pools: &mut Pools, node: NodeRef, index: usize, byte: u8) {
    let s = stub(pools, node);
    assert!(index < s.len as usize, "byte index {} out of bounds", index);
    let (_, data) = content_parts(&s);
    unsafe { *pools.data_ptr(data.expect("non-empty run")).as_ptr().add(index) = byte };
}

// =============================================================================
// Hashlists (u32 bucket runs)
// =============================================================================

pub(crate) fn make_hashlist(pools: &mut Pools, buckets: u32) -> NodeRef {
    let node = make_stub(pools, Flavor::Hashlist, buckets);
    let mut s = stub(pools, node);
    // Buckets start empty (zero = no entry); recycled units carry stale
    // bytes otherwise.
    let (_, data) = content_parts(&s);
    if let Some(d) = data {
        unsafe { ptr::write_bytes(pools.data_ptr(d).as_ptr(), 0, buckets as usize * 4) };
    }
    s.len = buckets;
    write_stub(pools, node, s);
    node
}

pub(crate) fn hash_slot(pools: &Pools, node: NodeRef, bucket: usize) -> u32 {
    let s = stub(pools, node);
    assert!(bucket < s.len as usize, "bucket {} out of bounds", bucket);
    let (_, data) = content_parts(&s);
    let p = pools.data_ptr(data.expect("hashlist content")).as_ptr() as *const u32;
    unsafe { ptr::read(p.add(bucket)) }
}

pub(crate) fn set_hash_slot(pools: &mut Pools, node: NodeRef, bucket: usize, value: u32) {
    let s = stub(pools, node);
    assert!(bucket < s.len as usize, "bucket {} out of bounds", bucket);
    let (_, data) = content_parts(&s);
    let p = pools.data_ptr(data.expect("hashlist content")).as_ptr() as *mut u32;
    unsafe { ptr::write(p.add(bucket), value) }
}

pub(crate) fn hashlist_buckets(pools: &Pools, node: NodeRef) -> usize {
    stub(pools, node).len as usize
}

// =============================================================================
// Handle stubs
// =============================================================================

/// Box a foreign pointer/length with an optional cleanup, shared by every
/// cell copied from the original.
pub fn make_handle_stub(
    pools: &mut Pools,
    data: usize,
    len: usize,
    cleanup: Option<HandleCleanup>,
) -> NodeRef {
    let node = pools.alloc(pools.stub_pool());
    write_stub(
        pools,
        node,
        Stub {
            header: Header::stub(Flavor::Handle.byte()),
            len: 0,
            body: StubBody::Handle { data, len, cleanup },
        },
    );
    node
}

pub fn handle_stub_parts(pools: &Pools, node: NodeRef) -> (usize, usize, Option<HandleCleanup>) {
    match stub(pools, node).body {
        StubBody::Handle { data, len, cleanup } => (data, len, cleanup),
        StubBody::Content { .. } => panic!("not a handle stub"),
    }
}

// =============================================================================
// Pairings (API-owned cell pairs)
// =============================================================================

/// Allocate a pairing: two cells in one cell-class unit, flagged ROOT so
/// the collector treats them as reachable by definition. This is how the
/// API hands out values that live outside any series.
pub fn alloc_pairing(pools: &mut Pools, first: Cell, second: Cell) -> NodeRef {
    let node = pools.alloc(pools.pairing_pool());
    let mut cells = [first, second];
    // The first cell's header doubles as the unit's node header.
    cells[0].header.set_flag(crate::node::ROOT);
    let p = pools.unit_ptr(node).as_ptr() as *mut [Cell; 2];
    unsafe { ptr::write(p, cells) };
    node
}

/// Copy out a pairing's cells.
pub fn pairing_cells(pools: &Pools, node: NodeRef) -> (Cell, Cell) {
    let p = pools.unit_ptr(node).as_ptr();
    let b0 = unsafe { *p };
    assert!(
        b0 & NODE != 0 && b0 & FREE == 0 && b0 & CELL != 0,
        "unit {:#04x} is not a live pairing",
        b0
    );
    let cells = unsafe { ptr::read(p as *const [Cell; 2]) };
    (cells[0], cells[1])
}

/// Overwrite a pairing's cells, preserving the unit's node flags.
pub fn set_pairing_cells(pools: &mut Pools, node: NodeRef, first: Cell, second: Cell) {
    let (old_first, _) = pairing_cells(pools, node);
    let mut cells = [first, second];
    cells[0].header.0[0] = old_first.header.0[0];
    let p = pools.unit_ptr(node).as_ptr() as *mut [Cell; 2];
    unsafe { ptr::write(p, cells) };
}

/// Release a pairing back to its pool.
pub fn free_pairing(pools: &mut Pools, node: NodeRef) {
    pools.free(node);
}

// =============================================================================
// GC cooperation
// =============================================================================

/// Hand a node's lifetime to the collector.
pub fn manage(pools: &mut Pools, node: NodeRef) {
    pools.set_header_flag(node, MANAGED);
}

pub fn is_managed(pools: &Pools, node: NodeRef) -> bool {
    pools.get_header_flag(node, MANAGED)
}

/// Set the mark bit during a GC mark phase. Only managed nodes may be
/// marked.
pub fn mark(pools: &mut Pools, node: NodeRef) {
    crate::contract!(
        pools.get_header_flag(node, MANAGED),
        "mark bit set on a non-managed node"
    );
    pools.set_header_flag(node, MARKED);
}

pub fn is_marked(pools: &Pools, node: NodeRef) -> bool {
    pools.get_header_flag(node, MARKED)
}

/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepStats {
    pub freed: usize,
    pub kept: usize,
}

/// Sweep every managed, unmarked node back to its pool and clear the mark
/// bit on survivors. The caller's mark phase has already run; this is the
/// collection half of the bargain.
pub fn sweep(pools: &mut Pools) -> SweepStats {
    let mut stats = SweepStats::default();
    for idx in 0..pools.pool_count() {
        let id = PoolId(idx as u8);
        let class = pools.pool_class(id);
        if class == UnitClass::Raw {
            continue;
        }
        for unit in 0..pools.units_total(id) as u32 {
            let b0 = pools.raw_header_byte(id, unit);
            if b0 & NODE == 0 || b0 & FREE != 0 {
                continue;
            }
            if b0 & MANAGED == 0 {
                continue;
            }
            let node = pools.current_ref(id, unit);
            if b0 & MARKED != 0 {
                pools.clear_header_flag(node, MARKED);
                stats.kept += 1;
            } else {
                if class == UnitClass::Stub {
                    free_series(pools, node);
                } else {
                    pools.free(node);
                }
                stats.freed += 1;
            }
        }
    }
    stats
}
