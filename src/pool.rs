//! Segmented pool allocator.
//!
//! Heap nodes (series stubs, pairing cells) and raw series content all come
//! from size-classed pools. Each pool owns a list of segments — `Box<[u64]>`
//! chunks subdivided into fixed-width units — and threads an intrusive free
//! list through the bodies of its free units. Segments are never moved or
//! resized, so a unit's address is stable for the life of the process and
//! always 8-aligned.
//!
//! Units are addressed by [`NodeRef`] handles carrying a generation counter.
//! Freeing a unit bumps its generation, so a handle held across a free
//! resolves to a hard failure instead of silently reading recycled memory.
//! Freed units also get their leading byte overwritten with the class
//! sentinel (see [`crate::node`]), and the free list pushes to the *tail*,
//! maximizing the time before freed memory is handed out again.
//!
//! Content too large for the biggest size class falls through to a
//! large-object table backed by the system allocator.
//!
//! All of this is single-threaded by design; there is no locking anywhere.

use std::ptr::{self, NonNull};

use smallvec::SmallVec;

use crate::classify::verify_byte_invariants;
use crate::config::{round_to_units, MemConfig};
use crate::error::out_of_memory;
use crate::node::{FREED_CELL_BYTE, FREED_STUB_BYTE};

/// Units must hold a header word plus a free-list link.
const MIN_WIDE: usize = 16;

/// Free-list link: stored in unit bytes 8..12 while the unit is free.
/// Once allocated, those bytes belong to the caller.
const LINK_OFFSET: usize = 8;
const NO_LINK: u32 = u32::MAX;

/// Emergency growth never scales a segment by more than this factor.
const MAX_SCALE: usize = 8;

/// Identifies one pool in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(pub u8);

/// Generation-checked handle to one pool unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct NodeRef {
    pub pool: PoolId,
    pub unit: u32,
    pub generation: u32,
}

/// Handle to series content: either a pool unit or a large-object slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, u8)]
pub enum DataRef {
    Pooled(NodeRef),
    Large { slot: u32, generation: u32 },
}

/// What a pool's units are formatted into, which picks the freed sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitClass {
    /// Series stub headers.
    Stub,
    /// Cell-shaped nodes (pairings).
    Cell,
    /// Raw series content; no header of its own.
    Raw,
}

impl UnitClass {
    #[inline]
    fn freed_byte(self) -> u8 {
        match self {
            UnitClass::Cell => FREED_CELL_BYTE,
            UnitClass::Stub | UnitClass::Raw => FREED_STUB_BYTE,
        }
    }
}

/// One size class: unit width in bytes and units per segment.
#[derive(Debug, Clone, Copy)]
pub struct PoolSpec {
    pub wide: usize,
    pub units: usize,
    pub class: UnitClass,
}

impl PoolSpec {
    pub fn new(wide: usize, units: usize) -> Self {
        PoolSpec {
            wide,
            units,
            class: UnitClass::Raw,
        }
    }

    pub fn with_class(wide: usize, units: usize, class: UnitClass) -> Self {
        PoolSpec { wide, units, class }
    }
}

/// One contiguous chunk of a pool. `words` is boxed and never reallocated.
struct Segment {
    words: Box<[u64]>,
    first_unit: u32,
    units: usize,
}

struct Pool {
    wide: usize,
    units_per_segment: usize,
    class: UnitClass,
    segments: SmallVec<[Segment; 4]>,
    /// Per-unit generation, bumped on free.
    generations: Vec<u32>,
    free_head: Option<u32>,
    free_tail: Option<u32>,
    /// Total units across all segments.
    has: usize,
    /// Units currently on the free list. Invariant: `free_units <= has`.
    free_units: usize,
}

impl Pool {
    fn new(spec: PoolSpec) -> Self {
        let wide = round_to_units(spec.wide).max(MIN_WIDE);
        Pool {
            wide,
            units_per_segment: spec.units.max(1),
            class: spec.class,
            segments: SmallVec::new(),
            generations: Vec::new(),
            free_head: None,
            free_tail: None,
            has: 0,
            free_units: 0,
        }
    }

    fn locate(&self, unit: u32) -> (&Segment, usize) {
        for segment in &self.segments {
            let first = segment.first_unit;
            if unit >= first && (unit - first) < segment.units as u32 {
                return (segment, (unit - first) as usize);
            }
        }
        panic!("unit {} not in any segment", unit);
    }

    fn unit_ptr(&self, unit: u32) -> NonNull<u8> {
        let (segment, slot) = self.locate(unit);
        let base = segment.words.as_ptr() as *mut u8;
        // In-bounds: slot < segment.units and the box holds units * wide bytes.
        unsafe { NonNull::new_unchecked(base.add(slot * self.wide)) }
    }

    fn read_link(&self, unit: u32) -> u32 {
        let p = self.unit_ptr(unit).as_ptr();
        unsafe { ptr::read(p.add(LINK_OFFSET) as *const u32) }
    }

    fn write_link(&mut self, unit: u32, link: u32) {
        let p = self.unit_ptr(unit).as_ptr();
        unsafe { ptr::write(p.add(LINK_OFFSET) as *mut u32, link) }
    }

    fn write_freed_header(&mut self, unit: u32) {
        let p = self.unit_ptr(unit).as_ptr();
        let freed = self.class.freed_byte();
        unsafe { ptr::write(p as *mut [u8; 4], [freed, 0, 0, 0]) }
    }

    /// Allocate one more segment and push its units onto the free-list tail.
    /// Once cumulative bytes cross the ballast budget, segments scale up so
    /// heavy pools stop growing one small chunk at a time.
    fn grow(&mut self, ballast: usize) {
        let scale = if ballast > 0 && self.has * self.wide >= ballast {
            ((self.has * self.wide) / ballast + 1).min(MAX_SCALE)
        } else {
            1
        };
        let units = self.units_per_segment * scale;
        let bytes = units
            .checked_mul(self.wide)
            .unwrap_or_else(|| out_of_memory(usize::MAX));

        let words = vec![0u64; bytes / 8].into_boxed_slice();
        let first_unit = self.has as u32;
        self.segments.push(Segment {
            words,
            first_unit,
            units,
        });
        self.has += units;
        self.generations.resize(self.has, 0);

        for i in 0..units as u32 {
            let unit = first_unit + i;
            self.write_freed_header(unit);
            self.write_link(unit, NO_LINK);
            self.push_free(unit);
        }
    }

    fn push_free(&mut self, unit: u32) {
        match self.free_tail {
            Some(tail) => self.write_link(tail, unit),
            None => self.free_head = Some(unit),
        }
        self.free_tail = Some(unit);
        self.free_units += 1;
    }

    fn alloc(&mut self, ballast: usize) -> u32 {
        if self.free_head.is_none() {
            self.grow(ballast);
        }
        let unit = self.free_head.expect("grow left the free list empty");
        let next = self.read_link(unit);
        self.free_head = (next != NO_LINK).then_some(next);
        if self.free_head.is_none() {
            self.free_tail = None;
        }
        self.free_units -= 1;
        unit
    }

    fn free(&mut self, unit: u32) {
        self.write_freed_header(unit);
        if cfg!(any(debug_assertions, feature = "strict-checks")) {
            // Poison the body past the link field so stale reads are loud.
            let p = self.unit_ptr(unit).as_ptr();
            unsafe {
                ptr::write_bytes(p.add(LINK_OFFSET + 4), 0xBD, self.wide - LINK_OFFSET - 4);
            }
        }
        self.write_link(unit, NO_LINK);
        self.push_free(unit);
        self.generations[unit as usize] = self.generations[unit as usize].wrapping_add(1);
    }
}

/// One slot of the large-object table.
struct LargeSlot {
    words: Option<Box<[u64]>>,
    generation: u32,
}

/// The pool set: every heap allocation in the runtime comes through here.
pub struct Pools {
    pools: Vec<Pool>,
    ballast: usize,
    large: Vec<LargeSlot>,
    large_free: Vec<u32>,
    stub_pool: Option<PoolId>,
    pairing_pool: Option<PoolId>,
}

impl Pools {
    /// Initialize all pools empty from the given table. Verifies the
    /// classifier byte invariants before anything is allowed to allocate.
    pub fn new(config: MemConfig) -> Self {
        verify_byte_invariants();
        assert!(!config.specs.is_empty(), "pool table is empty");

        let mut stub_pool = None;
        let mut pairing_pool = None;
        for (id, spec) in config.specs.iter().enumerate() {
            match spec.class {
                UnitClass::Stub if stub_pool.is_none() => {
                    stub_pool = Some(PoolId(id as u8));
                }
                UnitClass::Cell if pairing_pool.is_none() => {
                    pairing_pool = Some(PoolId(id as u8));
                }
                _ => {}
            }
        }

        Pools {
            pools: config.specs.into_iter().map(Pool::new).collect(),
            ballast: config.ballast,
            large: Vec::new(),
            large_free: Vec::new(),
            stub_pool,
            pairing_pool,
        }
    }

    fn pool(&self, id: PoolId) -> &Pool {
        &self.pools[id.0 as usize]
    }

    fn pool_mut(&mut self, id: PoolId) -> &mut Pool {
        &mut self.pools[id.0 as usize]
    }

    /// Pop a node from the pool's free list, growing the pool by one
    /// segment if it is exhausted. The returned unit still carries its
    /// freed header: the caller owns it and must format it before use.
    pub fn alloc(&mut self, id: PoolId) -> NodeRef {
        let ballast = self.ballast;
        let pool = self.pool_mut(id);
        let unit = pool.alloc(ballast);
        NodeRef {
            pool: id,
            unit,
            generation: pool.generations[unit as usize],
        }
    }

    /// Return a node to its pool. The header is overwritten with the freed
    /// sentinel and the node goes to the free-list tail; the handle's
    /// generation is dead from here on.
    pub fn free(&mut self, node: NodeRef) {
        // A handle whose generation no longer matches is either a double
        // free or a stale reference; both die here.
        self.check_live(node);
        self.pool_mut(node.pool).free(node.unit);
    }

    /// Resolve a handle to its unit's address. Stable across pool growth;
    /// always 8-aligned. Panics if the handle is stale.
    #[inline]
    pub fn unit_ptr(&self, node: NodeRef) -> NonNull<u8> {
        self.check_live(node);
        self.pool(node.pool).unit_ptr(node.unit)
    }

    /// The unit's address as an integer, for diagnostics and tests.
    pub fn unit_addr(&self, node: NodeRef) -> usize {
        self.unit_ptr(node).as_ptr() as usize
    }

    #[inline]
    fn check_live(&self, node: NodeRef) {
        let pool = self.pool(node.pool);
        let current = pool.generations[node.unit as usize];
        assert!(
            current == node.generation,
            "stale node reference (pool {}, unit {}): generation {} vs {}",
            node.pool.0,
            node.unit,
            node.generation,
            current
        );
    }

    /// The unit width of a pool, after rounding.
    pub fn unit_wide(&self, id: PoolId) -> usize {
        self.pool(id).wide
    }

    /// Total units the pool has ever carved out.
    pub fn units_total(&self, id: PoolId) -> usize {
        self.pool(id).has
    }

    /// Units currently free. `units_free + (units held by callers) ==
    /// units_total` at every quiescent point.
    pub fn units_free(&self, id: PoolId) -> usize {
        self.pool(id).free_units
    }

    pub fn segment_count(&self, id: PoolId) -> usize {
        self.pool(id).segments.len()
    }

    /// The pool serving series stub headers under the standard table.
    pub fn stub_pool(&self) -> PoolId {
        self.stub_pool.expect("pool table has no stub class")
    }

    /// The pool serving pairing (2-cell) nodes under the standard table.
    pub fn pairing_pool(&self) -> PoolId {
        self.pairing_pool.expect("pool table has no pairing class")
    }

    // =========================================================================
    // Series content
    // =========================================================================

    /// Smallest raw size class that fits `bytes`, if any.
    pub fn raw_pool_for(&self, bytes: usize) -> Option<PoolId> {
        self.pools
            .iter()
            .enumerate()
            .filter(|(_, p)| p.class == UnitClass::Raw && p.wide >= bytes)
            .min_by_key(|(_, p)| p.wide)
            .map(|(id, _)| PoolId(id as u8))
    }

    /// Allocate content storage: a pool unit when a size class fits,
    /// otherwise a slot in the large-object table.
    pub fn alloc_data(&mut self, bytes: usize) -> DataRef {
        if let Some(id) = self.raw_pool_for(bytes) {
            return DataRef::Pooled(self.alloc(id));
        }
        let words = bytes
            .checked_add(7)
            .map(|b| b / 8)
            .unwrap_or_else(|| out_of_memory(bytes));
        let boxed = vec![0u64; words].into_boxed_slice();
        if let Some(slot) = self.large_free.pop() {
            let entry = &mut self.large[slot as usize];
            entry.words = Some(boxed);
            return DataRef::Large {
                slot,
                generation: entry.generation,
            };
        }
        let slot = self.large.len() as u32;
        self.large.push(LargeSlot {
            words: Some(boxed),
            generation: 0,
        });
        DataRef::Large {
            slot,
            generation: 0,
        }
    }

    /// Release content storage.
    pub fn free_data(&mut self, data: DataRef) {
        match data {
            DataRef::Pooled(node) => self.free(node),
            DataRef::Large { slot, generation } => {
                let entry = &mut self.large[slot as usize];
                assert!(
                    entry.generation == generation && entry.words.is_some(),
                    "stale large-object reference (slot {})",
                    slot
                );
                entry.words = None;
                entry.generation = entry.generation.wrapping_add(1);
                self.large_free.push(slot);
            }
        }
    }

    /// Address of content storage.
    #[inline]
    pub fn data_ptr(&self, data: DataRef) -> NonNull<u8> {
        match data {
            DataRef::Pooled(node) => self.unit_ptr(node),
            DataRef::Large { slot, generation } => {
                let entry = &self.large[slot as usize];
                assert!(
                    entry.generation == generation,
                    "stale large-object reference (slot {})",
                    slot
                );
                let words = entry.words.as_ref().expect("freed large-object slot");
                unsafe { NonNull::new_unchecked(words.as_ptr() as *mut u8) }
            }
        }
    }

    /// Usable byte capacity of content storage.
    pub fn data_capacity(&self, data: DataRef) -> usize {
        match data {
            DataRef::Pooled(node) => self.pool(node.pool).wide,
            DataRef::Large { slot, .. } => {
                self.large[slot as usize]
                    .words
                    .as_ref()
                    .map_or(0, |w| w.len() * 8)
            }
        }
    }

    // =========================================================================
    // Header byte access (GC cooperation, sweep scans)
    // =========================================================================

    /// Leading header byte of a unit, without a liveness check — the sweep
    /// uses this to find out *whether* the unit is live.
    pub(crate) fn raw_header_byte(&self, id: PoolId, unit: u32) -> u8 {
        let p = self.pool(id).unit_ptr(unit).as_ptr();
        unsafe { *p }
    }

    pub(crate) fn set_header_flag(&mut self, node: NodeRef, flag: u8) {
        self.check_live(node);
        let p = self.unit_ptr(node).as_ptr();
        unsafe { *p |= flag };
    }

    pub(crate) fn clear_header_flag(&mut self, node: NodeRef, flag: u8) {
        self.check_live(node);
        let p = self.unit_ptr(node).as_ptr();
        unsafe { *p &= !flag };
    }

    pub(crate) fn get_header_flag(&self, node: NodeRef, flag: u8) -> bool {
        self.check_live(node);
        let p = self.unit_ptr(node).as_ptr();
        unsafe { *p & flag != 0 }
    }

    /// Current handle for a unit the sweep found live.
    pub(crate) fn current_ref(&self, id: PoolId, unit: u32) -> NodeRef {
        NodeRef {
            pool: id,
            unit,
            generation: self.pool(id).generations[unit as usize],
        }
    }

    pub(crate) fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub(crate) fn pool_class(&self, id: PoolId) -> UnitClass {
        self.pool(id).class
    }
}
