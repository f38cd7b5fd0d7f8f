//! Word-spelling interning.
//!
//! Every word cell carries a [`Spelling`] — an id into the process-wide
//! spelling table — so word comparison is an integer compare and a spelling
//! is stored exactly once. The name is held as an `Rc<str>` shared between
//! the lookup map and the id-indexed vector: one allocation per distinct
//! spelling.

use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::FxHashMap;

/// Interned spelling id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Spelling(pub u32);

/// Fresh spellings for binder-generated words start well past any table
/// id so they can never collide with interned names.
static FRESH_COUNTER: AtomicU32 = AtomicU32::new(1_000_000);

/// A unique spelling with no table entry. `SpellingTable::name` returns
/// `None` for these.
pub fn fresh_spelling() -> Spelling {
    Spelling(FRESH_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// The spelling table.
#[derive(Debug, Default)]
pub struct SpellingTable {
    map: FxHashMap<Rc<str>, Spelling>,
    names: Vec<Rc<str>>,
}

impl SpellingTable {
    pub fn new() -> Self {
        SpellingTable {
            map: FxHashMap::default(),
            names: Vec::new(),
        }
    }

    /// Intern a spelling, returning its id.
    pub fn intern(&mut self, name: &str) -> Spelling {
        if let Some(&id) = self.map.get(name) {
            return id;
        }
        let id = Spelling(self.names.len() as u32);
        let shared: Rc<str> = Rc::from(name);
        self.names.push(shared.clone());
        self.map.insert(shared, id);
        id
    }

    /// The spelling's text, if it was interned here (fresh spellings have
    /// no text).
    pub fn name(&self, id: Spelling) -> Option<&str> {
        self.names.get(id.0 as usize).map(|s| s.as_ref())
    }

    /// Look up an existing spelling without interning.
    pub fn get(&self, name: &str) -> Option<Spelling> {
        self.map.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
