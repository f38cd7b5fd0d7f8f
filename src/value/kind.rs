//! The kind byte: datatype tags and their category predicates.
//!
//! Kind discriminants are assigned in one fixed order so that every
//! category test is a closed range check over the raw byte. The ordering
//! is load-bearing: all range predicates live in this module and nowhere
//! else, and reordering the enumeration means updating the ranges here —
//! by design, so the coupling has exactly one home.
//!
//! Byte 0 is not a kind: it is the end-of-array signal
//! ([`crate::node::END_SUBCLASS`]).

/// Datatype tag. `#[repr(u8)]` — the discriminant is the kind byte stored
/// in a cell's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Kind {
    // Inert values.
    Blank = 1,
    Logic = 2,
    Integer = 3,
    Decimal = 4,
    Char = 5,
    Time = 6,
    Date = 7,
    Bitset = 8,
    Handle = 9,
    Map = 10,

    // Word kinds (bindable).
    Word = 11,
    SetWord = 12,
    GetWord = 13,
    Issue = 14,

    // Array kinds (bindable).
    Block = 15,
    Group = 16,
    Path = 17,

    // String kinds.
    Text = 18,
    Tag = 19,
    Binary = 20,

    // Contexts and functions.
    Context = 21,
    Frame = 22,
    Action = 23,

    // Deep-quote fallback wrapper.
    Escaped = 24,
}

/// One past the highest kind byte; sizes the hook table.
pub const KIND_LIMIT: usize = 25;

const INERT_MIN: u8 = Kind::Blank as u8;
const INERT_MAX: u8 = Kind::Map as u8;
const WORD_MIN: u8 = Kind::Word as u8;
const WORD_MAX: u8 = Kind::Issue as u8;
const ARRAY_MIN: u8 = Kind::Block as u8;
const ARRAY_MAX: u8 = Kind::Path as u8;
const STRING_MIN: u8 = Kind::Text as u8;
const STRING_MAX: u8 = Kind::Tag as u8;
const SERIES_MIN: u8 = Kind::Block as u8;
const SERIES_MAX: u8 = Kind::Binary as u8;
const CONTEXT_MIN: u8 = Kind::Context as u8;
const CONTEXT_MAX: u8 = Kind::Frame as u8;
const BINDABLE_MIN: u8 = Kind::Word as u8;
const BINDABLE_MAX: u8 = Kind::Path as u8;

impl Kind {
    /// The raw kind byte.
    #[inline]
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Recover a kind from its byte. Returns `None` for the end signal
    /// and for bytes past the enumeration.
    #[inline]
    pub fn from_byte(byte: u8) -> Option<Kind> {
        match byte {
            1 => Some(Kind::Blank),
            2 => Some(Kind::Logic),
            3 => Some(Kind::Integer),
            4 => Some(Kind::Decimal),
            5 => Some(Kind::Char),
            6 => Some(Kind::Time),
            7 => Some(Kind::Date),
            8 => Some(Kind::Bitset),
            9 => Some(Kind::Handle),
            10 => Some(Kind::Map),
            11 => Some(Kind::Word),
            12 => Some(Kind::SetWord),
            13 => Some(Kind::GetWord),
            14 => Some(Kind::Issue),
            15 => Some(Kind::Block),
            16 => Some(Kind::Group),
            17 => Some(Kind::Path),
            18 => Some(Kind::Text),
            19 => Some(Kind::Tag),
            20 => Some(Kind::Binary),
            21 => Some(Kind::Context),
            22 => Some(Kind::Frame),
            23 => Some(Kind::Action),
            24 => Some(Kind::Escaped),
            _ => None,
        }
    }

    /// Lowercase datatype name for messages and molding.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Blank => "blank",
            Kind::Logic => "logic",
            Kind::Integer => "integer",
            Kind::Decimal => "decimal",
            Kind::Char => "char",
            Kind::Time => "time",
            Kind::Date => "date",
            Kind::Bitset => "bitset",
            Kind::Handle => "handle",
            Kind::Map => "map",
            Kind::Word => "word",
            Kind::SetWord => "set-word",
            Kind::GetWord => "get-word",
            Kind::Issue => "issue",
            Kind::Block => "block",
            Kind::Group => "group",
            Kind::Path => "path",
            Kind::Text => "text",
            Kind::Tag => "tag",
            Kind::Binary => "binary",
            Kind::Context => "context",
            Kind::Frame => "frame",
            Kind::Action => "action",
            Kind::Escaped => "escaped",
        }
    }

    /// Evaluates to itself.
    #[inline]
    pub fn is_inert(self) -> bool {
        (INERT_MIN..=INERT_MAX).contains(&(self as u8))
    }

    #[inline]
    pub fn is_word_kind(self) -> bool {
        (WORD_MIN..=WORD_MAX).contains(&(self as u8))
    }

    #[inline]
    pub fn is_array_kind(self) -> bool {
        (ARRAY_MIN..=ARRAY_MAX).contains(&(self as u8))
    }

    #[inline]
    pub fn is_string_kind(self) -> bool {
        (STRING_MIN..=STRING_MAX).contains(&(self as u8))
    }

    /// Backed by a series stub (arrays, strings, binaries).
    #[inline]
    pub fn is_series_kind(self) -> bool {
        (SERIES_MIN..=SERIES_MAX).contains(&(self as u8))
    }

    #[inline]
    pub fn is_context_kind(self) -> bool {
        (CONTEXT_MIN..=CONTEXT_MAX).contains(&(self as u8))
    }

    /// Carries a binding in the extra slot (words and arrays).
    #[inline]
    pub fn is_bindable(self) -> bool {
        (BINDABLE_MIN..=BINDABLE_MAX).contains(&(self as u8))
    }
}
