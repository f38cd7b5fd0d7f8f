//! Memory configuration.
//!
//! The pool table and growth budget are data, not code: [`Pools::new`]
//! takes a [`MemConfig`] so hosts (and tests) can run with any size-class
//! layout. `MemConfig::default()` is the standard table; `from_env` applies
//! environment overrides on top of it.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `QUILL_BALLAST` | Pool bytes before emergency segment scaling | 4194304 (4MB) |
//! | `QUILL_STUB_UNITS` | Series stubs per stub-pool segment | 512 |
//!
//! [`Pools::new`]: crate::pool::Pools::new

use std::env;
use std::mem::size_of;

use crate::pool::{PoolSpec, UnitClass};
use crate::series::Stub;
use crate::value::Cell;

/// Default ballast budget: once a pool holds this many bytes, further
/// growth allocates proportionally larger segments.
pub const DEFAULT_BALLAST: usize = 4 * 1024 * 1024;

/// Default stub-pool segment population.
pub const DEFAULT_STUB_UNITS: usize = 512;

/// Raw content size classes: unit width in bytes, units per segment.
/// Widths double; populations halve, so every segment is 16KB.
const RAW_CLASSES: [(usize, usize); 9] = [
    (16, 1024),
    (32, 512),
    (64, 256),
    (128, 128),
    (256, 64),
    (512, 32),
    (1024, 16),
    (2048, 8),
    (4096, 4),
];

/// Configuration for the pool set.
#[derive(Debug, Clone)]
pub struct MemConfig {
    /// One entry per pool, in pool-id order.
    pub specs: Vec<PoolSpec>,
    /// Cumulative-bytes threshold for emergency segment scaling.
    pub ballast: usize,
}

impl MemConfig {
    /// The standard pool table: a stub pool, a pairing pool, then the raw
    /// content classes.
    pub fn standard() -> Self {
        let mut specs = Vec::with_capacity(2 + RAW_CLASSES.len());
        specs.push(PoolSpec::with_class(
            round_to_units(size_of::<Stub>()),
            DEFAULT_STUB_UNITS,
            UnitClass::Stub,
        ));
        specs.push(PoolSpec::with_class(
            2 * size_of::<Cell>(),
            128,
            UnitClass::Cell,
        ));
        for (wide, units) in RAW_CLASSES {
            specs.push(PoolSpec::new(wide, units));
        }
        MemConfig {
            specs,
            ballast: DEFAULT_BALLAST,
        }
    }

    /// Standard table with environment overrides applied.
    ///
    /// Unparseable values fall back to the defaults; there is no partial
    /// failure mode here.
    pub fn from_env() -> Self {
        let mut config = Self::standard();
        if let Some(ballast) = env_usize("QUILL_BALLAST") {
            config.ballast = ballast;
        }
        if let Some(units) = env_usize("QUILL_STUB_UNITS") {
            if units > 0 {
                config.specs[0].units = units;
            }
        }
        config
    }
}

impl Default for MemConfig {
    fn default() -> Self {
        Self::standard()
    }
}

fn env_usize(name: &str) -> Option<usize> {
    env::var(name).ok()?.parse().ok()
}

/// Round a byte width up to the 8-byte unit granularity.
pub(crate) fn round_to_units(bytes: usize) -> usize {
    (bytes + 7) & !7
}
