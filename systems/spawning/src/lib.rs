#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic content generation for freshly discovered cells.
//!
//! [`generate`] maps an arbitrary key to a reproducible value in `[0, 1)` and
//! [`SpawnPolicy`] uses it to decide whether a coordinate holds items and how
//! many. Both are pure: the same key yields the same value in every run.

use geocache_core::{CellCoord, WorldConfig};
use sha2::{Digest, Sha256};

const INITIAL_COUNT_LABEL: &str = ":initial";

/// Maps `key` to a reproducible value in `[0, 1)`.
///
/// The key bytes are hashed with SHA-256 and the top 53 bits of the first
/// eight digest bytes become the mantissa of the result, so neighbouring keys
/// such as `"0:0"` and `"0:1"` produce unrelated values.
#[must_use]
pub fn generate(key: &str) -> f64 {
    const SCALE: f64 = 1.0 / ((1u64 << 53) as f64);

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let value = u64::from_le_bytes(bytes) >> 11;
    (value as f64) * SCALE
}

/// Outcome of the one-time spawn decision for a coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnDecision {
    /// The cell exists but holds no items.
    Empty,
    /// The cell starts with the provided number of items.
    Populated {
        /// Number of items to create, always at least one.
        items: u32,
    },
}

impl SpawnDecision {
    /// Number of items the decision creates.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        match self {
            Self::Empty => 0,
            Self::Populated { items } => *items,
        }
    }
}

/// Decides the initial content of newly discovered cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPolicy {
    probability: f64,
    max_items: u32,
}

impl SpawnPolicy {
    /// Creates a policy populating cells with `probability` and at most `max_items` items.
    ///
    /// `max_items` is clamped to at least one so populated cells never end up empty.
    #[must_use]
    pub fn new(probability: f64, max_items: u32) -> Self {
        Self {
            probability,
            max_items: max_items.max(1),
        }
    }

    /// Builds the policy described by a world configuration.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.spawn_probability, config.max_items)
    }

    /// Upper bound of items in a populated cell.
    #[must_use]
    pub const fn max_items(&self) -> u32 {
        self.max_items
    }

    /// Decides the content of `cell`.
    ///
    /// The decision depends only on the coordinate key and the policy
    /// parameters, so repeated calls always agree.
    #[must_use]
    pub fn decide(&self, cell: CellCoord) -> SpawnDecision {
        let key = cell.key();
        if generate(&key) >= self.probability {
            return SpawnDecision::Empty;
        }

        let roll = generate(&format!("{key}{INITIAL_COUNT_LABEL}"));
        let scaled = (roll * f64::from(self.max_items)).floor() as u32;
        SpawnDecision::Populated {
            items: scaled.min(self.max_items - 1) + 1,
        }
    }
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        Self::from_config(&WorldConfig::default())
    }
}
