//! Field addressing and value typing for pulled atoms.
//!
//! A [`FieldPath`] names a structural position inside an atom, including the
//! nesting levels used by repeated identity-chain entries. A [`Value`] is the
//! typed payload at that position. Both carry a total order so that whole
//! atoms can be sorted deterministically before merging.

use std::cmp::Ordering;

/// Maximum structural nesting depth: top-level position, repeated-entry
/// index, position within the entry.
pub const MAX_DEPTH: usize = 3;

/// Position inside a chain entry that holds the identity value.
pub const CHAIN_IDENTITY_SLOT: u32 = 1;

/// Structural position of a field inside an atom.
///
/// Positions are 1-based at every level. Unused levels are zero so the
/// derived lexicographic order is well defined across depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    pos: [u32; MAX_DEPTH],
    depth: u8,
}

impl FieldPath {
    /// A top-level field at the given 1-based position.
    pub fn at(position: u32) -> Self {
        Self {
            pos: [position, 0, 0],
            depth: 1,
        }
    }

    /// A field inside one entry of a repeated chain: `chain_position` is the
    /// top-level position of the chain, `index` the 1-based entry index and
    /// `slot` the 1-based position within the entry.
    pub fn chain_entry(chain_position: u32, index: u32, slot: u32) -> Self {
        Self {
            pos: [chain_position, index, slot],
            depth: 3,
        }
    }

    /// Number of populated levels (1 for a top-level field).
    pub fn depth(&self) -> usize {
        usize::from(self.depth)
    }

    /// Position at depth 0, i.e. which top-level field this path belongs to.
    pub fn position(&self) -> u32 {
        self.pos[0]
    }

    /// Position at the given level, if populated.
    pub fn pos_at(&self, level: usize) -> Option<u32> {
        if level < self.depth() {
            Some(self.pos[level])
        } else {
            None
        }
    }

    /// True when this path addresses the identity slot of a chain entry
    /// rooted at `chain_position`.
    pub fn is_chain_identity(&self, chain_position: u32) -> bool {
        self.depth == 3
            && self.pos[0] == chain_position
            && self.pos[2] == CHAIN_IDENTITY_SLOT
    }
}

/// Typed scalar value carried by one field of an atom.
///
/// Integer accumulation wraps on overflow; float accumulation uses native
/// `f64` addition. Ordering is total: variants rank `Int < Float < Str <
/// Bytes`, floats compare via `f64::total_cmp`.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::Float(_) => 1,
            Self::Str(_) => 2,
            Self::Bytes(_) => 3,
        }
    }

    /// Integer payload, if this value is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Adds `other` into `self` for additive merging. Mismatched or
    /// non-numeric pairs are left untouched.
    pub fn accumulate(&mut self, other: &Value) {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => *a = a.wrapping_add(*b),
            (Self::Float(a), Self::Float(b)) => *a += *b,
            _ => {}
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            // Bit equality keeps Eq consistent with total_cmp ordering.
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}
