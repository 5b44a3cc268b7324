//! Pulled-atom representation.
//!
//! An [`Atom`] is one structured measurement instance: a schema tag plus an
//! ordered sequence of [`FieldValue`] pairs. A pulled batch is a `Vec<Atom>`
//! whose members all share one tag id; the batch is owned by the caller and
//! mutated in place by the reconcile transform.

pub mod field;

use std::cmp::Ordering;

pub use field::{FieldPath, Value};

/// Identifies which schema a batch of atoms conforms to.
pub type TagId = u32;

/// One field of an atom: a structural position and its typed value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldValue {
    pub path: FieldPath,
    pub value: Value,
}

impl FieldValue {
    pub fn new(path: FieldPath, value: Value) -> Self {
        Self { path, value }
    }
}

/// One structured measurement instance pulled from the system.
#[derive(Debug, Clone)]
pub struct Atom {
    pub tag_id: TagId,
    pub fields: Vec<FieldValue>,
}

impl Atom {
    pub fn new(tag_id: TagId, fields: Vec<FieldValue>) -> Self {
        Self { tag_id, fields }
    }

    /// Convenience constructor for atoms whose fields are all top-level,
    /// positions assigned 1..=n in order.
    pub fn from_values(tag_id: TagId, values: Vec<Value>) -> Self {
        let fields = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| FieldValue::new(FieldPath::at(i as u32 + 1), value))
            .collect();
        Self { tag_id, fields }
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Atom {}

impl PartialOrd for Atom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order over atoms: shorter atoms first, then lexicographic over the
/// `(path, value)` sequence. The tag id does not participate; it is uniform
/// within a batch. This order brings merge-eligible atoms adjacent.
impl Ord for Atom {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fields
            .len()
            .cmp(&other.fields.len())
            .then_with(|| self.fields.cmp(&other.fields))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn atom(values: &[i64]) -> Atom {
        Atom::from_values(10, values.iter().map(|&v| Value::Int(v)).collect())
    }

    #[test]
    fn test_from_values_assigns_positions() {
        let a = atom(&[50, 1, 100]);
        assert_eq!(a.fields.len(), 3);
        assert_eq!(a.fields[0].path, FieldPath::at(1));
        assert_eq!(a.fields[2].path, FieldPath::at(3));
        assert_eq!(a.fields[2].value, Value::Int(100));
    }

    #[test]
    fn test_shorter_atom_sorts_first() {
        let short = atom(&[9, 9]);
        let long = atom(&[1, 1, 1]);
        assert!(short < long);
    }

    #[test]
    fn test_equal_length_lexicographic() {
        assert!(atom(&[1, 2, 3]) < atom(&[1, 2, 4]));
        assert!(atom(&[1, 2, 3]) < atom(&[2, 0, 0]));
        assert_eq!(atom(&[1, 2, 3]), atom(&[1, 2, 3]));
    }

    #[test]
    fn test_tag_id_not_part_of_order() {
        let a = Atom::from_values(10, vec![Value::Int(1)]);
        let b = Atom::from_values(11, vec![Value::Int(1)]);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_sort_brings_duplicates_adjacent() {
        let mut batch = vec![atom(&[50, 1, 100]), atom(&[60, 1, 100]), atom(&[50, 1, 100])];
        batch.sort();
        assert_eq!(batch[0], batch[1]);
        assert_eq!(batch[2].fields[0].value, Value::Int(60));
    }
}
