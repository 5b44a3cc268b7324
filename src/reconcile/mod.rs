//! Identity reconciliation for one pulled batch of atoms.
//!
//! Three stages run in sequence over a batch sharing one tag id: rewrite
//! isolated identities to their hosts, sort the batch into its total order,
//! then collapse adjacent duplicates by summing additive fields. For
//! example, with a scalar identity at position 1 and additive fields
//! `{3, 4}`, the pulled events
//!
//! ```text
//! [id=50,        fg, 100, 200]
//! [id=50_child,  fg, 100, 200]   (isolated, maps to 50)
//! [id=50,        bg, 100, 200]
//! ```
//!
//! reconcile to
//!
//! ```text
//! [id=50, fg, 200, 400]
//! [id=50, bg, 100, 200]
//! ```

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, error};

use crate::atom::{Atom, TagId, Value};
use crate::registry::{IdentityKind, SchemaRegistry};
use crate::resolver::IdentityResolver;

/// Fatal-batch conditions. Any of these aborts the call; the caller must
/// discard the batch rather than report it.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("mismatched atom in batch: expected tag {expected}, got {found}")]
    SchemaMismatch { expected: TagId, found: TagId },

    #[error("atom {tag_id}: identity field {position} out of range ({field_count} fields)")]
    IdentityOutOfRange {
        tag_id: TagId,
        position: u32,
        field_count: usize,
    },

    #[error("atom {tag_id}: identity field {position} is not an integer")]
    IdentityNotInteger { tag_id: TagId, position: u32 },
}

/// What `normalize_and_merge` did with the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The tag has no identity schema; the batch was left untouched.
    NotApplicable,
    /// The batch was normalized, sorted and merged in place.
    Reconciled { atoms_in: usize, atoms_out: usize },
}

/// Rewrites every isolated identity in `batch` to its host, then merges
/// atoms that became duplicates, summing the schema's additive fields.
///
/// The batch is mutated in place. On error the batch may be partially
/// normalized and must not be reported. Tags without an identity schema are
/// passed through untouched ([`Outcome::NotApplicable`]).
pub fn normalize_and_merge(
    batch: &mut Vec<Atom>,
    registry: &dyn SchemaRegistry,
    resolver: &dyn IdentityResolver,
    tag_id: TagId,
) -> Result<Outcome, ReconcileError> {
    let Some(schema) = registry.schema(tag_id) else {
        debug!(tag_id, "unknown pull atom tag, batch passed through");
        return Ok(Outcome::NotApplicable);
    };

    let Some(identity) = schema.identity else {
        debug!(tag_id, "no identity to attribute, batch passed through");
        return Ok(Outcome::NotApplicable);
    };

    let atoms_in = batch.len();

    normalize_identities(batch, resolver, tag_id, identity)?;

    // Stable sort; fully equal atoms keep their relative order and merge
    // trivially in the next pass.
    batch.sort();

    let merged = merge_adjacent(std::mem::take(batch), &schema.additive_fields);
    *batch = merged;

    debug!(tag_id, atoms_in, atoms_out = batch.len(), "batch reconciled");

    Ok(Outcome::Reconciled {
        atoms_in,
        atoms_out: batch.len(),
    })
}

/// Stage 1: rewrite identity fields in place via the resolver.
fn normalize_identities(
    batch: &mut [Atom],
    resolver: &dyn IdentityResolver,
    tag_id: TagId,
    identity: IdentityKind,
) -> Result<(), ReconcileError> {
    for atom in batch.iter_mut() {
        if atom.tag_id != tag_id {
            error!(
                expected = tag_id,
                found = atom.tag_id,
                "mismatched atom in pulled batch"
            );
            return Err(ReconcileError::SchemaMismatch {
                expected: tag_id,
                found: atom.tag_id,
            });
        }

        match identity {
            IdentityKind::Scalar { position } => rewrite_scalar(atom, resolver, position)?,
            IdentityKind::Chain { position } => rewrite_chain(atom, resolver, position),
        }
    }

    Ok(())
}

/// Rewrites the single identity field at a fixed 1-based position.
fn rewrite_scalar(
    atom: &mut Atom,
    resolver: &dyn IdentityResolver,
    position: u32,
) -> Result<(), ReconcileError> {
    let field_count = atom.fields.len();
    // Positions are 1-based; position 0 wraps to usize::MAX and fails the
    // range check like any other out-of-range slot.
    let index = (position as usize).wrapping_sub(1);
    let Some(field) = atom.fields.get_mut(index) else {
        error!(
            tag_id = atom.tag_id,
            position, field_count, "identity field missing from atom"
        );
        return Err(ReconcileError::IdentityOutOfRange {
            tag_id: atom.tag_id,
            position,
            field_count,
        });
    };

    let Some(id) = field.value.as_int() else {
        error!(
            tag_id = atom.tag_id,
            position, "identity field has wrong value type"
        );
        return Err(ReconcileError::IdentityNotInteger {
            tag_id: atom.tag_id,
            position,
        });
    };

    field.value = Value::Int(resolver.host_id_or_self(id));
    Ok(())
}

/// Rewrites every identity slot inside the chain rooted at `chain_position`.
/// Fields are in structural order, so scanning stops once the depth-0
/// position moves past the chain's span.
fn rewrite_chain(atom: &mut Atom, resolver: &dyn IdentityResolver, chain_position: u32) {
    for field in atom.fields.iter_mut() {
        if field.path.position() > chain_position {
            break;
        }

        if !field.path.is_chain_identity(chain_position) {
            continue;
        }

        if let Some(id) = field.value.as_int() {
            field.value = Value::Int(resolver.host_id_or_self(id));
        }
    }
}

/// Stage 3: collapse each maximal run of adjacent merge-eligible atoms into
/// one. Atom `i` folds into `i + 1`, so a run of `k` atoms accumulates its
/// sums rightward into the run's last member. The final atom is always
/// emitted.
fn merge_adjacent(batch: Vec<Atom>, additive: &BTreeSet<u32>) -> Vec<Atom> {
    let mut merged = Vec::with_capacity(batch.len());
    let mut atoms = batch.into_iter();

    let Some(mut pending) = atoms.next() else {
        return merged;
    };

    for mut next in atoms {
        if merge_eligible(&pending, &next, additive) {
            fold_into(&pending, &mut next, additive);
        } else {
            merged.push(pending);
        }
        pending = next;
    }

    merged.push(pending);
    merged
}

/// Two adjacent atoms merge iff they have the same field count and every
/// position at which they differ is additive.
fn merge_eligible(lhs: &Atom, rhs: &Atom, additive: &BTreeSet<u32>) -> bool {
    // Different field counts mean different chain shapes.
    if lhs.fields.len() != rhs.fields.len() {
        return false;
    }

    lhs.fields
        .iter()
        .zip(&rhs.fields)
        .all(|(l, r)| l == r || additive.contains(&l.path.position()))
}

/// Sums `lhs`'s additive fields into `rhs`. Non-additive fields are, by
/// eligibility, already identical.
fn fold_into(lhs: &Atom, rhs: &mut Atom, additive: &BTreeSet<u32>) {
    for (l, r) in lhs.fields.iter().zip(rhs.fields.iter_mut()) {
        if additive.contains(&l.path.position()) {
            r.value.accumulate(&l.value);
        }
    }
}
