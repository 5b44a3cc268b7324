//! Identity reconciliation and duplicate merging for pulled telemetry atoms.
//!
//! A metrics puller hands this crate one batch of structured records
//! ("atoms") sharing a schema tag. Atoms emitted under a transient isolated
//! identity are attributed back to their stable host, the batch is sorted
//! into a deterministic total order, and adjacent duplicates are collapsed
//! by summing the schema's additive fields. The batch is mutated in place;
//! the crate keeps no state across invocations.
//!
//! The pulling loop, transport and persistence live outside this crate. The
//! two capabilities it consumes are injected: a read-only
//! [`registry::SchemaRegistry`] describing each tag's identity layout and
//! additive fields, and an [`resolver::IdentityResolver`] mapping isolated
//! identities to their hosts.

pub mod atom;
pub mod reconcile;
pub mod registry;
pub mod resolver;

pub use atom::{Atom, FieldPath, FieldValue, TagId, Value};
pub use reconcile::{normalize_and_merge, Outcome, ReconcileError};
pub use registry::{AtomSchema, IdentityKind, SchemaRegistry, StaticRegistry};
pub use resolver::{IdentityResolver, IsolatedIdMap};
