//! Cross-file relationship detection and unified view generation.
//!
//! Detection finds candidate key pairs across a project's cleaned tables,
//! validates them referentially, and orients them from the referencing
//! (many) side to the referenced (one) side. View generation folds the
//! valid relationships into deterministic LEFT JOIN SQL around a fact
//! table.

pub mod relationships;
pub mod view;

pub use relationships::{DetectedRelationship, TableRef, VALID_MATCH_RATE, detect_relationships};
pub use view::{GeneratedView, JoinEdge, ViewTable, build_views, validate_manual_edges};
