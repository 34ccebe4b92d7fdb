//! Embedded business-domain libraries.
//!
//! Three JSON tables ship inside the crate: the domain signature library
//! used by the classifier, the per-domain KPI library, and the per-domain
//! synonym maps used to resolve arbitrary user columns onto canonical
//! names. [`StandardsRegistry::load_default`] parses and validates all of
//! them; a library that fails validation is a build defect, not a runtime
//! condition.

pub mod error;
pub mod kpis;
pub mod registry;
pub mod signatures;
pub mod synonyms;

pub use error::LibraryError;
pub use kpis::{KpiDefinition, KpiLibrary};
pub use registry::StandardsRegistry;
pub use signatures::{DomainSignature, SignatureLibrary};
pub use synonyms::{SynonymEntry, SynonymLibrary};
