//! Combined, cross-validated view of the three embedded libraries.

use crate::error::{LibraryError, Result};
use crate::kpis::KpiLibrary;
use crate::signatures::SignatureLibrary;
use crate::synonyms::SynonymLibrary;

/// All standards used by the pipeline, loaded and cross-checked once at
/// startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct StandardsRegistry {
    pub signatures: SignatureLibrary,
    pub kpis: KpiLibrary,
    pub synonyms: SynonymLibrary,
}

impl StandardsRegistry {
    pub fn load_default() -> Result<Self> {
        let registry = Self {
            signatures: SignatureLibrary::load_default()?,
            kpis: KpiLibrary::load_default()?,
            synonyms: SynonymLibrary::load_default()?,
        };
        registry.cross_validate()?;
        Ok(registry)
    }

    /// Every KPI domain must have both a signature and a synonym table, so
    /// that a confirmed classification can always feed extraction.
    fn cross_validate(&self) -> Result<()> {
        for domain in self.kpis.domains() {
            if !self.signatures.contains(domain) {
                return Err(LibraryError::Invalid(format!(
                    "KPI library references domain {domain} absent from signatures"
                )));
            }
            if self.synonyms.for_domain(domain).is_none() {
                return Err(LibraryError::Invalid(format!(
                    "domain {domain} has no synonym table"
                )));
            }
        }
        Ok(())
    }
}
