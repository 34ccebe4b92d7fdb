//! Domain signature library.
//!
//! Each business domain is described by high-signal primary columns,
//! supportive secondary columns, and fuzzy keywords matched as substrings
//! of normalised column names. Declaration order is significant: score ties
//! are broken by the order domains appear in the library.

use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};

const SIGNATURES_JSON: &str = include_str!("../data/domain_signatures.json");

/// Signature of one business domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSignature {
    pub domain: String,
    pub label: String,
    pub primary_columns: Vec<String>,
    pub secondary_columns: Vec<String>,
    pub keywords: Vec<String>,
}

/// The full signature library, in declaration order.
#[derive(Debug, Clone)]
pub struct SignatureLibrary {
    domains: Vec<DomainSignature>,
}

impl SignatureLibrary {
    pub fn load_default() -> Result<Self> {
        let domains: Vec<DomainSignature> =
            serde_json::from_str(SIGNATURES_JSON).map_err(|source| LibraryError::Parse {
                name: "domain_signatures",
                source,
            })?;
        let library = Self { domains };
        library.validate()?;
        Ok(library)
    }

    /// Builds a library from explicit signatures, for tests.
    pub fn from_signatures(domains: Vec<DomainSignature>) -> Result<Self> {
        let library = Self { domains };
        library.validate()?;
        Ok(library)
    }

    fn validate(&self) -> Result<()> {
        if self.domains.is_empty() {
            return Err(LibraryError::Invalid("signature library is empty".into()));
        }
        let mut seen = std::collections::BTreeSet::new();
        for signature in &self.domains {
            if !seen.insert(signature.domain.as_str()) {
                return Err(LibraryError::Invalid(format!(
                    "duplicate domain key {}",
                    signature.domain
                )));
            }
            if signature.primary_columns.is_empty() {
                return Err(LibraryError::Invalid(format!(
                    "domain {} has no primary columns",
                    signature.domain
                )));
            }
        }
        Ok(())
    }

    /// Signatures in declaration order.
    pub fn domains(&self) -> &[DomainSignature] {
        &self.domains
    }

    pub fn get(&self, domain: &str) -> Option<&DomainSignature> {
        self.domains.iter().find(|sig| sig.domain == domain)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.get(domain).is_some()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
