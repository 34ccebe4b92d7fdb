//! Opaque entity identifiers.
//!
//! Every persisted entity is addressed by a stable UUID wrapped in a
//! dedicated newtype so that identifiers of different entities cannot be
//! mixed up at compile time.

use std::fmt;

use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Renders the identifier without dashes, for use in generated
            /// table names.
            pub fn simple(&self) -> String {
                self.0.simple().to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(value)?))
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`crate::entities::Project`].
    ProjectId
);
entity_id!(
    /// Identifier of an [`crate::entities::Upload`].
    UploadId
);
entity_id!(
    /// Identifier of a [`crate::entities::CleaningJob`].
    CleaningJobId
);
entity_id!(
    /// Identifier of a [`crate::entities::DomainDetectionJob`].
    DomainJobId
);
entity_id!(
    /// Identifier of a [`crate::entities::KpiExtractionJob`].
    KpiJobId
);
entity_id!(
    /// Identifier of a [`crate::entities::KpiSelection`].
    SelectionId
);
entity_id!(
    /// Identifier of a [`crate::entities::Relationship`].
    RelationshipId
);
entity_id!(
    /// Identifier of a [`crate::entities::UnifiedView`].
    ViewId
);
entity_id!(
    /// Identifier of a [`crate::entities::Dashboard`].
    DashboardId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = ProjectId::new();
        let b = ProjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn id_roundtrips_through_display() {
        let id = UploadId::new();
        let parsed: UploadId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn simple_form_has_no_dashes() {
        let id = CleaningJobId::new();
        assert!(!id.simple().contains('-'));
        assert_eq!(id.simple().len(), 32);
    }
}
