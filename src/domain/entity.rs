//! Domain Layer - Core Entity Trait
//!
//! Every record the dashboard shows carries a backend-assigned identifier.
//! Until the backend assigns one the record is a draft.

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Clone + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's identifier, `None` for drafts
    fn id(&self) -> Option<&Self::Id>;

    /// A draft has not been persisted yet
    fn is_draft(&self) -> bool {
        self.id().is_none()
    }

    fn has_id(&self, id: &Self::Id) -> bool {
        self.id() == Some(id)
    }
}
