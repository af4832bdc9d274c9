//! Runtime event stream payloads.

use crate::types::{ContactId, EncounterId};

/// Events emitted from the single-writer runtime loop after each mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A contact was added.
    ContactAdded {
        /// New contact id.
        id: ContactId,
    },
    /// A contact and its encounters were deleted.
    ContactDeleted {
        /// Deleted contact id.
        id: ContactId,
        /// Number of encounters removed by the cascade.
        encounters_removed: usize,
    },
    /// An encounter was added.
    EncounterAdded {
        /// New encounter id.
        id: EncounterId,
        /// Owning contact.
        contact_id: ContactId,
    },
    /// An encounter was deleted.
    EncounterDeleted {
        /// Deleted encounter id.
        id: EncounterId,
    },
}
