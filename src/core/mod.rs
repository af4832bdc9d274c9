//! In-memory authoritative store and index helpers.

/// Helper index aliases.
pub mod indices;
/// Authoritative contact/encounter store.
pub mod store;
