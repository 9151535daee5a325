//! Entity trait: records that keep their identity across edits.

/// A record addressed by a stable identifier.
///
/// Ledger collections are keyed by `id()`; two values with the same id are
/// considered the same record even if every other field differs.
pub trait Entity {
    /// Strongly-typed identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// True when `other` refers to the same record.
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
