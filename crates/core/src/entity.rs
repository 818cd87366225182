//! Entity trait: identity that survives edits.

/// Entity marker + minimal interface.
///
/// Order lines are entities: a line keeps its id across wholesale line
/// replacement, which is how updates are told apart from inserts.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
