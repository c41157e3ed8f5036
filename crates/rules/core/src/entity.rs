use std::fmt;

/// Opaque reference to a creature or object taking part in a rule trigger.
///
/// The engine only compares identities; gameplay data behind the id is owned by
/// whatever persists entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl EntityId {
    /// Reserved identifier for events raised by the engine itself
    /// (round boundaries, rests, condition lifecycle notifications).
    pub const SYSTEM: Self = Self(u32::MAX);

    /// Returns true if this entity represents the system actor.
    #[inline]
    pub const fn is_system(self) -> bool {
        self.0 == Self::SYSTEM.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_system() {
            write!(f, "#system")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}
