//! Lifecycle status of runtime nodes.

/// Where a runtime node is in its lifecycle.
///
/// # Transitions
///
/// ```text
/// Uninitialized --initialize--> Ready <--activate/deactivate--> Active
///        \                        \                              /
///         `-------------------------------- destroy ------------'--> Destroyed
/// ```
///
/// `reset` is valid in `Ready` and `Active` and does not change the status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Lifecycle {
    /// Allocated by the factory, `initialize` not yet called.
    #[default]
    Uninitialized,

    /// Initialized and idle. Can be reset or activated.
    Ready,

    /// Running. `update` is only honored in this status.
    Active,

    /// Terminal. All owned children have been released.
    Destroyed,
}

impl Lifecycle {
    /// Returns `true` if this status is `Active`.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    /// Returns `true` if the node was initialized and not yet destroyed.
    #[inline]
    pub fn is_live(self) -> bool {
        matches!(self, Lifecycle::Ready | Lifecycle::Active)
    }

    /// Returns `true` if this status is `Destroyed`.
    #[inline]
    pub fn is_destroyed(self) -> bool {
        matches!(self, Lifecycle::Destroyed)
    }
}
