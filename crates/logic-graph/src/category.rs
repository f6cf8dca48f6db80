//! Node categories used for structural validation of configs.
//!
//! Categories are attached to every registered node type and compared when a
//! config slot is filled (a transition's `Condition` must hold a condition, a
//! state's `Bhv` must hold a behavior, ...). They are never used for dispatch.

use serde::{Deserialize, Serialize};

/// Structural kind of a registered node type.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum NodeCategory {
    /// Not registered.
    #[default]
    Unknown,
    Behavior,
    Condition,
    /// Latching conditions fed by bus events or agent triggers.
    Event,
    #[strum(serialize = "FSM")]
    #[serde(rename = "FSM")]
    Fsm,
    State,
    StateTransition,
    /// Types that may fill both behavior and condition slots.
    Mixture,
}

impl NodeCategory {
    /// Returns true if a node of this category may fill a slot that expects
    /// `expected`.
    ///
    /// Exact matches are always accepted (except `Unknown`). In addition an
    /// FSM can run as a behavior, an event node can be evaluated as a
    /// condition, and a mixture fits either slot.
    pub fn satisfies(self, expected: NodeCategory) -> bool {
        use NodeCategory::*;

        match (self, expected) {
            (Unknown, _) | (_, Unknown) => false,
            (actual, wanted) if actual == wanted => true,
            (Fsm, Behavior) | (Event, Condition) => true,
            (Mixture, Behavior) | (Mixture, Condition) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_accepted() {
        assert!(NodeCategory::Behavior.satisfies(NodeCategory::Behavior));
        assert!(NodeCategory::State.satisfies(NodeCategory::State));
    }

    #[test]
    fn unknown_never_satisfies() {
        assert!(!NodeCategory::Unknown.satisfies(NodeCategory::Unknown));
        assert!(!NodeCategory::Unknown.satisfies(NodeCategory::Behavior));
        assert!(!NodeCategory::Behavior.satisfies(NodeCategory::Unknown));
    }

    #[test]
    fn widened_slots() {
        assert!(NodeCategory::Fsm.satisfies(NodeCategory::Behavior));
        assert!(NodeCategory::Event.satisfies(NodeCategory::Condition));
        assert!(NodeCategory::Mixture.satisfies(NodeCategory::Condition));
        assert!(!NodeCategory::Behavior.satisfies(NodeCategory::Condition));
        assert!(!NodeCategory::Condition.satisfies(NodeCategory::Fsm));
    }

    #[test]
    fn parses_from_markup_names() {
        assert_eq!("fsm".parse::<NodeCategory>().ok(), Some(NodeCategory::Fsm));
        assert_eq!(NodeCategory::Fsm.to_string(), "FSM");
        assert_eq!(
            "statetransition".parse::<NodeCategory>().ok(),
            Some(NodeCategory::StateTransition)
        );
    }
}
