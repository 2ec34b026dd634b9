//! # Action Slot
//!
//! The single in-flight timed action of a player.
//!
//! Every install bumps a generation counter and hands back an
//! [`ActionTicket`]. A scheduled completion keeps its ticket and checks
//! [`ActionSlot::is_current`] when it fires: installing another action,
//! restarting the same one, or clearing the slot all make older tickets
//! stale. Pending timers are never cancelled; they recognise themselves.

use crate::skill::Skill;
use crate::time::Millis;

/// Identity of one installed action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActionTicket(u64);

impl ActionTicket {
    /// Raw generation number.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

/// Everything needed to install an action.
#[derive(Clone, Debug)]
pub struct ActionSpec {
    /// Action-type tag of the engine (`"mine"`, `"smelt"`, ...).
    pub kind: String,
    /// Skill that owns the action.
    pub skill: Skill,
    /// Display label (target or recipe name).
    pub label: String,
    /// Binding key: target or recipe id.
    pub key: String,
    /// Logical time the action started.
    pub started_at: Millis,
    /// Time until completion.
    pub duration_ms: Millis,
}

/// An installed action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Action {
    /// Action-type tag of the engine.
    pub kind: String,
    /// Skill that owns the action.
    pub skill: Skill,
    /// Display label.
    pub label: String,
    /// Binding key: target or recipe id.
    pub key: String,
    /// Start time.
    pub started_at: Millis,
    /// Completion time.
    pub ends_at: Millis,
    /// `ends_at - started_at`.
    pub duration_ms: Millis,
    ticket: ActionTicket,
}

impl Action {
    /// Ticket of this action.
    #[inline]
    #[must_use]
    pub const fn ticket(&self) -> ActionTicket {
        self.ticket
    }

    /// True if the action was installed by an engine with this tag.
    #[inline]
    #[must_use]
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// Holds at most one [`Action`].
#[derive(Clone, Debug, Default)]
pub struct ActionSlot {
    current: Option<Action>,
    generation: u64,
}

impl ActionSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs an action, superseding whatever was there.
    pub fn install(&mut self, spec: ActionSpec) -> ActionTicket {
        self.generation += 1;
        let ticket = ActionTicket(self.generation);

        self.current = Some(Action {
            kind: spec.kind,
            skill: spec.skill,
            label: spec.label,
            key: spec.key,
            started_at: spec.started_at,
            ends_at: spec.started_at.saturating_add(spec.duration_ms),
            duration_ms: spec.duration_ms,
            ticket,
        });

        ticket
    }

    /// The in-flight action, if any.
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&Action> {
        self.current.as_ref()
    }

    /// True if an action is in flight.
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// True if `ticket` belongs to the in-flight action.
    #[inline]
    #[must_use]
    pub fn is_current(&self, ticket: ActionTicket) -> bool {
        self.current.as_ref().is_some_and(|a| a.ticket == ticket)
    }

    /// Removes the in-flight action.
    pub fn clear(&mut self) -> Option<Action> {
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(key: &str) -> ActionSpec {
        ActionSpec {
            kind: "mine".to_string(),
            skill: Skill::Mining,
            label: key.to_string(),
            key: key.to_string(),
            started_at: 1_000,
            duration_ms: 2_500,
        }
    }

    #[test]
    fn test_install_sets_times() {
        let mut slot = ActionSlot::new();
        let ticket = slot.install(spec("copper"));

        let action = slot.current().unwrap();
        assert_eq!(action.ends_at, 3_500);
        assert_eq!(action.ticket(), ticket);
        assert!(slot.is_current(ticket));
    }

    #[test]
    fn test_reinstall_same_key_supersedes() {
        let mut slot = ActionSlot::new();
        let first = slot.install(spec("copper"));
        let second = slot.install(spec("copper"));

        assert_ne!(first, second);
        assert!(!slot.is_current(first));
        assert!(slot.is_current(second));
    }

    #[test]
    fn test_clear_invalidates() {
        let mut slot = ActionSlot::new();
        let ticket = slot.install(spec("tin"));
        assert!(slot.clear().is_some());
        assert!(!slot.is_busy());
        assert!(!slot.is_current(ticket));
        assert!(slot.clear().is_none());
    }
}
