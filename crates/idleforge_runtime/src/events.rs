//! # Skill Event Bus
//!
//! Fire-and-forget notifications from a session to any number of observers.
//!
//! ```text
//! ┌─────────────┐  publish   ┌─────────────┐      ┌──────────────┐
//! │   Session   │──────────> │  EventBus   │─────>│ subscriber 1 │
//! │ (AFK loop,  │            │ (observer   │─────>│ subscriber 2 │
//! │  manual)    │            │  list)      │      └──────────────┘
//! └─────────────┘            └─────────────┘
//! ```
//!
//! Every subscriber owns a bounded crossbeam channel. Publishing never
//! blocks: a full channel loses the event, a dropped receiver is pruned on
//! the next publish, and publishing with no subscribers is a no-op.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use idleforge_core::{Millis, Skill};
use idleforge_skills::{GatherOutcome, ProductionOutcome};

/// Why an AFK session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// The session reached `end_at`.
    Expired,
    /// `stop_afk` was called.
    Stopped,
    /// A new session took its place.
    Replaced,
}

/// Result of one finished action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleDetail {
    /// A gathering action completed.
    Gathered(GatherOutcome),
    /// A production action completed.
    Produced(ProductionOutcome),
    /// The action completed but granted nothing (target vanished, inputs
    /// consumed meanwhile).
    Failed,
}

/// Events published by a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkillEvent {
    // =========================================================================
    // AFK lifecycle
    // =========================================================================
    /// An AFK session started.
    AfkStarted {
        /// New session id.
        session_id: u64,
        /// Automated skill.
        skill: Skill,
        /// Target or recipe.
        target_id: Option<String>,
        /// Expiry time.
        end_at: Millis,
    },

    /// A running session was replaced by a new one.
    AfkSwitched {
        /// Replaced session.
        from_session: u64,
        /// Skill of the replaced session.
        from: Skill,
        /// Skill of the new session.
        to: Skill,
    },

    /// An AFK session ended.
    AfkEnded {
        /// Ended session, `None` when `stop_afk` found nothing running.
        session_id: Option<u64>,
        /// Skill of the ended session.
        skill: Option<Skill>,
        /// Why it ended.
        reason: EndReason,
    },

    // =========================================================================
    // Action results
    // =========================================================================
    /// An action finished.
    Cycle {
        /// AFK session that ran it, `None` for manual actions.
        session_id: Option<u64>,
        /// Skill of the action.
        skill: Skill,
        /// What it granted.
        detail: CycleDetail,
    },
}

/// Observer list of bounded channels.
#[derive(Debug)]
pub struct EventBus {
    /// One sender per live subscriber.
    subscribers: Vec<Sender<SkillEvent>>,
    /// Capacity of each new subscriber channel.
    capacity: usize,
    /// Events lost to full channels.
    dropped: u64,
}

impl EventBus {
    /// Creates a bus; each subscriber gets a channel of `capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Adds a subscriber.
    pub fn subscribe(&mut self) -> EventReceiver {
        let (sender, receiver) = bounded(self.capacity);
        self.subscribers.push(sender);
        EventReceiver { receiver }
    }

    /// Sends `event` to every subscriber without blocking.
    ///
    /// Returns how many subscribers received it.
    pub fn publish(&mut self, event: &SkillEvent) -> usize {
        let mut delivered = 0;
        let mut dropped = 0;

        self.subscribers.retain(|sender| match sender.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                dropped += 1;
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });

        if dropped > 0 {
            tracing::debug!(dropped, "event channel full, dropping notification");
            self.dropped += dropped;
        }
        delivered
    }

    /// Live subscribers as of the last publish.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Events lost to full channels.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EVENT_CAPACITY)
    }
}

/// Handle for receiving events.
#[derive(Clone, Debug)]
pub struct EventReceiver {
    receiver: Receiver<SkillEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[inline]
    pub fn drain(&self) -> Vec<SkillEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<SkillEvent> {
        self.receiver.try_recv().ok()
    }

    /// Blocks until an event arrives or `timeout` passes.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<SkillEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}
