//! # Action Scheduler
//!
//! A single logical clock and a queue of deferred callbacks.
//!
//! Everything that happens "later" (action completions, automation retries)
//! is a timer in one [`Scheduler`]. Timers fire in `(due, insertion)` order
//! and receive the owning world by `&mut`, so state is only ever mutated from
//! one place at a time.
//!
//! A timer created with [`Scheduler::schedule_guarded`] carries the
//! [`ActionTicket`] of the action it completes. If that action is no longer
//! current when the timer comes due, the callback is dropped without running.
//! Nothing is ever removed from the queue early.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use idleforge_core::{ActionTicket, Millis, PlayerState};

/// Deferred work executed against the world `W`.
pub type TimerFn<W> = Box<dyn FnOnce(&mut W) + Send>;

/// A world that owns a player and the scheduler driving it.
pub trait ActionHost: Sized {
    /// The player whose action slot guards completions.
    fn player(&self) -> &PlayerState;

    /// The scheduler that owns this world's timers.
    fn scheduler_mut(&mut self) -> &mut Scheduler<Self>;
}

struct Timer<W> {
    due: Millis,
    seq: u64,
    guard: Option<ActionTicket>,
    callback: TimerFn<W>,
}

impl<W> PartialEq for Timer<W> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<W> Eq for Timer<W> {}

impl<W> PartialOrd for Timer<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W> Ord for Timer<W> {
    // BinaryHeap is a max-heap; reverse so the earliest timer is on top.
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

/// Timer queue over a logical millisecond clock.
pub struct Scheduler<W> {
    now: Millis,
    seq: u64,
    queue: BinaryHeap<Timer<W>>,
    fired: u64,
    dropped: u64,
}

impl<W> Scheduler<W> {
    /// Creates a scheduler whose clock starts at `now`.
    #[must_use]
    pub fn new(now: Millis) -> Self {
        Self {
            now,
            seq: 0,
            queue: BinaryHeap::new(),
            fired: 0,
            dropped: 0,
        }
    }

    /// Current logical time.
    #[inline]
    #[must_use]
    pub const fn now(&self) -> Millis {
        self.now
    }

    /// Schedules `callback` to run `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: Millis, callback: impl FnOnce(&mut W) + Send + 'static) {
        self.push(delay_ms, None, Box::new(callback));
    }

    /// Schedules an action completion that only runs while `ticket` is still
    /// the player's current action.
    pub fn schedule_guarded(
        &mut self,
        delay_ms: Millis,
        ticket: ActionTicket,
        callback: impl FnOnce(&mut W) + Send + 'static,
    ) {
        self.push(delay_ms, Some(ticket), Box::new(callback));
    }

    fn push(&mut self, delay_ms: Millis, guard: Option<ActionTicket>, callback: TimerFn<W>) {
        self.seq += 1;
        self.queue.push(Timer {
            due: self.now.saturating_add(delay_ms),
            seq: self.seq,
            guard,
            callback,
        });
    }

    /// Due time of the earliest pending timer.
    #[must_use]
    pub fn next_due(&self) -> Option<Millis> {
        self.queue.peek().map(|t| t.due)
    }

    /// Number of pending timers, stale ones included.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Callbacks that ran.
    #[must_use]
    pub const fn fired(&self) -> u64 {
        self.fired
    }

    /// Completions dropped because their action was superseded.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Moves the clock forward without firing anything. Never goes back.
    pub fn set_now(&mut self, now: Millis) {
        self.now = self.now.max(now);
    }

    fn pop_due(&mut self, until: Millis) -> Option<Timer<W>> {
        if self.queue.peek().map_or(true, |t| t.due > until) {
            return None;
        }
        let timer = self.queue.pop()?;
        self.now = self.now.max(timer.due);
        Some(timer)
    }
}

impl<W> Default for Scheduler<W> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<W> std::fmt::Debug for Scheduler<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .field("next_due", &self.next_due())
            .finish()
    }
}

/// Fires the earliest timer due at or before `until`.
///
/// Returns `false` once nothing is due.
pub fn fire_next<W: ActionHost>(world: &mut W, until: Millis) -> bool {
    let Some(timer) = world.scheduler_mut().pop_due(until) else {
        return false;
    };

    if let Some(ticket) = timer.guard {
        if !world.player().action.is_current(ticket) {
            tracing::trace!(
                generation = ticket.generation(),
                due = timer.due,
                "dropping superseded completion"
            );
            world.scheduler_mut().dropped += 1;
            return true;
        }
    }

    world.scheduler_mut().fired += 1;
    (timer.callback)(world);
    true
}

/// Fires every timer due at or before `until`, including timers those
/// callbacks schedule inside the window, then parks the clock at `until`.
///
/// Returns the number of timers popped.
pub fn run_until<W: ActionHost>(world: &mut W, until: Millis) -> usize {
    let mut popped = 0;
    while fire_next(world, until) {
        popped += 1;
    }
    world.scheduler_mut().set_now(until);
    popped
}

/// Fires timers in order until the queue is empty.
///
/// Returns the number of timers popped.
pub fn run_until_idle<W: ActionHost>(world: &mut W) -> usize {
    let mut popped = 0;
    while fire_next(world, Millis::MAX) {
        popped += 1;
    }
    popped
}

#[cfg(test)]
mod tests {
    use super::*;
    use idleforge_core::{ActionSpec, Skill};

    #[derive(Default)]
    struct World {
        player: PlayerState,
        scheduler: Scheduler<World>,
        log: Vec<(Millis, &'static str)>,
    }

    impl ActionHost for World {
        fn player(&self) -> &PlayerState {
            &self.player
        }

        fn scheduler_mut(&mut self) -> &mut Scheduler<Self> {
            &mut self.scheduler
        }
    }

    fn install(world: &mut World, key: &str) -> ActionTicket {
        world.player.action.install(ActionSpec {
            kind: "mine".to_string(),
            skill: Skill::Mining,
            label: key.to_string(),
            key: key.to_string(),
            started_at: world.scheduler.now(),
            duration_ms: 1_000,
        })
    }

    #[test]
    fn test_fires_in_due_order() {
        let mut world = World::default();
        world.scheduler.schedule(300, |w: &mut World| w.log.push((w.scheduler.now(), "c")));
        world.scheduler.schedule(100, |w: &mut World| w.log.push((w.scheduler.now(), "a")));
        world.scheduler.schedule(100, |w: &mut World| w.log.push((w.scheduler.now(), "b")));

        assert_eq!(run_until_idle(&mut world), 3);
        assert_eq!(world.log, vec![(100, "a"), (100, "b"), (300, "c")]);
    }

    #[test]
    fn test_run_until_respects_window() {
        let mut world = World::default();
        world.scheduler.schedule(100, |w: &mut World| w.log.push((w.scheduler.now(), "early")));
        world.scheduler.schedule(500, |w: &mut World| w.log.push((w.scheduler.now(), "late")));

        assert_eq!(run_until(&mut world, 250), 1);
        assert_eq!(world.scheduler.now(), 250);
        assert_eq!(world.scheduler.next_due(), Some(500));
    }

    #[test]
    fn test_nested_zero_delay_runs_in_window() {
        let mut world = World::default();
        world.scheduler.schedule(100, |w: &mut World| {
            w.log.push((w.scheduler.now(), "outer"));
            w.scheduler.schedule(0, |w: &mut World| w.log.push((w.scheduler.now(), "inner")));
        });

        run_until(&mut world, 100);
        assert_eq!(world.log, vec![(100, "outer"), (100, "inner")]);
    }

    #[test]
    fn test_guarded_completion_fires_once() {
        let mut world = World::default();
        let ticket = install(&mut world, "copper");
        world
            .scheduler
            .schedule_guarded(1_000, ticket, |w: &mut World| w.log.push((w.scheduler.now(), "done")));

        run_until_idle(&mut world);
        assert_eq!(world.log, vec![(1_000, "done")]);
        assert_eq!(world.scheduler.fired(), 1);
    }

    #[test]
    fn test_superseded_completion_dropped() {
        let mut world = World::default();
        let first = install(&mut world, "copper");
        world
            .scheduler
            .schedule_guarded(1_000, first, |w: &mut World| w.log.push((w.scheduler.now(), "first")));

        // Restarting the same target still supersedes.
        let second = install(&mut world, "copper");
        world
            .scheduler
            .schedule_guarded(1_000, second, |w: &mut World| w.log.push((w.scheduler.now(), "second")));

        run_until_idle(&mut world);
        assert_eq!(world.log, vec![(1_000, "second")]);
        assert_eq!(world.scheduler.dropped(), 1);
    }

    #[test]
    fn test_cleared_action_drops_completion() {
        let mut world = World::default();
        let ticket = install(&mut world, "tin");
        world
            .scheduler
            .schedule_guarded(1_000, ticket, |w: &mut World| w.log.push((w.scheduler.now(), "done")));
        world.player.action.clear();

        run_until_idle(&mut world);
        assert!(world.log.is_empty());
        assert_eq!(world.scheduler.pending(), 0);
    }
}
