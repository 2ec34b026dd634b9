//! # AFK Loop
//!
//! Session-timed automation. One tick:
//!
//! 1. session expired: end it
//! 2. another action in flight: retry after the busy backoff
//! 3. otherwise ask the skill's driver to start a cycle
//! 4. driver not ready (or missing): retry after the not-ready backoff
//! 5. cycle completed: publish it and tick again immediately
//!
//! Every AFK timer carries the id of the session that scheduled it and does
//! nothing once that session is no longer current. Starting a session while
//! another runs ends the old one and clears its in-flight action, so the old
//! cycle stream stops at once.
//!
//! A started cycle is watched: if its action is superseded from outside the
//! loop (manual play, [`Session::cancel_action`]) its completion never fires,
//! so a watchdog timer past the action's end re-enters the loop. A separate
//! expiry timer at `end_at` ends a session that is only backing off.

use idleforge_core::{ActionTicket, AfkSession, Millis, Skill};

use crate::drivers::DoneFn;
use crate::events::{CycleDetail, EndReason, SkillEvent};
use crate::session::Session;

impl Session {
    /// Starts automating `skill`, replacing any running session.
    ///
    /// Returns the new session id.
    pub fn start_afk(&mut self, skill: Skill, target_id: Option<&str>) -> u64 {
        let now = self.now();
        self.next_afk_id += 1;
        let id = self.next_afk_id;

        let session = AfkSession {
            id,
            skill,
            target_id: target_id.map(str::to_string),
            started_at: now,
            end_at: now.saturating_add(self.config.afk_session_ms),
        };
        let end_at = session.end_at;

        self.afk_awaiting = None;
        if let Some(previous) = self.player.replace_afk(session) {
            tracing::info!("AFK switching {} -> {} (session {} -> {})", previous.skill, skill, previous.id, id);
            if self.player.action.clear().is_some() {
                tracing::debug!(session = previous.id, "superseded in-flight action");
            }
            self.publish(SkillEvent::AfkSwitched {
                from_session: previous.id,
                from: previous.skill,
                to: skill,
            });
            self.publish(SkillEvent::AfkEnded {
                session_id: Some(previous.id),
                skill: Some(previous.skill),
                reason: EndReason::Replaced,
            });
        }

        tracing::info!("AFK started: {} (session {}, until {})", skill, id, end_at);
        self.publish(SkillEvent::AfkStarted {
            session_id: id,
            skill,
            target_id: target_id.map(str::to_string),
            end_at,
        });

        let length = self.config.afk_session_ms;
        self.scheduler
            .schedule(length, move |s: &mut Session| s.afk_expire(id));

        self.afk_tick(id);
        id
    }

    /// Stops automation. Always publishes an end notification.
    ///
    /// Returns the session that was running, if any. An action already in
    /// flight still completes, but no cycle is published for it.
    pub fn stop_afk(&mut self) -> Option<AfkSession> {
        let previous = self.player.take_afk();
        self.afk_awaiting = None;
        match &previous {
            Some(session) => tracing::info!("AFK stopped: {} (session {})", session.skill, session.id),
            None => tracing::debug!("AFK stop with no session running"),
        }

        self.publish(SkillEvent::AfkEnded {
            session_id: previous.as_ref().map(|s| s.id),
            skill: previous.as_ref().map(|s| s.skill),
            reason: EndReason::Stopped,
        });
        previous
    }

    /// True if `session_id` is the running session.
    #[must_use]
    pub fn is_afk_current(&self, session_id: u64) -> bool {
        self.player.afk_session().is_some_and(|s| s.id == session_id)
    }

    fn schedule_afk_tick(&mut self, session_id: u64, delay_ms: Millis) {
        self.scheduler
            .schedule(delay_ms, move |s: &mut Session| s.afk_tick(session_id));
    }

    fn end_expired_afk(&mut self, session: &AfkSession) {
        self.player.take_afk();
        self.afk_awaiting = None;
        tracing::info!("AFK expired: {} (session {})", session.skill, session.id);
        self.publish(SkillEvent::AfkEnded {
            session_id: Some(session.id),
            skill: Some(session.skill),
            reason: EndReason::Expired,
        });
    }

    /// True while the cycle started for `session_id` is still in flight.
    fn afk_cycle_in_flight(&self, session_id: u64) -> bool {
        self.afk_awaiting
            .is_some_and(|(id, ticket)| id == session_id && self.player.action.is_current(ticket))
    }

    fn afk_tick(&mut self, session_id: u64) {
        let Some(session) = self.player.afk_session().filter(|s| s.id == session_id).cloned() else {
            tracing::trace!(session = session_id, "dropping stale AFK tick");
            return;
        };
        let now = self.now();

        if session.is_expired(now) {
            self.end_expired_afk(&session);
            return;
        }

        if self.player.action.is_busy() {
            tracing::trace!(session = session_id, "action in flight, backing off");
            let delay = self.config.busy_backoff_ms;
            self.schedule_afk_tick(session_id, delay);
            return;
        }

        let started = match self.drivers.get(session.skill) {
            Some(driver) => {
                let done: DoneFn = Box::new(move |s: &mut Session, detail: CycleDetail| {
                    s.afk_cycle_done(session_id, detail);
                });
                driver.drive(self, session.target_id.as_deref(), done)
            }
            None => {
                tracing::warn!("No AFK driver registered for {}", session.skill);
                false
            }
        };

        if started {
            self.watch_afk_action(session_id);
        } else {
            tracing::debug!(session = session_id, skill = %session.skill, "driver not ready, backing off");
            let delay = self.config.not_ready_backoff_ms;
            self.schedule_afk_tick(session_id, delay);
        }
    }

    /// Arms a watchdog on the action the driver just installed. Drivers that
    /// run without an action are left to call `done` on their own.
    fn watch_afk_action(&mut self, session_id: u64) {
        let Some(action) = self.player.action.current() else {
            self.afk_awaiting = None;
            return;
        };
        let ticket = action.ticket();
        let delay = action
            .ends_at
            .saturating_sub(self.now())
            .saturating_add(self.config.busy_backoff_ms);

        self.afk_awaiting = Some((session_id, ticket));
        self.schedule_afk_watchdog(session_id, ticket, delay);
    }

    fn schedule_afk_watchdog(&mut self, session_id: u64, ticket: ActionTicket, delay_ms: Millis) {
        self.scheduler
            .schedule(delay_ms, move |s: &mut Session| s.afk_watchdog(session_id, ticket));
    }

    fn afk_watchdog(&mut self, session_id: u64, ticket: ActionTicket) {
        if self.afk_awaiting != Some((session_id, ticket)) || !self.is_afk_current(session_id) {
            return;
        }
        if self.player.action.is_current(ticket) {
            let delay = self.config.busy_backoff_ms;
            self.schedule_afk_watchdog(session_id, ticket, delay);
            return;
        }

        tracing::debug!(
            session = session_id,
            generation = ticket.generation(),
            "AFK action superseded, resuming loop"
        );
        self.afk_awaiting = None;
        self.afk_tick(session_id);
    }

    fn afk_expire(&mut self, session_id: u64) {
        let Some(session) = self.player.afk_session().filter(|s| s.id == session_id).cloned() else {
            return;
        };
        if self.afk_cycle_in_flight(session_id) {
            // The post-cycle tick ends it.
            return;
        }
        self.end_expired_afk(&session);
    }

    fn afk_cycle_done(&mut self, session_id: u64, detail: CycleDetail) {
        let Some(skill) = self
            .player
            .afk_session()
            .filter(|s| s.id == session_id)
            .map(|s| s.skill)
        else {
            tracing::trace!(session = session_id, "cycle finished after session ended");
            return;
        };

        self.afk_awaiting = None;
        self.publish(SkillEvent::Cycle {
            session_id: Some(session_id),
            skill,
            detail,
        });
        self.schedule_afk_tick(session_id, 0);
    }
}
