//! # IDLEFORGE
//!
//! The front-end crate, tying the engines and the runtime together.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  idleforge_core  │────>│ idleforge_skills │────>│ idleforge_runtime│
//! │                  │     │                  │     │                  │
//! │  • XP curve      │     │  • SkillEngine   │     │  • Session       │
//! │  • Inventory     │     │  • Gathering     │     │  • AFK loop      │
//! │  • Action slot   │     │  • Production    │     │  • Event bus     │
//! │  • Equipment     │     │  • Scheduler     │     │  • Tokio driver  │
//! └──────────────────┘     └──────────────────┘     └──────────────────┘
//! ```
//!
//! This crate adds [`simulate_afk`], which runs one AFK session on the
//! logical clock and folds its notifications into a [`SimReport`].

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

use std::collections::BTreeMap;
use std::fmt;

pub use idleforge_core as core;
pub use idleforge_runtime as runtime;
pub use idleforge_skills as skills;

use idleforge_core::{Millis, Skill};
use idleforge_runtime::{CycleDetail, EndReason, Session, SkillEvent};

/// Logical time advanced between two event drains.
pub const DRAIN_STEP_MS: Millis = 10_000;

/// Summary of one simulated AFK session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimReport {
    /// Session id.
    pub session_id: u64,
    /// Logical time from start to end.
    pub elapsed_ms: Millis,
    /// Completed cycles.
    pub cycles: u64,
    /// Cycles whose completion produced nothing.
    pub failed: u64,
    /// Extra primary drops granted by tool buffs.
    pub doubles: u64,
    /// Why the session ended, if it did.
    pub end: Option<EndReason>,
    /// XP gained per skill.
    pub xp: BTreeMap<Skill, u64>,
    /// Net inventory change per item.
    pub items: BTreeMap<String, i64>,
}

impl SimReport {
    fn record(&mut self, session_id: u64, event: &SkillEvent) {
        match event {
            SkillEvent::Cycle {
                session_id: Some(id),
                detail,
                ..
            } if *id == session_id => {
                self.cycles += 1;
                match detail {
                    CycleDetail::Gathered(outcome) => self.doubles += outcome.double_count,
                    CycleDetail::Produced(_) => {}
                    CycleDetail::Failed => self.failed += 1,
                }
            }
            SkillEvent::AfkEnded {
                session_id: Some(id),
                reason,
                ..
            } if *id == session_id => self.end = Some(*reason),
            _ => {}
        }
    }
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session {} ran {:.1}s", self.session_id, self.elapsed_ms as f64 / 1000.0)?;
        writeln!(f, "  cycles:  {} ({} failed, {} doubles)", self.cycles, self.failed, self.doubles)?;
        match self.end {
            Some(reason) => writeln!(f, "  ended:   {reason:?}")?,
            None => writeln!(f, "  ended:   still running")?,
        }
        for (skill, xp) in &self.xp {
            writeln!(f, "  xp:      {skill} +{xp}")?;
        }
        for (item, delta) in &self.items {
            writeln!(f, "  item:    {item} {delta:+}")?;
        }
        Ok(())
    }
}

fn inventory_counts(session: &Session) -> BTreeMap<String, u64> {
    session
        .player
        .inventory
        .iter()
        .map(|(id, qty)| (id.to_string(), qty))
        .collect()
}

fn signed(qty: u64) -> i64 {
    i64::try_from(qty).unwrap_or(i64::MAX)
}

/// Runs one AFK session of `skill` until it ends or `limit_ms` of logical
/// time has passed.
///
/// Events are drained every [`DRAIN_STEP_MS`] so long sessions never
/// overflow the subscriber queue.
pub fn simulate_afk(session: &mut Session, skill: Skill, target_id: Option<&str>, limit_ms: Millis) -> SimReport {
    let events = session.subscribe();
    let xp_before: BTreeMap<Skill, u64> = Skill::ALL.iter().map(|&s| (s, session.player.xp(s))).collect();
    let items_before = inventory_counts(session);
    let started_at = session.now();
    let deadline = started_at.saturating_add(limit_ms);

    let session_id = session.start_afk(skill, target_id);
    let mut report = SimReport {
        session_id,
        ..SimReport::default()
    };

    while session.is_afk_current(session_id) && session.now() < deadline {
        let step = DRAIN_STEP_MS.min(deadline - session.now());
        session.advance_by(step);
        for event in events.drain() {
            report.record(session_id, &event);
        }
    }
    for event in events.drain() {
        report.record(session_id, &event);
    }

    report.elapsed_ms = session.now() - started_at;
    for (skill, before) in xp_before {
        let gained = session.player.xp(skill).saturating_sub(before);
        if gained > 0 {
            report.xp.insert(skill, gained);
        }
    }

    let items_after = inventory_counts(session);
    for (item, &after) in &items_after {
        let before = items_before.get(item).copied().unwrap_or(0);
        if after != before {
            report.items.insert(item.clone(), signed(after) - signed(before));
        }
    }
    for (item, &before) in &items_before {
        if !items_after.contains_key(item) {
            report.items.insert(item.clone(), -signed(before));
        }
    }

    tracing::info!(
        "Simulated {} session {}: {} cycles in {} ms",
        skill,
        session_id,
        report.cycles,
        report.elapsed_ms
    );
    report
}
