//! # Session
//!
//! Everything one player needs at runtime, in one place: the player state,
//! the scheduler that owns every pending timer, the RNG, the driver registry
//! and the event bus. All mutation happens through `&mut Session`, either
//! from direct calls or from scheduler callbacks.

use std::path::Path;
use std::sync::Arc;

use idleforge_core::{ActionTicket, Millis, PlayerState, Skill, SkillRng};
use idleforge_skills::scheduler;
use idleforge_skills::{buffs, ActionHost, Catalog, Scheduler, ToolResult};

use crate::config::RuntimeConfig;
use crate::drivers::DriverRegistry;
use crate::error::{RuntimeError, RuntimeResult};
use crate::events::{CycleDetail, EventBus, EventReceiver, SkillEvent};

/// One player's runtime context.
pub struct Session {
    /// Player state.
    pub player: PlayerState,
    /// Timer queue and logical clock.
    pub scheduler: Scheduler<Session>,
    /// Drop RNG.
    pub rng: SkillRng,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) drivers: DriverRegistry,
    pub(crate) events: EventBus,
    pub(crate) config: RuntimeConfig,
    pub(crate) next_afk_id: u64,
    /// AFK session id and the ticket of the action its driver started.
    pub(crate) afk_awaiting: Option<(u64, ActionTicket)>,
}

impl Session {
    /// Creates a session with the default driver for every catalog engine.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: RuntimeConfig) -> Self {
        let rng = config.rng_seed.map_or_else(SkillRng::from_clock, SkillRng::seeded);
        Self {
            player: PlayerState::new(),
            scheduler: Scheduler::new(0),
            rng,
            drivers: DriverRegistry::with_defaults(&catalog),
            events: EventBus::new(config.event_capacity),
            catalog,
            config,
            next_afk_id: 0,
            afk_awaiting: None,
        }
    }

    /// Loads the catalog and runtime configuration from files.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Config`] if either file is unreadable or invalid.
    pub fn load(catalog_path: impl AsRef<Path>, config_path: impl AsRef<Path>) -> RuntimeResult<Self> {
        let catalog = Catalog::load(catalog_path)?;
        let config = RuntimeConfig::load(config_path)?;
        Ok(Self::new(Arc::new(catalog), config))
    }

    /// Current logical time.
    #[inline]
    #[must_use]
    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    /// Engines and items.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Runtime settings.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Driver registry.
    #[must_use]
    pub fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }

    /// Driver registry, for registering custom drivers.
    pub fn drivers_mut(&mut self) -> &mut DriverRegistry {
        &mut self.drivers
    }

    /// Adds an event subscriber.
    pub fn subscribe(&mut self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Event bus statistics.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Publishes an event to every subscriber.
    pub fn publish(&mut self, event: SkillEvent) {
        self.events.publish(&event);
    }

    // =========================================================================
    // Clock
    // =========================================================================

    /// Runs every timer due within the next `delta_ms`.
    pub fn advance_by(&mut self, delta_ms: Millis) -> usize {
        let until = self.now().saturating_add(delta_ms);
        self.advance_to(until)
    }

    /// Runs every timer due at or before `until` and parks the clock there.
    pub fn advance_to(&mut self, until: Millis) -> usize {
        scheduler::run_until(self, until)
    }

    /// Runs timers until none are left.
    pub fn run_until_idle(&mut self) -> usize {
        scheduler::run_until_idle(self)
    }

    /// Due time of the next timer.
    #[must_use]
    pub fn next_due(&self) -> Option<Millis> {
        self.scheduler.next_due()
    }

    // =========================================================================
    // Manual play
    // =========================================================================

    /// Consumes a tool from the inventory and applies its buff.
    ///
    /// # Errors
    ///
    /// See [`buffs::equip_tool`].
    pub fn equip_tool(&mut self, item_id: &str) -> ToolResult<Skill> {
        let now = self.now();
        buffs::equip_tool(&mut self.player, self.catalog.items(), item_id, now)
    }

    /// Starts one gathering action; its result is published as a
    /// [`SkillEvent::Cycle`] without a session id.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::NoEngine`] if `skill` has no gathering engine.
    pub fn start_gathering(&mut self, skill: Skill, target: Option<&str>) -> RuntimeResult<bool> {
        let engine = Arc::clone(
            self.catalog
                .gathering(skill)
                .ok_or(RuntimeError::NoEngine { family: "gathering", skill })?,
        );
        let finisher = Arc::clone(&engine);

        Ok(engine.start(&mut self.player, &mut self.scheduler, target, move |s: &mut Session| {
            let now = s.now();
            let detail = finisher
                .finish_with_tool(&mut s.player, None, &mut s.rng, now)
                .map_or(CycleDetail::Failed, CycleDetail::Gathered);
            s.publish(SkillEvent::Cycle {
                session_id: None,
                skill,
                detail,
            });
        }))
    }

    /// Starts one production action; its result is published as a
    /// [`SkillEvent::Cycle`] without a session id.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::NoEngine`] if `skill` has no production engine.
    pub fn start_production(&mut self, skill: Skill, recipe_id: &str) -> RuntimeResult<bool> {
        let engine = Arc::clone(
            self.catalog
                .production(skill)
                .ok_or(RuntimeError::NoEngine { family: "production", skill })?,
        );
        let finisher = Arc::clone(&engine);

        Ok(engine.start(&mut self.player, &mut self.scheduler, Some(recipe_id), move |s: &mut Session| {
            let detail = finisher
                .finish_one(&mut s.player)
                .map_or(CycleDetail::Failed, CycleDetail::Produced);
            s.publish(SkillEvent::Cycle {
                session_id: None,
                skill,
                detail,
            });
        }))
    }

    /// Drops the in-flight action; its pending completion will not fire.
    pub fn cancel_action(&mut self) -> bool {
        self.player.action.clear().is_some()
    }
}

impl ActionHost for Session {
    fn player(&self) -> &PlayerState {
        &self.player
    }

    fn scheduler_mut(&mut self) -> &mut Scheduler<Self> {
        &mut self.scheduler
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("now", &self.now())
            .field("action", &self.player.action.current())
            .field("afk", &self.player.afk_session())
            .field("scheduler", &self.scheduler)
            .field("drivers", &self.drivers)
            .finish_non_exhaustive()
    }
}
