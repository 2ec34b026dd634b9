//! # AFK Drivers
//!
//! A driver knows how to run one cycle of a skill unattended. The registry
//! maps each skill to its driver; every session owns its own registry.
//!
//! Contract: `drive` returns `true` only if it started an action, and in that
//! case it must call `done` exactly once when that action completes
//! naturally. A superseded action never completes, so `done` is then never
//! called.

use std::collections::HashMap;
use std::sync::Arc;

use idleforge_core::Skill;
use idleforge_skills::{Catalog, Gathering, Production, SkillEngine};

use crate::events::CycleDetail;
use crate::session::Session;

/// Completion callback handed to a driver.
pub type DoneFn = Box<dyn FnOnce(&mut Session, CycleDetail) + Send>;

/// Runs one unattended cycle of a skill.
pub trait Driver: Send + Sync {
    /// Tries to start an action for `target_id`.
    fn drive(&self, session: &mut Session, target_id: Option<&str>, done: DoneFn) -> bool;
}

impl<F> Driver for F
where
    F: Fn(&mut Session, Option<&str>, DoneFn) -> bool + Send + Sync,
{
    fn drive(&self, session: &mut Session, target_id: Option<&str>, done: DoneFn) -> bool {
        self(session, target_id, done)
    }
}

/// Gathers the target, applying the skill's tool double roll.
#[derive(Debug)]
pub struct GatheringDriver {
    engine: Arc<SkillEngine<Gathering>>,
}

impl GatheringDriver {
    /// Wraps an engine.
    #[must_use]
    pub fn new(engine: Arc<SkillEngine<Gathering>>) -> Self {
        Self { engine }
    }
}

impl Driver for GatheringDriver {
    fn drive(&self, session: &mut Session, target_id: Option<&str>, done: DoneFn) -> bool {
        let engine = Arc::clone(&self.engine);
        self.engine
            .start(&mut session.player, &mut session.scheduler, target_id, move |s: &mut Session| {
                let now = s.now();
                let detail = engine
                    .finish_with_tool(&mut s.player, None, &mut s.rng, now)
                    .map_or(CycleDetail::Failed, CycleDetail::Gathered);
                done(s, detail);
            })
    }
}

/// Crafts the given recipe.
#[derive(Debug)]
pub struct ProductionDriver {
    engine: Arc<SkillEngine<Production>>,
}

impl ProductionDriver {
    /// Wraps an engine.
    #[must_use]
    pub fn new(engine: Arc<SkillEngine<Production>>) -> Self {
        Self { engine }
    }
}

impl Driver for ProductionDriver {
    fn drive(&self, session: &mut Session, target_id: Option<&str>, done: DoneFn) -> bool {
        let engine = Arc::clone(&self.engine);
        self.engine
            .start(&mut session.player, &mut session.scheduler, target_id, move |s: &mut Session| {
                let detail = engine
                    .finish_one(&mut s.player)
                    .map_or(CycleDetail::Failed, CycleDetail::Produced);
                done(s, detail);
            })
    }
}

/// Skill -> driver map.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<Skill, Arc<dyn Driver>>,
}

impl DriverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the default driver for every engine in `catalog`.
    #[must_use]
    pub fn with_defaults(catalog: &Catalog) -> Self {
        let mut registry = Self::new();
        for engine in catalog.gathering_engines() {
            registry.register(engine.skill(), GatheringDriver::new(Arc::clone(engine)));
        }
        for engine in catalog.production_engines() {
            registry.register(engine.skill(), ProductionDriver::new(Arc::clone(engine)));
        }
        registry
    }

    /// Registers `driver` for `skill`, returning the one it replaced.
    pub fn register(&mut self, skill: Skill, driver: impl Driver + 'static) -> Option<Arc<dyn Driver>> {
        self.drivers.insert(skill, Arc::new(driver))
    }

    /// Removes the driver of `skill`.
    pub fn unregister(&mut self, skill: Skill) -> Option<Arc<dyn Driver>> {
        self.drivers.remove(&skill)
    }

    /// Driver of `skill`.
    #[must_use]
    pub fn get(&self, skill: Skill) -> Option<Arc<dyn Driver>> {
        self.drivers.get(&skill).cloned()
    }

    /// True if `skill` has a driver.
    #[must_use]
    pub fn contains(&self, skill: Skill) -> bool {
        self.drivers.contains_key(&skill)
    }

    /// Number of registered drivers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// True if no driver is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut skills: Vec<_> = self.drivers.keys().collect();
        skills.sort();
        f.debug_struct("DriverRegistry").field("skills", &skills).finish()
    }
}
