//! Headless ballistics world.
//!
//! Runs the same simulator as the ECS plugins without an `App`, for dedicated
//! servers, tools and tests. The caller owns the loop and calls
//! [`BallisticsSimulation::step`] once per frame.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::components::{Projectile, ProjectileSpec, WindDirectionalSource};
use crate::error::ProjectileSpecError;
use crate::resources::BallisticsConfig;
use crate::schedule::FrameTimers;
use crate::systems::flight::ProjectileImpact;
use crate::systems::surface::ImpactConsumer;
use crate::types::{ActorId, DestroyReason, RayCaster, TraceSink};
use crate::wind::{WindProvider, WindSourceLocator};

/// Projectile actor ids start here so they never collide with scene ids.
pub const PROJECTILE_ACTOR_BASE: u64 = 1 << 40;

/// Handle to a projectile owned by a [`BallisticsSimulation`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ProjectileId(u64);

impl ProjectileId {
    /// The identity traces see for this projectile.
    pub fn actor(self) -> ActorId {
        ActorId(PROJECTILE_ACTOR_BASE + self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum WorldTask {
    ResolveWindSource,
    Expire(ProjectileId),
}

/// What happened during one [`BallisticsSimulation::step`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    pub impacts: Vec<(ProjectileId, ProjectileImpact)>,
    pub destroyed: Vec<(ProjectileId, DestroyReason)>,
}

/// A world of projectiles flying through a static scene.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hybrid_ballistics::prelude::*;
///
/// let mut scene = BoxScene::default();
/// scene.add_box(Vec3::new(2000.0, -100.0, -100.0), Vec3::new(2005.0, 100.0, 100.0));
///
/// let mut sim = BallisticsSimulation::new(scene, BallisticsConfig::default());
/// let id = sim.spawn(&ProjectileSpec::default(), Vec3::ZERO, Vec3::X, None).unwrap();
/// sim.activate(id, 1.0);
///
/// let mut policy = MaterialImpactPolicy::default();
/// let report = sim.step(1.0 / 30.0, &mut policy);
/// assert_eq!(report.impacts.len(), 1);
/// assert_eq!(report.destroyed, vec![(id, DestroyReason::Stopped)]);
/// ```
pub struct BallisticsSimulation<R> {
    scene: R,
    config: BallisticsConfig,
    timers: FrameTimers<WorldTask>,
    wind: WindSourceLocator<WindDirectionalSource>,
    wind_sources: Vec<WindDirectionalSource>,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    next_id: u64,
}

impl<R: RayCaster> BallisticsSimulation<R> {
    /// Creates the world and schedules the wind source lookup.
    pub fn new(scene: R, config: BallisticsConfig) -> Self {
        let mut timers = FrameTimers::default();
        let mut wind = WindSourceLocator::default();
        wind.initialize(
            &mut timers,
            config.wind_resolution_delay,
            WorldTask::ResolveWindSource,
        );

        Self {
            scene,
            config,
            timers,
            wind,
            wind_sources: Vec::new(),
            projectiles: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Registers a wind emitter. Only emitters present when the lookup runs
    /// can become the world's wind source.
    pub fn add_wind_source(&mut self, source: WindDirectionalSource) {
        if self.wind.is_resolved() {
            warn!("wind source added after the world resolved its wind; it will be ignored");
        }
        self.wind_sources.push(source);
    }

    /// Places an inert projectile in the world and starts its lifetime.
    ///
    /// # Arguments
    /// * `spec` - Ballistic parameters
    /// * `position` - Spawn position (cm)
    /// * `forward` - Launch direction, any non-zero length
    /// * `owner` - Shooter, never hit by this projectile
    pub fn spawn(
        &mut self,
        spec: &ProjectileSpec,
        position: Vec3,
        forward: Vec3,
        owner: Option<ActorId>,
    ) -> Result<ProjectileId, ProjectileSpecError> {
        spec.validate()?;
        if !forward.is_finite() || forward.length_squared() <= f32::EPSILON {
            return Err(ProjectileSpecError::InvalidDirection);
        }

        let id = ProjectileId(self.next_id);
        self.next_id += 1;

        let mut projectile = Projectile::new(spec, position, forward).with_actor(id.actor());
        if let Some(owner) = owner {
            projectile = projectile.with_owner(owner);
        }
        let wind = self
            .wind
            .wind_source()
            .map(|source| source as &dyn WindProvider);
        projectile.on_spawn(wind);
        projectile.lifetime_timer = Some(
            self.timers
                .schedule(projectile.lifetime(), WorldTask::Expire(id)),
        );

        debug!(
            "spawned projectile {:?} at {:?}, wind {:?}",
            id,
            position,
            projectile.wind()
        );
        self.projectiles.insert(id, projectile);
        Ok(id)
    }

    /// Launches a spawned projectile. Returns `false` if it no longer exists.
    pub fn activate(&mut self, id: ProjectileId, velocity_multiplier: f32) -> bool {
        match self.projectiles.get_mut(&id) {
            Some(projectile) => {
                projectile.activate(velocity_multiplier);
                true
            }
            None => false,
        }
    }

    /// Advances the world by `dt` seconds.
    pub fn step<C>(&mut self, dt: f32, consumer: &mut C) -> StepReport
    where
        C: ImpactConsumer + ?Sized,
    {
        self.step_with_sink(dt, consumer, &mut ())
    }

    /// Advances the world by `dt` seconds, emitting debug shapes to `sink`.
    ///
    /// Due timers run first, then every live projectile flies one frame and
    /// its impact goes to `consumer`. Projectiles destroyed along the way are
    /// removed and listed in the report.
    pub fn step_with_sink<C, S>(&mut self, dt: f32, consumer: &mut C, sink: &mut S) -> StepReport
    where
        C: ImpactConsumer + ?Sized,
        S: TraceSink + ?Sized,
    {
        for task in self.timers.advance(dt) {
            match task {
                WorldTask::ResolveWindSource => {
                    let sources = &self.wind_sources;
                    match self.wind.resolve(|| sources.first().copied()) {
                        Some(source) => info!(
                            "resolved wind source: direction {:?}, speed {}",
                            source.direction, source.speed
                        ),
                        None => warn!("no wind source in the world, projectiles fly in calm air"),
                    }
                }
                WorldTask::Expire(id) => {
                    if let Some(projectile) = self.projectiles.get_mut(&id) {
                        projectile.lifetime_timer = None;
                        projectile.destroy(DestroyReason::Lifetime);
                    }
                }
            }
        }

        let mut report = StepReport::default();
        for (id, projectile) in self.projectiles.iter_mut() {
            if let Some(impact) =
                projectile.tick(dt, &self.config, &self.scene, &mut *sink, &mut *consumer)
            {
                report.impacts.push((*id, impact));
            }
        }

        let destroyed: Vec<(ProjectileId, DestroyReason)> = self
            .projectiles
            .iter()
            .filter_map(|(id, projectile)| projectile.destroy_reason().map(|reason| (*id, reason)))
            .collect();
        for (id, reason) in destroyed {
            self.remove(id, reason);
            report.destroyed.push((id, reason));
        }
        report
    }

    /// Destroys a projectile right away. Returns `false` if it was already gone.
    pub fn destroy(&mut self, id: ProjectileId, reason: DestroyReason) -> bool {
        let alive = self
            .projectiles
            .get_mut(&id)
            .is_some_and(|projectile| projectile.destroy(reason));
        if alive {
            self.remove(id, reason);
        }
        alive
    }

    fn remove(&mut self, id: ProjectileId, reason: DestroyReason) {
        if let Some(projectile) = self.projectiles.remove(&id) {
            if let Some(handle) = projectile.lifetime_timer {
                self.timers.cancel(handle);
            }
            debug!(
                "destroyed projectile {:?} ({:?}) at {:?} after {:.3}s",
                id, reason, projectile.position, projectile.age
            );
        }
    }

    /// Shuts the world down: cancels the pending wind lookup and drops every
    /// projectile and timer.
    pub fn teardown(&mut self) {
        self.wind.teardown(&mut self.timers);
        self.timers.clear();
        self.projectiles.clear();
    }

    pub fn projectile(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    pub fn projectile_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.projectiles.get_mut(&id)
    }

    pub fn projectiles(&self) -> impl Iterator<Item = (ProjectileId, &Projectile)> {
        self.projectiles.iter().map(|(id, projectile)| (*id, projectile))
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// The world's wind source, once resolved.
    pub fn wind_source(&self) -> Option<&WindDirectionalSource> {
        self.wind.wind_source()
    }

    pub fn is_wind_resolved(&self) -> bool {
        self.wind.is_resolved()
    }

    /// Pending timers (wind lookup and lifetimes).
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Simulated seconds since the world was created.
    pub fn elapsed(&self) -> f64 {
        self.timers.now()
    }

    pub fn config(&self) -> &BallisticsConfig {
        &self.config
    }

    pub fn scene(&self) -> &R {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut R {
        &mut self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::BoxScene;
    use crate::systems::surface::MaterialImpactPolicy;

    fn ignore_impacts(_: &mut Projectile, _: &ProjectileImpact) {}

    #[test]
    fn test_rejects_invalid_spawns() {
        let mut sim = BallisticsSimulation::new(BoxScene::default(), BallisticsConfig::default());
        let spec = ProjectileSpec::default();
        assert_eq!(
            sim.spawn(&spec, Vec3::ZERO, Vec3::ZERO, None),
            Err(ProjectileSpecError::InvalidDirection)
        );
        assert_eq!(
            sim.spawn(&spec.clone().with_weight_grains(0), Vec3::ZERO, Vec3::X, None),
            Err(ProjectileSpecError::ZeroWeight)
        );
        assert!(sim.is_empty());
    }

    #[test]
    fn test_projectile_ignores_its_owner() {
        let mut scene = BoxScene::default();
        let shooter = scene.add_box(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(-5.0, 10.0, 10.0));
        let config = BallisticsConfig {
            gravity: Vec3::ZERO,
            ..Default::default()
        };
        let mut sim = BallisticsSimulation::new(scene, config);
        let id = sim
            .spawn(&ProjectileSpec::default(), Vec3::new(-20.0, 0.0, 0.0), Vec3::X, Some(shooter))
            .unwrap();
        sim.activate(id, 1.0);

        let report = sim.step(1.0 / 60.0, &mut ignore_impacts);
        assert!(report.impacts.is_empty());
        assert!(sim.projectile(id).is_some_and(|p| p.ignored().contains(id.actor())));
    }

    #[test]
    fn test_destroy_cancels_lifetime() {
        let mut sim = BallisticsSimulation::new(BoxScene::default(), BallisticsConfig::default());
        let id = sim.spawn(&ProjectileSpec::default(), Vec3::ZERO, Vec3::X, None).unwrap();
        // wind lookup + lifetime
        assert_eq!(sim.pending_timers(), 2);
        assert!(sim.destroy(id, DestroyReason::Stopped));
        assert!(!sim.destroy(id, DestroyReason::Stopped));
        assert_eq!(sim.pending_timers(), 1);
        assert!(!sim.activate(id, 1.0));
    }

    #[test]
    fn test_teardown_before_wind_resolution() {
        let mut sim = BallisticsSimulation::new(BoxScene::default(), BallisticsConfig::default());
        sim.add_wind_source(WindDirectionalSource::new(Vec3::Z, 4.2));
        sim.spawn(&ProjectileSpec::default(), Vec3::ZERO, Vec3::X, None).unwrap();
        sim.teardown();

        let report = sim.step(5.0, &mut MaterialImpactPolicy::default());
        assert!(report.destroyed.is_empty());
        assert!(!sim.is_wind_resolved());
        assert!(sim.wind_source().is_none());
        assert_eq!(sim.pending_timers(), 0);
    }
}
