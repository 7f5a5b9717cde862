//! Core components for the ballistics system.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ProjectileSpecError;
use crate::schedule::TimerHandle;
use crate::systems::surface::reflect_direction;
use crate::types::{
    ActorId, CollisionChannel, DestroyReason, HitInfo, IgnoreSet, ProjectileState,
};
use crate::wind::{WindProvider, WindSample};

/// Feet per second to centimeters per second.
pub const FEET_TO_CENTIMETERS: f32 = 30.48;

/// `sqrt(speed * grains)` value that maps to an impact force of 1.0.
pub const IMPACT_FORCE_RANGE: f32 = 5000.0;

/// Distance (cm) a projectile is placed past a surface after ricochet or penetration.
pub const SURFACE_OFFSET: f32 = 1.0;

/// Per-axis velocity tolerance under which a projectile counts as stopped.
pub const STOP_VELOCITY_TOLERANCE: f32 = 0.01;

/// One key of a [`DragCurve`].
#[derive(Clone, Copy, Debug, PartialEq, Reflect, Serialize, Deserialize)]
pub struct CurveKey {
    /// Seconds since the projectile spawned
    pub time: f32,
    /// Dimensionless drag multiplier
    pub value: f32,
}

/// Drag coefficient multiplier over flight time.
///
/// Piecewise linear between keys and clamped to the first/last key outside
/// their range. An empty curve evaluates to `0.0`.
///
/// # Example
/// ```
/// use bevy_hybrid_ballistics::components::DragCurve;
///
/// let curve = DragCurve::new([(0.0, 1.0), (2.0, 3.0)]);
/// assert_eq!(curve.evaluate(1.0), 2.0);
/// assert_eq!(curve.evaluate(5.0), 3.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct DragCurve {
    keys: Vec<CurveKey>,
}

impl DragCurve {
    /// Builds a curve from `(time, value)` pairs in any order.
    ///
    /// Keys with a non-finite time or value are dropped.
    pub fn new(keys: impl IntoIterator<Item = (f32, f32)>) -> Self {
        keys.into_iter()
            .map(|(time, value)| CurveKey { time, value })
            .collect::<Vec<_>>()
            .into()
    }

    /// A curve that returns `value` at every time.
    pub fn constant(value: f32) -> Self {
        Self::new([(0.0, value)])
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Samples the curve at `time` seconds.
    ///
    /// Times before the first key, and NaN, read the first key's value.
    pub fn evaluate(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if time.is_nan() || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let upper = self.keys.partition_point(|key| key.time <= time);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }
        a.value + (b.value - a.value) * ((time - a.time) / span)
    }
}

impl From<Vec<CurveKey>> for DragCurve {
    fn from(mut keys: Vec<CurveKey>) -> Self {
        keys.retain(|key| key.time.is_finite() && key.value.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }
}

impl From<DragCurve> for Vec<CurveKey> {
    fn from(curve: DragCurve) -> Self {
        curve.keys
    }
}

/// Static ballistic parameters of a round.
///
/// Defaults describe a 55 grain rifle bullet at 3200 ft/s.
///
/// # Example
/// ```
/// use bevy_hybrid_ballistics::components::{DragCurve, ProjectileSpec};
///
/// let spec = ProjectileSpec::default()
///     .with_velocity_fps(2800.0)
///     .with_weight_grains(147)
///     .with_drag_curve(DragCurve::constant(1.0));
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSpec {
    /// Muzzle velocity (ft/s)
    pub velocity_fps: f32,
    /// Bullet weight (grains)
    pub bullet_weight_grains: u16,
    /// Ricochets allowed before the projectile is destroyed
    pub max_ricochets: u8,
    /// Whether the world wind pushes this projectile
    pub affected_by_wind: bool,
    /// Channel the per-frame sweep traces on
    pub collision_channel: CollisionChannel,
    /// Drag multiplier over flight time; `None` disables drag
    pub drag_curve: Option<DragCurve>,
    /// Hard lifetime (seconds)
    pub lifetime: f32,
    /// Emit the flight path to the debug sink
    pub draw_path: bool,
    /// Emit a sphere at every impact to the debug sink
    pub draw_impact_sphere: bool,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            velocity_fps: 3200.0,
            bullet_weight_grains: 55,
            max_ricochets: 4,
            affected_by_wind: true,
            collision_channel: CollisionChannel::Visibility,
            drag_curve: None,
            lifetime: 10.0,
            draw_path: false,
            draw_impact_sphere: false,
        }
    }
}

impl ProjectileSpec {
    pub fn with_velocity_fps(mut self, velocity_fps: f32) -> Self {
        self.velocity_fps = velocity_fps;
        self
    }

    pub fn with_weight_grains(mut self, grains: u16) -> Self {
        self.bullet_weight_grains = grains;
        self
    }

    pub fn with_max_ricochets(mut self, max_ricochets: u8) -> Self {
        self.max_ricochets = max_ricochets;
        self
    }

    pub fn with_drag_curve(mut self, curve: DragCurve) -> Self {
        self.drag_curve = Some(curve);
        self
    }

    pub fn with_wind(mut self, affected_by_wind: bool) -> Self {
        self.affected_by_wind = affected_by_wind;
        self
    }

    pub fn with_channel(mut self, channel: CollisionChannel) -> Self {
        self.collision_channel = channel;
        self
    }

    pub fn with_debug_draw(mut self, path: bool, impact_sphere: bool) -> Self {
        self.draw_path = path;
        self.draw_impact_sphere = impact_sphere;
        self
    }

    /// Checks the parameters a projectile cannot fly with.
    pub fn validate(&self) -> Result<(), ProjectileSpecError> {
        if !self.velocity_fps.is_finite() || self.velocity_fps <= 0.0 {
            return Err(ProjectileSpecError::InvalidVelocity(self.velocity_fps));
        }
        if self.bullet_weight_grains == 0 {
            return Err(ProjectileSpecError::ZeroWeight);
        }
        if !self.lifetime.is_finite() || self.lifetime <= 0.0 {
            return Err(ProjectileSpecError::InvalidLifetime(self.lifetime));
        }
        Ok(())
    }
}

/// A fired round and its full simulation state.
///
/// Units are centimeters and seconds. The projectile is spawned inert; call
/// [`Projectile::on_spawn`] once it is placed in the world and
/// [`Projectile::activate`] to launch it.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hybrid_ballistics::components::{Projectile, ProjectileSpec};
///
/// let mut projectile = Projectile::new(&ProjectileSpec::default(), Vec3::ZERO, Vec3::X);
/// projectile.on_spawn(None);
/// projectile.activate(1.0);
/// assert!((projectile.velocity.x - 3200.0 * 30.48).abs() < 1.0);
/// ```
#[derive(Component, Reflect, Clone, Debug)]
#[reflect(Component)]
pub struct Projectile {
    /// Current world position (cm)
    pub position: Vec3,
    /// Position at the end of the previous update; start of the swept trace
    pub previous_position: Vec3,
    /// Current velocity (cm/s)
    pub velocity: Vec3,
    /// Travel direction
    pub forward: Vec3,
    /// Drag multiplier over flight time
    pub drag_curve: Option<DragCurve>,
    /// Seconds since spawn
    pub age: f32,
    velocity_fps: f32,
    base_speed: f32,
    max_speed: f32,
    bullet_weight_grains: u16,
    ricochet_count: u8,
    max_ricochets: u8,
    affected_by_wind: bool,
    collision_channel: CollisionChannel,
    lifetime: f32,
    draw_path: bool,
    draw_impact_sphere: bool,
    wind: WindSample,
    ignore: IgnoreSet,
    actor: Option<ActorId>,
    owner: Option<ActorId>,
    movement_active: bool,
    pending_force: Vec3,
    pending_activation: Option<f32>,
    spawned: bool,
    state: ProjectileState,
    pub(crate) lifetime_timer: Option<TimerHandle>,
}

impl Projectile {
    /// Creates an inert projectile at `position` facing `forward`.
    ///
    /// A zero `forward` falls back to `-Z`.
    pub fn new(spec: &ProjectileSpec, position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            previous_position: position,
            velocity: Vec3::ZERO,
            forward: forward.try_normalize().unwrap_or(Vec3::NEG_Z),
            drag_curve: spec.drag_curve.clone(),
            age: 0.0,
            velocity_fps: spec.velocity_fps,
            base_speed: spec.velocity_fps,
            max_speed: spec.velocity_fps * 100.0,
            bullet_weight_grains: spec.bullet_weight_grains,
            ricochet_count: 0,
            max_ricochets: spec.max_ricochets,
            affected_by_wind: spec.affected_by_wind,
            collision_channel: spec.collision_channel,
            lifetime: spec.lifetime,
            draw_path: spec.draw_path,
            draw_impact_sphere: spec.draw_impact_sphere,
            wind: WindSample::CALM,
            ignore: IgnoreSet::default(),
            actor: None,
            owner: None,
            movement_active: false,
            pending_force: Vec3::ZERO,
            pending_activation: None,
            spawned: false,
            state: ProjectileState::Inert,
            lifetime_timer: None,
        }
    }

    /// Builder pattern: set the shooter, which traces will never hit.
    pub fn with_owner(mut self, owner: ActorId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Builder pattern: set the projectile's own identity in the world.
    pub fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Places the projectile in the world.
    ///
    /// Converts the muzzle velocity to cm/s, pins the swept-trace start to
    /// the spawn position, snapshots the wind at the spawn location and adds
    /// the projectile and its owner to the trace ignore set. Only the first
    /// call has an effect. A launch requested before this point is applied
    /// here.
    pub fn on_spawn(&mut self, wind: Option<&dyn WindProvider>) {
        if self.spawned {
            return;
        }
        self.spawned = true;
        self.base_speed = self.velocity_fps * FEET_TO_CENTIMETERS;
        self.previous_position = self.position;
        self.wind = wind
            .map(|provider| provider.wind_at(self.position))
            .unwrap_or(WindSample::CALM);
        for actor in [self.actor, self.owner].into_iter().flatten() {
            self.ignore.insert(actor);
        }

        if let Some(multiplier) = self.pending_activation.take() {
            self.activate(multiplier);
        }
    }

    /// Launches the projectile along `forward` at `base_speed * velocity_multiplier`.
    ///
    /// Calling it again resets the velocity. Has no effect once destroyed.
    pub fn activate(&mut self, velocity_multiplier: f32) {
        if self.is_destroyed() {
            return;
        }
        if !self.spawned {
            self.pending_activation = Some(velocity_multiplier);
            return;
        }
        self.velocity = self.forward * (self.base_speed * velocity_multiplier);
        self.movement_active = true;
        self.state = ProjectileState::Flying;
    }

    /// Reflects the projectile off `hit`.
    ///
    /// The incoming direction is the look-at direction from the trace start to
    /// the impact point. Speed is kept, then scaled by `velocity_multiplier`.
    /// Once `max_ricochets` reflections have happened the next call destroys
    /// the projectile instead, so `max_ricochets = 4` allows four bounces.
    /// Implementations that count the hit before comparing allow one fewer
    /// bounce for the same setting; add one when porting their values.
    pub fn perform_ricochet(&mut self, hit: &HitInfo, velocity_multiplier: f32) {
        if self.is_destroyed() {
            return;
        }
        if self.ricochet_count >= self.max_ricochets {
            self.destroy(DestroyReason::RicochetsExhausted);
            return;
        }
        self.ricochet_count += 1;

        let incoming = (hit.impact_point - hit.trace_start)
            .try_normalize()
            .unwrap_or(self.forward);
        let direction = reflect_direction(incoming, hit.normal);
        let speed = self.velocity.length();

        self.teleport(hit.location + direction * SURFACE_OFFSET);
        self.forward = direction;
        self.velocity = direction * speed * velocity_multiplier;
        self.destroy_if_stopped();
    }

    /// Moves the projectile just past a penetration exit point and scales its velocity.
    pub fn set_at_penetrated_location(&mut self, location: Vec3, velocity_multiplier: f32) {
        if self.is_destroyed() {
            return;
        }
        self.teleport(location + self.forward * SURFACE_OFFSET);
        self.velocity *= velocity_multiplier;
        self.destroy_if_stopped();
    }

    /// Normalized impact force in `[0, 1]` for damage systems.
    pub fn calculate_impact_force(&self) -> f32 {
        let power = (self.velocity.length() * f32::from(self.bullet_weight_grains)).sqrt();
        (power / IMPACT_FORCE_RANGE).clamp(0.0, 1.0)
    }

    /// Raw muzzle power, `sqrt(base_speed * grains)`.
    pub fn projectile_power(&self) -> f32 {
        (self.base_speed * f32::from(self.bullet_weight_grains)).sqrt()
    }

    /// Removes the projectile from the simulation. Returns `false` if it was
    /// already destroyed.
    pub fn destroy(&mut self, reason: DestroyReason) -> bool {
        if self.is_destroyed() {
            return false;
        }
        self.state = ProjectileState::Destroyed(reason);
        self.movement_active = false;
        self.pending_force = Vec3::ZERO;
        true
    }

    /// Queues a force for the next movement step.
    pub fn add_force(&mut self, force: Vec3) {
        self.pending_force += force;
    }

    pub(crate) fn take_pending_force(&mut self) -> Vec3 {
        std::mem::take(&mut self.pending_force)
    }

    /// Ignores `actor` in every following sweep.
    pub fn ignore_actor(&mut self, actor: ActorId) -> bool {
        self.ignore.insert(actor)
    }

    fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.previous_position = position;
    }

    fn destroy_if_stopped(&mut self) {
        if self.velocity.abs().max_element() <= STOP_VELOCITY_TOLERANCE {
            self.destroy(DestroyReason::Spent);
        }
    }

    pub fn state(&self) -> ProjectileState {
        self.state
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, ProjectileState::Destroyed(_))
    }

    pub fn destroy_reason(&self) -> Option<DestroyReason> {
        match self.state {
            ProjectileState::Destroyed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_spawned(&self) -> bool {
        self.spawned
    }

    pub fn is_movement_active(&self) -> bool {
        self.movement_active
    }

    /// Muzzle velocity as authored (ft/s).
    pub fn velocity_fps(&self) -> f32 {
        self.velocity_fps
    }

    /// Launch speed (cm/s once spawned).
    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn bullet_weight_grains(&self) -> u16 {
        self.bullet_weight_grains
    }

    pub fn ricochet_count(&self) -> u8 {
        self.ricochet_count
    }

    pub fn max_ricochets(&self) -> u8 {
        self.max_ricochets
    }

    pub fn affected_by_wind(&self) -> bool {
        self.affected_by_wind
    }

    pub fn collision_channel(&self) -> CollisionChannel {
        self.collision_channel
    }

    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    pub fn draws_path(&self) -> bool {
        self.draw_path
    }

    pub fn draws_impact_sphere(&self) -> bool {
        self.draw_impact_sphere
    }

    /// Wind captured at spawn.
    pub fn wind(&self) -> WindSample {
        self.wind
    }

    pub fn ignored(&self) -> &IgnoreSet {
        &self.ignore
    }

    pub fn actor(&self) -> Option<ActorId> {
        self.actor
    }

    pub fn owner(&self) -> Option<ActorId> {
        self.owner
    }

    pub(crate) fn set_actor(&mut self, actor: ActorId) {
        self.actor = Some(actor);
        if self.spawned {
            self.ignore.insert(actor);
        }
    }
}

/// How a surface responds to bullets.
///
/// Read by [`MaterialImpactPolicy`](crate::systems::surface::MaterialImpactPolicy)
/// to pick between penetrating, ricocheting and stopping.
///
/// # Example
/// ```
/// use bevy_hybrid_ballistics::components::SurfaceMaterial;
///
/// let plywood = SurfaceMaterial {
///     max_penetration_thickness: 4.0,
///     penetration_velocity_multiplier: 0.7,
///     ricochet_angle: 80.0,
///     ricochet_velocity_multiplier: 0.4,
/// };
/// assert!(plywood.max_penetration_thickness > 0.0);
/// ```
#[derive(Component, Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Component)]
pub struct SurfaceMaterial {
    /// Thickest section (cm) a projectile passes through
    pub max_penetration_thickness: f32,
    /// Velocity kept after passing through
    pub penetration_velocity_multiplier: f32,
    /// Impact angle (degrees, 0 is head-on, 90 is grazing) above which projectiles ricochet
    pub ricochet_angle: f32,
    /// Velocity kept after a ricochet
    pub ricochet_velocity_multiplier: f32,
}

impl Default for SurfaceMaterial {
    /// Generic hard surface: stops everything except grazing hits.
    fn default() -> Self {
        Self {
            max_penetration_thickness: 0.0,
            penetration_velocity_multiplier: 0.0,
            ricochet_angle: 75.0,
            ricochet_velocity_multiplier: 0.5,
        }
    }
}

/// Marks a body as skeletal (characters, ragdolls).
#[derive(Component, Reflect, Default, Clone, Copy)]
#[reflect(Component)]
pub struct SkeletalBody;

/// Ambient directional wind emitter.
///
/// The first one found in a world becomes that world's wind source.
#[derive(Component, Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Component)]
pub struct WindDirectionalSource {
    /// Direction the wind blows towards
    pub direction: Vec3,
    /// Wind speed
    pub speed: f32,
}

impl Default for WindDirectionalSource {
    fn default() -> Self {
        Self {
            direction: Vec3::X,
            speed: 0.1,
        }
    }
}

impl WindDirectionalSource {
    pub fn new(direction: Vec3, speed: f32) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            speed,
        }
    }
}

impl WindProvider for WindDirectionalSource {
    fn wind_at(&self, _location: Vec3) -> WindSample {
        WindSample {
            direction: self.direction,
            speed: self.speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BodyKind;

    fn launched(spec: &ProjectileSpec) -> Projectile {
        let mut projectile = Projectile::new(spec, Vec3::ZERO, Vec3::X);
        projectile.on_spawn(None);
        projectile.activate(1.0);
        projectile
    }

    fn wall_hit(trace_start: Vec3, point: Vec3, normal: Vec3) -> HitInfo {
        HitInfo {
            trace_start,
            location: point,
            impact_point: point,
            normal,
            impact_normal: normal,
            distance: trace_start.distance(point),
            actor: Some(ActorId(7)),
            body: BodyKind::Static,
            physical_material: None,
        }
    }

    #[test]
    fn test_drag_curve_interpolation() {
        let curve = DragCurve::new([(2.0, 4.0), (0.0, 0.0), (f32::NAN, 1.0)]);
        assert_eq!(curve.keys().len(), 2);
        assert_eq!(curve.evaluate(-1.0), 0.0);
        assert_eq!(curve.evaluate(1.0), 2.0);
        assert_eq!(curve.evaluate(3.0), 4.0);
        assert_eq!(DragCurve::default().evaluate(1.0), 0.0);
        assert_eq!(DragCurve::constant(0.3).evaluate(100.0), 0.3);
    }

    #[test]
    fn test_drag_curve_nan_time_reads_first_key() {
        let curve = DragCurve::new([(0.0, 0.25), (1.0, 0.5)]);
        assert_eq!(curve.evaluate(f32::NAN), 0.25);
        assert_eq!(curve.evaluate(f32::NEG_INFINITY), 0.25);
        assert_eq!(curve.evaluate(f32::INFINITY), 0.5);
    }

    #[test]
    fn test_spawn_converts_velocity_once() {
        let mut projectile = Projectile::new(&ProjectileSpec::default(), Vec3::ONE, Vec3::X);
        projectile.on_spawn(None);
        projectile.on_spawn(None);
        assert!((projectile.base_speed() - 3200.0 * FEET_TO_CENTIMETERS).abs() < 0.01);
        assert_eq!(projectile.previous_position, Vec3::ONE);
        assert_eq!(projectile.state(), ProjectileState::Inert);
    }

    #[test]
    fn test_spawn_ignores_self_and_owner() {
        let mut projectile = Projectile::new(&ProjectileSpec::default(), Vec3::ZERO, Vec3::X)
            .with_actor(ActorId(1))
            .with_owner(ActorId(2));
        projectile.on_spawn(None);
        assert!(projectile.ignored().contains(ActorId(1)));
        assert!(projectile.ignored().contains(ActorId(2)));
    }

    #[test]
    fn test_activation_before_spawn_is_deferred() {
        let mut projectile = Projectile::new(&ProjectileSpec::default(), Vec3::ZERO, Vec3::X);
        projectile.activate(0.5);
        assert_eq!(projectile.velocity, Vec3::ZERO);
        projectile.on_spawn(None);
        let expected = 3200.0 * FEET_TO_CENTIMETERS * 0.5;
        assert!((projectile.velocity.length() - expected).abs() < 0.01);
        assert_eq!(projectile.state(), ProjectileState::Flying);
    }

    #[test]
    fn test_spawn_captures_wind() {
        let source = WindDirectionalSource::new(Vec3::Z, 4.2);
        let mut projectile = Projectile::new(&ProjectileSpec::default(), Vec3::ZERO, Vec3::X);
        projectile.on_spawn(Some(&source));
        assert_eq!(projectile.wind().direction, Vec3::Z);
        assert_eq!(projectile.wind().speed, 4.2);
    }

    #[test]
    fn test_impact_force_is_clamped_and_monotonic() {
        let spec = ProjectileSpec::default();
        let mut projectile = launched(&spec);
        let fast = projectile.calculate_impact_force();
        projectile.velocity *= 0.25;
        let slow = projectile.calculate_impact_force();
        assert!(slow < fast);
        assert!(fast <= 1.0 && slow >= 0.0);

        projectile.velocity = Vec3::X * 1.0e9;
        assert_eq!(projectile.calculate_impact_force(), 1.0);
        projectile.velocity = Vec3::ZERO;
        assert_eq!(projectile.calculate_impact_force(), 0.0);
    }

    #[test]
    fn test_ricochet_reflects_and_offsets() {
        let mut projectile = launched(&ProjectileSpec::default());
        let speed = projectile.velocity.length();
        let hit = wall_hit(Vec3::new(0.0, 10.0, 0.0), Vec3::new(10.0, 0.0, 0.0), Vec3::Y);

        projectile.perform_ricochet(&hit, 0.5);

        let incoming = Vec3::new(1.0, -1.0, 0.0).normalize();
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!(reflect_direction(incoming, Vec3::Y).abs_diff_eq(expected, 1e-5));
        assert!(projectile.forward.abs_diff_eq(expected, 1e-5));
        assert!((projectile.velocity.length() - speed * 0.5).abs() < 0.1);
        assert!(projectile.position.abs_diff_eq(hit.location + expected, 1e-4));
        assert_eq!(projectile.previous_position, projectile.position);
        assert_eq!(projectile.ricochet_count(), 1);
    }

    #[test]
    fn test_ricochet_budget_destroys() {
        let mut projectile = launched(&ProjectileSpec::default().with_max_ricochets(1));
        let hit = wall_hit(Vec3::ZERO, Vec3::X * 10.0, Vec3::NEG_X);

        projectile.perform_ricochet(&hit, 1.0);
        assert!(!projectile.is_destroyed());
        projectile.perform_ricochet(&hit, 1.0);
        assert_eq!(projectile.destroy_reason(), Some(DestroyReason::RicochetsExhausted));
        assert_eq!(projectile.ricochet_count(), 1);
    }

    #[test]
    fn test_zero_multiplier_spends_projectile() {
        let mut projectile = launched(&ProjectileSpec::default());
        projectile.set_at_penetrated_location(Vec3::X * 50.0, 0.0);
        assert_eq!(projectile.destroy_reason(), Some(DestroyReason::Spent));
        assert!(projectile.position.abs_diff_eq(Vec3::X * 51.0, 1e-4));

        let mut projectile = launched(&ProjectileSpec::default());
        let hit = wall_hit(Vec3::ZERO, Vec3::X * 10.0, Vec3::NEG_X);
        projectile.perform_ricochet(&hit, 0.0);
        assert_eq!(projectile.destroy_reason(), Some(DestroyReason::Spent));
    }

    #[test]
    fn test_destroy_is_terminal() {
        let mut projectile = launched(&ProjectileSpec::default());
        assert!(projectile.destroy(DestroyReason::Stopped));
        assert!(!projectile.destroy(DestroyReason::Lifetime));
        projectile.activate(1.0);
        assert_eq!(projectile.destroy_reason(), Some(DestroyReason::Stopped));
        assert!(!projectile.is_movement_active());
    }

    #[test]
    fn test_spec_validation() {
        assert!(ProjectileSpec::default().validate().is_ok());
        assert_eq!(
            ProjectileSpec::default().with_velocity_fps(0.0).validate(),
            Err(ProjectileSpecError::InvalidVelocity(0.0))
        );
        assert_eq!(
            ProjectileSpec::default().with_weight_grains(0).validate(),
            Err(ProjectileSpecError::ZeroWeight)
        );
        let spec = ProjectileSpec {
            lifetime: -1.0,
            ..Default::default()
        };
        assert_eq!(spec.validate(), Err(ProjectileSpecError::InvalidLifetime(-1.0)));
    }
}
