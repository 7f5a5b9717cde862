//! Common types and traits shared by the simulator and its collaborators.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::SurfaceMaterial;

/// Identity of something a trace can hit or ignore.
///
/// Inside a Bevy world this is derived from the [`Entity`] bits; headless
/// scenes hand out their own ids.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hybrid_ballistics::types::ActorId;
///
/// let id = ActorId::from(Entity::PLACEHOLDER);
/// assert_eq!(id, ActorId(Entity::PLACEHOLDER.to_bits()));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Reflect)]
pub struct ActorId(pub u64);

impl From<Entity> for ActorId {
    fn from(entity: Entity) -> Self {
        Self(entity.to_bits())
    }
}

/// Trace channel a projectile sweeps along.
///
/// Each channel maps onto one collision layer bit when traces are served by
/// the physics backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Reflect, Serialize, Deserialize)]
pub enum CollisionChannel {
    #[default]
    /// Line-of-sight queries (default for bullets)
    Visibility,
    /// Camera blocking geometry
    Camera,
    /// Static level geometry
    WorldStatic,
    /// Movable level geometry
    WorldDynamic,
    /// Characters
    Pawn,
    /// Simulated rigid bodies
    PhysicsBody,
    /// Vehicles
    Vehicle,
    /// Destructible meshes
    Destructible,
    /// Game-defined channel, `0..=23`
    Custom(u8),
}

impl CollisionChannel {
    /// Collision layer bit used for this channel.
    pub fn layer_bits(self) -> u32 {
        match self {
            Self::Visibility => 1 << 0,
            Self::Camera => 1 << 1,
            Self::WorldStatic => 1 << 2,
            Self::WorldDynamic => 1 << 3,
            Self::Pawn => 1 << 4,
            Self::PhysicsBody => 1 << 5,
            Self::Vehicle => 1 << 6,
            Self::Destructible => 1 << 7,
            Self::Custom(index) => 1 << (8 + u32::from(index.min(23))),
        }
    }
}

/// Kind of body a trace hit.
///
/// Skeletal bodies (characters) are ignored for the rest of a projectile's
/// flight after the first hit so the bullet can pass through limbs without
/// being reported again.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub enum BodyKind {
    #[default]
    Static,
    Skeletal,
}

/// Result of a line trace.
///
/// # Fields
/// * `trace_start` - Start of the trace that produced this hit
/// * `location` - Location of the trace at the moment of impact
/// * `impact_point` - Point on the surface that was hit (same as `location` for line traces)
/// * `normal` - Surface normal used for reflection
/// * `impact_normal` - Normal of the impacted face
/// * `distance` - Distance from `trace_start` to `location`
/// * `actor` - Identity of the hit object, if it has one
/// * `body` - Whether the hit body is static or skeletal
/// * `physical_material` - Surface response data of the hit object
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitInfo {
    pub trace_start: Vec3,
    pub location: Vec3,
    pub impact_point: Vec3,
    pub normal: Vec3,
    pub impact_normal: Vec3,
    pub distance: f32,
    pub actor: Option<ActorId>,
    pub body: BodyKind,
    pub physical_material: Option<SurfaceMaterial>,
}

/// Actors a trace must pass through.
#[derive(Clone, Debug, Default, PartialEq, Reflect)]
pub struct IgnoreSet {
    actors: Vec<ActorId>,
}

impl IgnoreSet {
    /// Creates a set from the given actors, skipping `None` entries.
    pub fn from_actors(actors: impl IntoIterator<Item = Option<ActorId>>) -> Self {
        let mut set = Self::default();
        for actor in actors.into_iter().flatten() {
            set.insert(actor);
        }
        set
    }

    /// Adds an actor. Returns `false` if it was already ignored.
    pub fn insert(&mut self, actor: ActorId) -> bool {
        if self.contains(actor) {
            return false;
        }
        self.actors.push(actor);
        true
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.actors.contains(&actor)
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

/// World ray-cast service.
///
/// Implementations report the first blocking hit along `start -> end` on
/// `channel`, skipping every actor in `ignore`. A missing hit means the
/// segment is unobstructed; there is no failure case.
pub trait RayCaster {
    fn line_trace(
        &self,
        start: Vec3,
        end: Vec3,
        channel: CollisionChannel,
        ignore: &IgnoreSet,
    ) -> Option<HitInfo>;
}

impl<R: RayCaster + ?Sized> RayCaster for &R {
    fn line_trace(
        &self,
        start: Vec3,
        end: Vec3,
        channel: CollisionChannel,
        ignore: &IgnoreSet,
    ) -> Option<HitInfo> {
        (**self).line_trace(start, end, channel, ignore)
    }
}

/// Optional receiver for debug geometry emitted while simulating.
///
/// Nothing in the simulation depends on a sink being present; `()` discards
/// everything.
pub trait TraceSink {
    fn on_debug_segment(&mut self, start: Vec3, end: Vec3, color: Color);

    fn on_debug_sphere(&mut self, _center: Vec3, _radius: f32, _color: Color) {}
}

impl TraceSink for () {
    fn on_debug_segment(&mut self, _start: Vec3, _end: Vec3, _color: Color) {}
}

/// Why a projectile left the simulation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Reflect)]
pub enum DestroyReason {
    /// Hard lifetime elapsed
    Lifetime,
    /// Ricochet budget used up
    RicochetsExhausted,
    /// Speed dropped to ~0 after a penetration or ricochet
    Spent,
    /// The impact consumer asked for the projectile to stop
    Stopped,
}

/// Lifecycle state of a projectile.
///
/// `Destroyed` is terminal.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub enum ProjectileState {
    #[default]
    /// Spawned, not launched yet
    Inert,
    /// Launched and integrating
    Flying,
    /// Out of the simulation
    Destroyed(DestroyReason),
}
