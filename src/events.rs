//! Events for the ballistics system.
//!
//! Note: In Bevy 0.18, buffered events use the `Message` trait instead of `Event`.

use bevy::ecs::message::Message;
use bevy::prelude::*;

use crate::components::ProjectileSpec;
use crate::systems::flight::ProjectileImpact;
use crate::systems::surface::ImpactResponse;
use crate::types::DestroyReason;

/// Request to spawn and launch a projectile.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hybrid_ballistics::prelude::*;
///
/// let fire = FireProjectileEvent::new(Vec3::new(0.0, 150.0, 0.0), Vec3::NEG_Z, ProjectileSpec::default())
///     .with_shooter(Entity::PLACEHOLDER)
///     .with_velocity_multiplier(0.9);
/// assert_eq!(fire.velocity_multiplier, 0.9);
/// ```
#[derive(Message, Clone, Debug)]
pub struct FireProjectileEvent {
    /// Muzzle position (cm)
    pub origin: Vec3,
    /// Launch direction
    pub direction: Vec3,
    pub spec: ProjectileSpec,
    /// Shooter entity, never hit by its own projectile
    pub shooter: Option<Entity>,
    /// Scales the muzzle velocity at launch
    pub velocity_multiplier: f32,
}

impl FireProjectileEvent {
    pub fn new(origin: Vec3, direction: Vec3, spec: ProjectileSpec) -> Self {
        Self {
            origin,
            direction,
            spec,
            shooter: None,
            velocity_multiplier: 1.0,
        }
    }

    /// Sets the shooter entity for ownership tracking.
    pub fn with_shooter(mut self, shooter: Entity) -> Self {
        self.shooter = Some(shooter);
        self
    }

    pub fn with_velocity_multiplier(mut self, multiplier: f32) -> Self {
        self.velocity_multiplier = multiplier;
        self
    }
}

/// Launches (or relaunches) an already spawned projectile.
#[derive(Message, Clone, Copy, Debug)]
pub struct ActivateProjectileEvent {
    pub projectile: Entity,
    pub velocity_multiplier: f32,
}

/// A projectile struck something.
///
/// Nothing happens to the projectile until an [`ImpactResponseEvent`]
/// answers this impact.
#[derive(Message, Clone, Copy, Debug)]
pub struct ProjectileImpactEvent {
    pub projectile: Entity,
    pub impact: ProjectileImpact,
    /// Normalized impact force at the moment of impact
    pub impact_force: f32,
}

/// The game's decision for an impact, applied before the next update.
#[derive(Message, Clone, Copy, Debug)]
pub struct ImpactResponseEvent {
    pub projectile: Entity,
    pub response: ImpactResponse,
    pub impact: ProjectileImpact,
}

/// A projectile left the simulation.
#[derive(Message, Clone, Copy, Debug)]
pub struct ProjectileDestroyedEvent {
    pub projectile: Entity,
    pub reason: DestroyReason,
    /// Last position (cm)
    pub position: Vec3,
}
