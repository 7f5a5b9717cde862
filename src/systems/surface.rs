//! Surface interaction - penetration thickness, impact angle, ricochet
//! reflection and the impact responses built on them.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::components::{Projectile, SurfaceMaterial};
use crate::events::{ImpactResponseEvent, ProjectileImpactEvent};
use crate::systems::flight::ProjectileImpact;
use crate::types::{ActorId, CollisionChannel, DestroyReason, HitInfo, IgnoreSet, RayCaster};

/// Reflects `direction` about a surface with normal `normal`.
///
/// `r = d - 2(d·n)n`. The normal does not need to be unit length; a zero
/// normal leaves the direction unchanged.
pub fn reflect_direction(direction: Vec3, normal: Vec3) -> Vec3 {
    let normal = normal.normalize_or_zero();
    direction - 2.0 * direction.dot(normal) * normal
}

/// Angle (degrees) between the travel direction and the surface, measured
/// as deviation from a perpendicular hit.
///
/// `180 - acos(forward · impact_normal)`: 0 for a head-on hit, 90 for a
/// grazing one.
pub fn impact_angle(forward: Vec3, impact_normal: Vec3) -> f32 {
    let cos = forward
        .normalize_or_zero()
        .dot(impact_normal.normalize_or_zero())
        .clamp(-1.0, 1.0);
    180.0 - cos.acos().to_degrees()
}

/// Estimates how thick the struck object is along the projectile's path.
///
/// Casts forward from the impact point for `trace_distance`, ignoring the
/// struck actor, then casts back from wherever that ray stopped towards the
/// impact point. The back ray lands on the exit face of the struck object.
/// Returns the distance between entry and exit and the exit location.
///
/// This only uses ray casts, so it approximates: geometry between the
/// object's exit face and the end of the forward ray can shorten the
/// measurement for some concave shapes. When the back ray finds nothing the
/// object has no measurable depth and the impact point is returned with a
/// thickness of 0.
///
/// # Arguments
/// * `caster` - World ray-cast service
/// * `hit` - The impact being measured
/// * `forward` - Projectile travel direction
/// * `channel` - Trace channel of the projectile
/// * `projectile` - The projectile's own identity, always ignored
/// * `trace_distance` - Length of the forward probe (cm)
pub fn calculate_hit_thickness<R: RayCaster + ?Sized>(
    caster: &R,
    hit: &HitInfo,
    forward: Vec3,
    channel: CollisionChannel,
    projectile: Option<ActorId>,
    trace_distance: f32,
) -> (f32, Vec3) {
    let end = hit.location + forward.normalize_or_zero() * trace_distance;
    let out_ignore = IgnoreSet::from_actors([projectile, hit.actor]);
    let out_hit = caster.line_trace(hit.location, end, channel, &out_ignore);
    let back_start = out_hit.map_or(end, |out| out.location);

    let back_ignore = IgnoreSet::from_actors([projectile, out_hit.and_then(|out| out.actor)]);
    match caster.line_trace(back_start, hit.location, channel, &back_ignore) {
        Some(back) => (back.location.distance(hit.location), back.location),
        None => (0.0, hit.location),
    }
}

/// What the game decided to do with a projectile after an impact.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub enum ImpactResponse {
    /// Leave the projectile as it is
    Ignore,
    /// Destroy the projectile where it struck
    Stop,
    /// Continue from the exit point of the struck object
    Penetrate { velocity_multiplier: f32 },
    /// Bounce off the struck surface
    Ricochet { velocity_multiplier: f32 },
}

impl ImpactResponse {
    /// Carries the response out on `projectile`.
    pub fn apply(self, projectile: &mut Projectile, impact: &ProjectileImpact) {
        match self {
            Self::Ignore => {}
            Self::Stop => {
                if projectile.destroy(DestroyReason::Stopped) {
                    projectile.position = impact.hit.location;
                    projectile.previous_position = impact.hit.location;
                }
            }
            Self::Penetrate {
                velocity_multiplier,
            } => projectile.set_at_penetrated_location(impact.penetrated_location, velocity_multiplier),
            Self::Ricochet {
                velocity_multiplier,
            } => projectile.perform_ricochet(&impact.hit, velocity_multiplier),
        }
    }
}

/// Receives impacts and decides between penetrating, ricocheting and stopping.
///
/// The simulator never decides this itself. Implementations call back into
/// the projectile, usually through [`ImpactResponse::apply`].
pub trait ImpactConsumer {
    fn on_impact(&mut self, projectile: &mut Projectile, impact: &ProjectileImpact);
}

impl<F> ImpactConsumer for F
where
    F: FnMut(&mut Projectile, &ProjectileImpact),
{
    fn on_impact(&mut self, projectile: &mut Projectile, impact: &ProjectileImpact) {
        self(projectile, impact)
    }
}

/// Impact consumer driven by the [`SurfaceMaterial`] of the struck object.
///
/// Grazing hits above the material's ricochet angle ricochet, objects no
/// thicker than the material allows are penetrated, everything else stops
/// the projectile. Objects without a material use `fallback`.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct MaterialImpactPolicy {
    pub fallback: SurfaceMaterial,
}

impl MaterialImpactPolicy {
    pub fn decide(&self, impact: &ProjectileImpact) -> ImpactResponse {
        let material = impact.hit.physical_material.unwrap_or(self.fallback);
        decide_response(&material, impact.thickness, impact.angle)
    }
}

impl ImpactConsumer for MaterialImpactPolicy {
    fn on_impact(&mut self, projectile: &mut Projectile, impact: &ProjectileImpact) {
        self.decide(impact).apply(projectile, impact);
    }
}

/// Answers every impact with the [`MaterialImpactPolicy`] resource.
pub fn resolve_impacts_by_material(
    policy: Res<MaterialImpactPolicy>,
    mut impacts: MessageReader<ProjectileImpactEvent>,
    mut responses: MessageWriter<ImpactResponseEvent>,
) {
    for event in impacts.read() {
        responses.write(ImpactResponseEvent {
            projectile: event.projectile,
            response: policy.decide(&event.impact),
            impact: event.impact,
        });
    }
}

/// Picks a response for a hit on `material`.
///
/// # Arguments
/// * `material` - Surface that was hit
/// * `thickness` - Measured thickness along the path (cm)
/// * `angle` - Impact angle (degrees, 0 is head-on)
pub fn decide_response(material: &SurfaceMaterial, thickness: f32, angle: f32) -> ImpactResponse {
    if angle > material.ricochet_angle && material.ricochet_velocity_multiplier > 0.0 {
        ImpactResponse::Ricochet {
            velocity_multiplier: material.ricochet_velocity_multiplier,
        }
    } else if thickness <= material.max_penetration_thickness
        && material.penetration_velocity_multiplier > 0.0
    {
        ImpactResponse::Penetrate {
            velocity_multiplier: material.penetration_velocity_multiplier,
        }
    } else {
        ImpactResponse::Stop
    }
}

/// Material presets for common surfaces. Thicknesses are in centimeters.
pub mod materials {
    use super::*;

    /// Dense, hard to penetrate, ricochets at shallow angles.
    pub fn concrete() -> SurfaceMaterial {
        SurfaceMaterial {
            max_penetration_thickness: 2.0,
            penetration_velocity_multiplier: 0.4,
            ricochet_angle: 70.0,
            ricochet_velocity_multiplier: 0.6,
        }
    }

    /// Sheet steel: thin sections only, ricochets easily.
    pub fn metal() -> SurfaceMaterial {
        SurfaceMaterial {
            max_penetration_thickness: 0.5,
            penetration_velocity_multiplier: 0.3,
            ricochet_angle: 60.0,
            ricochet_velocity_multiplier: 0.7,
        }
    }

    pub fn wood() -> SurfaceMaterial {
        SurfaceMaterial {
            max_penetration_thickness: 15.0,
            penetration_velocity_multiplier: 0.7,
            ricochet_angle: 80.0,
            ricochet_velocity_multiplier: 0.3,
        }
    }

    pub fn glass() -> SurfaceMaterial {
        SurfaceMaterial {
            max_penetration_thickness: 3.0,
            penetration_velocity_multiplier: 0.9,
            ricochet_angle: 85.0,
            ricochet_velocity_multiplier: 0.2,
        }
    }

    /// Never ricochets.
    pub fn flesh() -> SurfaceMaterial {
        SurfaceMaterial {
            max_penetration_thickness: 60.0,
            penetration_velocity_multiplier: 0.6,
            ricochet_angle: 90.0,
            ricochet_velocity_multiplier: 0.0,
        }
    }

    pub fn dirt() -> SurfaceMaterial {
        SurfaceMaterial {
            max_penetration_thickness: 10.0,
            penetration_velocity_multiplier: 0.3,
            ricochet_angle: 80.0,
            ricochet_velocity_multiplier: 0.2,
        }
    }
}
