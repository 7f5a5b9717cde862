//! Flight step - one frame of drag, wind, movement and swept hit detection.

use bevy::prelude::*;

use crate::components::Projectile;
use crate::resources::BallisticsConfig;
use crate::systems::kinematics::{apply_drag, apply_wind, integrate};
use crate::systems::surface::{calculate_hit_thickness, impact_angle, ImpactConsumer};
use crate::types::{BodyKind, HitInfo, RayCaster, TraceSink};

/// Radius (cm) of the debug sphere drawn at impacts.
pub const IMPACT_SPHERE_RADIUS: f32 = 4.0;

/// A hit found by the swept trace, with the penetration analysis attached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileImpact {
    pub hit: HitInfo,
    /// Thickness of the struck object along the travel direction (cm)
    pub thickness: f32,
    /// Impact angle (degrees, 0 is head-on)
    pub angle: f32,
    /// Exit point on the far side of the struck object
    pub penetrated_location: Vec3,
}

/// Advances `projectile` by `dt` and reports what it struck, if anything.
///
/// Drag and wind feed the integrator, then the segment travelled this frame
/// is traced on the projectile's channel. Skeletal bodies that are hit are
/// ignored from then on so a projectile never registers the same character
/// twice. The impact is only reported; deciding what happens next is left to
/// the caller. `previous_position` always ends the call equal to `position`.
///
/// # Arguments
/// * `projectile` - Projectile to advance
/// * `dt` - Frame delta time (seconds)
/// * `config` - World ballistics settings
/// * `caster` - World ray-cast service
/// * `sink` - Receiver of debug segments and spheres
pub fn advance_projectile<R, S>(
    projectile: &mut Projectile,
    dt: f32,
    config: &BallisticsConfig,
    caster: &R,
    sink: &mut S,
) -> Option<ProjectileImpact>
where
    R: RayCaster + ?Sized,
    S: TraceSink + ?Sized,
{
    if projectile.is_destroyed() || !dt.is_finite() || dt < 0.0 {
        return None;
    }
    projectile.age += dt;

    apply_drag(projectile, dt);
    apply_wind(projectile);
    integrate(
        projectile,
        dt,
        config.gravity,
        config.rotation_follows_velocity,
    );

    let start = projectile.previous_position;
    let end = projectile.position;
    let mut impact = None;

    if start.distance(end) > config.min_trace_length {
        let channel = projectile.collision_channel();
        let hit = caster.line_trace(start, end, channel, projectile.ignored());

        if let Some(hit) = hit {
            if hit.body == BodyKind::Skeletal {
                if let Some(actor) = hit.actor {
                    projectile.ignore_actor(actor);
                }
            }

            let (thickness, penetrated_location) = calculate_hit_thickness(
                caster,
                &hit,
                projectile.forward,
                channel,
                projectile.actor(),
                config.thickness_trace_distance,
            );
            impact = Some(ProjectileImpact {
                hit,
                thickness,
                angle: impact_angle(projectile.forward, hit.impact_normal),
                penetrated_location,
            });
        }

        if projectile.draws_path() || config.debug_draw {
            let path_end = impact.map_or(end, |impact| impact.hit.location);
            sink.on_debug_segment(start, path_end, path_color(projectile));
        }
        if let Some(impact) = &impact {
            if projectile.draws_impact_sphere() || config.debug_draw {
                sink.on_debug_sphere(
                    impact.hit.location,
                    IMPACT_SPHERE_RADIUS,
                    Color::srgb(1.0, 0.0, 0.0),
                );
            }
        }
    }

    projectile.previous_position = projectile.position;
    impact
}

/// Path color: fades from white-ish to blue as the projectile slows.
fn path_color(projectile: &Projectile) -> Color {
    let base = projectile.base_speed();
    let remaining = if base > 0.0 {
        (projectile.velocity.length() / base).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Color::srgb_u8(
        (remaining * 255.0) as u8,
        (remaining * 127.5) as u8,
        255,
    )
}

impl Projectile {
    /// Runs one frame and hands any impact to `consumer`.
    ///
    /// # Example
    /// ```
    /// use bevy::prelude::*;
    /// use bevy_hybrid_ballistics::prelude::*;
    ///
    /// let mut scene = BoxScene::default();
    /// scene.add_box(Vec3::new(500.0, -50.0, -50.0), Vec3::new(505.0, 50.0, 50.0));
    ///
    /// let mut projectile = Projectile::new(&ProjectileSpec::default(), Vec3::ZERO, Vec3::X);
    /// projectile.on_spawn(None);
    /// projectile.activate(1.0);
    ///
    /// let config = BallisticsConfig::default();
    /// let mut policy = MaterialImpactPolicy::default();
    /// let impact = projectile.tick(1.0 / 60.0, &config, &scene, &mut (), &mut policy);
    /// assert!(impact.is_some());
    /// assert!(projectile.is_destroyed());
    /// ```
    pub fn tick<R, S, C>(
        &mut self,
        dt: f32,
        config: &BallisticsConfig,
        caster: &R,
        sink: &mut S,
        consumer: &mut C,
    ) -> Option<ProjectileImpact>
    where
        R: RayCaster + ?Sized,
        S: TraceSink + ?Sized,
        C: ImpactConsumer + ?Sized,
    {
        let impact = advance_projectile(self, dt, config, caster, sink)?;
        consumer.on_impact(self, &impact);
        Some(impact)
    }
}
