//! Kinematics - curve-driven drag, wind force and the movement step.

use bevy::prelude::*;

use crate::components::Projectile;

/// Sea level air density (kg/m³).
pub const AIR_DENSITY: f32 = 1.225;
/// Drag constant of the ballistic coefficient convention the curves are authored in.
pub const DRAG_CONSTANT: f32 = 0.0000571;
/// Reference mass the drag term is normalized by.
pub const DRAG_REFERENCE_MASS: f32 = 3.56394;

/// Multiplicative velocity decay for this update.
///
/// `drag = -0.5 * curve(age) * rho * k * (speed / 100)²`, normalized by the
/// reference mass, scaled by `dt` and the current speed, and returned as
/// `1 - drag`. Without a drag curve, or at rest, the factor is exactly `1.0`.
///
/// # Arguments
/// * `projectile` - Projectile whose velocity and age are sampled
/// * `dt` - Frame delta time (seconds)
pub fn calculate_drag(projectile: &Projectile, dt: f32) -> f32 {
    let Some(curve) = projectile.drag_curve.as_ref() else {
        return 1.0;
    };
    let speed = projectile.velocity.length();
    if speed <= f32::EPSILON {
        return 1.0;
    }

    let curve_value = curve.evaluate(projectile.age);
    let meters_per_second = speed * 0.01;
    let mut drag =
        -0.5 * curve_value * AIR_DENSITY * DRAG_CONSTANT * meters_per_second * meters_per_second;
    drag /= DRAG_REFERENCE_MASS;
    drag = drag * dt * -100.0 / speed;
    1.0 - drag
}

/// Applies the drag factor to the projectile's velocity.
pub fn apply_drag(projectile: &mut Projectile, dt: f32) {
    let factor = calculate_drag(projectile, dt);
    projectile.velocity *= factor;
}

/// Queues the spawn-time wind as a force for this update, if the projectile
/// is affected by wind.
pub fn apply_wind(projectile: &mut Projectile) {
    if projectile.affected_by_wind() {
        let force = projectile.wind().force();
        projectile.add_force(force);
    }
}

/// Advances position and velocity by one step.
///
/// Acceleration is gravity plus the forces queued this update. The new
/// velocity is clamped to the projectile's max speed and the position moves
/// by the average of old and new velocity. Inactive projectiles do not move
/// and their queued forces are dropped.
///
/// # Arguments
/// * `projectile` - Projectile to move
/// * `dt` - Frame delta time (seconds)
/// * `gravity` - World gravity (cm/s²)
/// * `rotation_follows_velocity` - Re-align `forward` with the new velocity
pub fn integrate(
    projectile: &mut Projectile,
    dt: f32,
    gravity: Vec3,
    rotation_follows_velocity: bool,
) {
    let force = projectile.take_pending_force();
    if !projectile.is_movement_active() {
        return;
    }

    let old_velocity = projectile.velocity;
    let mut new_velocity = old_velocity + (gravity + force) * dt;
    let max_speed = projectile.max_speed();
    if max_speed > 0.0 {
        new_velocity = new_velocity.clamp_length_max(max_speed);
    }

    projectile.position += (old_velocity + new_velocity) * 0.5 * dt;
    projectile.velocity = new_velocity;

    if rotation_follows_velocity {
        if let Some(direction) = new_velocity.try_normalize() {
            projectile.forward = direction;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{DragCurve, ProjectileSpec};
    use crate::wind::WindSample;

    fn flying(spec: &ProjectileSpec) -> Projectile {
        let mut projectile = Projectile::new(spec, Vec3::ZERO, Vec3::X);
        projectile.on_spawn(None);
        projectile.activate(1.0);
        projectile
    }

    #[test]
    fn test_no_curve_means_no_drag() {
        let mut projectile = flying(&ProjectileSpec::default());
        let before = projectile.velocity.length();
        assert_eq!(calculate_drag(&projectile, 1.0 / 60.0), 1.0);
        apply_drag(&mut projectile, 1.0 / 60.0);
        assert_eq!(projectile.velocity.length(), before);
    }

    #[test]
    fn test_drag_matches_closed_form() {
        let mut projectile =
            flying(&ProjectileSpec::default().with_drag_curve(DragCurve::constant(0.5)));
        projectile.velocity = Vec3::X * 10000.0;
        let dt = 0.02;

        // 100 m/s: 0.5 * 0.5 * 1.225 * 0.0000571 * 100² / 3.56394 * dt * 100 / 10000
        let expected_drag =
            0.5 * 0.5 * 1.225 * 0.0000571 * 10000.0 / 3.56394 * dt * 100.0 / 10000.0;
        let factor = calculate_drag(&projectile, dt);
        assert!((factor - (1.0 - expected_drag)).abs() < 1e-6);
        assert!(factor < 1.0);
    }

    #[test]
    fn test_stationary_projectile_has_unit_drag() {
        let mut projectile = Projectile::new(
            &ProjectileSpec::default().with_drag_curve(DragCurve::constant(1.0)),
            Vec3::ZERO,
            Vec3::X,
        );
        projectile.on_spawn(None);
        assert_eq!(calculate_drag(&projectile, 0.1), 1.0);
    }

    #[test]
    fn test_wind_force_applies_as_acceleration() {
        let mut projectile = Projectile::new(&ProjectileSpec::default(), Vec3::ZERO, Vec3::X);
        let wind = WindSample {
            direction: Vec3::Z,
            speed: 42.0,
        };
        projectile.on_spawn(Some(&wind));
        projectile.activate(1.0);
        apply_wind(&mut projectile);
        integrate(&mut projectile, 0.5, Vec3::ZERO, true);
        assert!((projectile.velocity.z - 5.0).abs() < 1e-3);

        // the force is consumed by the step
        integrate(&mut projectile, 0.5, Vec3::ZERO, true);
        assert!((projectile.velocity.z - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_wind_ignored_when_not_affected() {
        let mut projectile = Projectile::new(
            &ProjectileSpec::default().with_wind(false),
            Vec3::ZERO,
            Vec3::X,
        );
        let wind = WindSample {
            direction: Vec3::Z,
            speed: 42.0,
        };
        projectile.on_spawn(Some(&wind));
        projectile.activate(1.0);
        apply_wind(&mut projectile);
        integrate(&mut projectile, 0.5, Vec3::ZERO, true);
        assert_eq!(projectile.velocity.z, 0.0);
    }

    #[test]
    fn test_inactive_projectile_does_not_move() {
        let mut projectile = Projectile::new(&ProjectileSpec::default(), Vec3::ONE, Vec3::X);
        projectile.on_spawn(None);
        projectile.add_force(Vec3::X * 100.0);
        integrate(&mut projectile, 1.0, Vec3::new(0.0, -980.0, 0.0), true);
        assert_eq!(projectile.position, Vec3::ONE);

        projectile.activate(1.0);
        let speed = projectile.velocity.length();
        integrate(&mut projectile, 0.0, Vec3::ZERO, true);
        assert_eq!(projectile.velocity.length(), speed);
    }

    #[test]
    fn test_gravity_bends_forward() {
        let mut projectile = flying(&ProjectileSpec::default());
        integrate(&mut projectile, 0.1, Vec3::new(0.0, -980.0, 0.0), true);
        assert!(projectile.forward.y < 0.0);
        assert!(projectile.position.x > 0.0);

        let mut fixed = flying(&ProjectileSpec::default());
        integrate(&mut fixed, 0.1, Vec3::new(0.0, -980.0, 0.0), false);
        assert_eq!(fixed.forward, Vec3::X);
    }
}
