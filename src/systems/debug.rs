use bevy::prelude::*;

use crate::components::Projectile;
use crate::resources::{BallisticsConfig, DebugShape, DebugTraceBuffer};

/// Draw the flight paths and impact spheres queued by the simulation.
pub fn draw_trace_buffer(mut gizmos: Gizmos, mut buffer: ResMut<DebugTraceBuffer>) {
    for shape in buffer.drain() {
        match shape {
            DebugShape::Segment { start, end, color } => gizmos.line(start, end, color),
            DebugShape::Sphere {
                center,
                radius,
                color,
            } => {
                gizmos.sphere(center, radius, color);
            }
        }
    }
}

/// Draw debug gizmos for projectiles.
///
/// Draws velocity vectors and positions for flying projectiles.
pub fn draw_projectile_debug(
    mut gizmos: Gizmos,
    query: Query<&Projectile>,
    config: Res<BallisticsConfig>,
) {
    if !config.debug_draw {
        return;
    }

    for projectile in query.iter().filter(|p| p.is_movement_active()) {
        gizmos.sphere(projectile.position, 2.0, Color::srgb(1.0, 0.0, 0.0));

        // 10 ms of travel
        let end = projectile.position + projectile.velocity * 0.01;
        gizmos.line(projectile.position, end, Color::srgb(0.0, 1.0, 0.0));
    }
}
