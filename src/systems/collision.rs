//! Collision system - swept traces for every projectile, served by the
//! physics backend or by a headless [`BoxScene`].

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

#[cfg(feature = "dim3")]
use avian3d::prelude::*;
#[cfg(feature = "dim3")]
use bevy::ecs::system::SystemParam;

use crate::components::Projectile;
#[cfg(feature = "dim3")]
use crate::components::{SkeletalBody, SurfaceMaterial};
use crate::events::ProjectileImpactEvent;
use crate::resources::{BallisticsConfig, DebugTraceBuffer};
use crate::scene::BoxScene;
use crate::systems::flight::advance_projectile;
use crate::types::RayCaster;
#[cfg(feature = "dim3")]
use crate::types::{ActorId, BodyKind, CollisionChannel, HitInfo, IgnoreSet};

/// Line traces through avian3d's spatial query pipeline.
///
/// Collision channels map onto collision layers, ignored actors are
/// filtered per collider, and struck entities report their
/// [`SurfaceMaterial`] and whether they carry a [`SkeletalBody`].
#[cfg(feature = "dim3")]
#[derive(SystemParam)]
pub struct SpatialRayCaster<'w, 's> {
    spatial_query: SpatialQuery<'w, 's>,
    skeletal: Query<'w, 's, (), With<SkeletalBody>>,
    materials: Query<'w, 's, &'static SurfaceMaterial>,
}

#[cfg(feature = "dim3")]
impl RayCaster for SpatialRayCaster<'_, '_> {
    fn line_trace(
        &self,
        start: Vec3,
        end: Vec3,
        channel: CollisionChannel,
        ignore: &IgnoreSet,
    ) -> Option<HitInfo> {
        let delta = end - start;
        let max_distance = delta.length();
        let direction = Dir3::new(delta).ok()?;
        let filter = SpatialQueryFilter::from_mask(channel.layer_bits());

        let hit = self.spatial_query.cast_ray_predicate(
            start,
            direction,
            max_distance,
            true, // solid
            &filter,
            &|entity| !ignore.contains(ActorId::from(entity)),
        )?;

        let location = start + *direction * hit.distance;
        let body = if self.skeletal.contains(hit.entity) {
            BodyKind::Skeletal
        } else {
            BodyKind::Static
        };
        Some(HitInfo {
            trace_start: start,
            location,
            impact_point: location,
            normal: hit.normal,
            impact_normal: hit.normal,
            distance: hit.distance,
            actor: Some(ActorId::from(hit.entity)),
            body,
            physical_material: self.materials.get(hit.entity).ok().copied(),
        })
    }
}

/// Flies every spawned projectile one fixed step against avian3d colliders.
#[cfg(feature = "dim3")]
pub fn update_projectiles(
    time: Res<Time<Fixed>>,
    config: Res<BallisticsConfig>,
    caster: SpatialRayCaster,
    mut debug: ResMut<DebugTraceBuffer>,
    mut projectiles: Query<(Entity, &mut Transform, &mut Projectile)>,
    mut impact_events: MessageWriter<ProjectileImpactEvent>,
) {
    fly_projectiles(
        time.delta_secs(),
        &config,
        &caster,
        &mut debug,
        &mut projectiles,
        &mut impact_events,
    );
}

/// Flies every spawned projectile one fixed step against a [`BoxScene`] resource.
pub fn update_projectiles_in_scene(
    time: Res<Time<Fixed>>,
    config: Res<BallisticsConfig>,
    scene: Res<BoxScene>,
    mut debug: ResMut<DebugTraceBuffer>,
    mut projectiles: Query<(Entity, &mut Transform, &mut Projectile)>,
    mut impact_events: MessageWriter<ProjectileImpactEvent>,
) {
    fly_projectiles(
        time.delta_secs(),
        &config,
        &*scene,
        &mut debug,
        &mut projectiles,
        &mut impact_events,
    );
}

/// Advances projectiles, syncs their `Transform` and publishes impacts.
fn fly_projectiles<R: RayCaster + ?Sized>(
    dt: f32,
    config: &BallisticsConfig,
    caster: &R,
    debug: &mut DebugTraceBuffer,
    projectiles: &mut Query<(Entity, &mut Transform, &mut Projectile)>,
    impact_events: &mut MessageWriter<ProjectileImpactEvent>,
) {
    for (entity, mut transform, mut projectile) in projectiles.iter_mut() {
        // spawn setup has not run yet
        if !projectile.is_spawned() {
            continue;
        }

        let impact = advance_projectile(&mut projectile, dt, config, caster, debug);
        transform.translation = projectile.position;
        if projectile.is_movement_active() {
            transform.look_to(projectile.forward, Vec3::Y);
        }

        if let Some(impact) = impact {
            impact_events.write(ProjectileImpactEvent {
                projectile: entity,
                impact,
                impact_force: projectile.calculate_impact_force(),
            });
        }
    }
}
