//! Projectile lifecycle systems - firing, spawn setup, world timers, wind
//! lookup, impact responses and cleanup.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::components::{Projectile, WindDirectionalSource};
use crate::events::{
    ActivateProjectileEvent, FireProjectileEvent, ImpactResponseEvent, ProjectileDestroyedEvent,
};
use crate::resources::{BallisticsConfig, BallisticsTask, BallisticsTimers, WorldWindSource};
use crate::types::DestroyReason;
use crate::wind::WindProvider;

/// Schedules the world's one-time wind source lookup.
pub fn initialize_wind_lookup(
    config: Res<BallisticsConfig>,
    mut timers: ResMut<BallisticsTimers>,
    mut wind: ResMut<WorldWindSource>,
) {
    wind.0.initialize(
        &mut timers.0,
        config.wind_resolution_delay,
        BallisticsTask::ResolveWindSource,
    );
}

/// Spawns a projectile entity for every fire request.
///
/// The launch is requested right away and takes effect once
/// [`setup_spawned_projectiles`] has placed the projectile in the world.
pub fn fire_projectiles(
    mut commands: Commands,
    mut fire_events: MessageReader<FireProjectileEvent>,
) {
    for fire in fire_events.read() {
        if let Err(error) = fire.spec.validate() {
            warn!("rejected projectile: {}", error);
            continue;
        }
        let Ok(direction) = Dir3::new(fire.direction) else {
            warn!("rejected projectile: invalid launch direction {:?}", fire.direction);
            continue;
        };

        let mut projectile = Projectile::new(&fire.spec, fire.origin, *direction);
        if let Some(shooter) = fire.shooter {
            projectile = projectile.with_owner(shooter.into());
        }
        projectile.activate(fire.velocity_multiplier);

        commands.spawn((
            Transform::from_translation(fire.origin).looking_to(direction, Vec3::Y),
            projectile,
        ));
    }
}

/// Runs spawn setup for projectiles that entered the world since the last
/// update: position from the `Transform`, identity, wind snapshot and
/// lifetime timer.
pub fn setup_spawned_projectiles(
    mut timers: ResMut<BallisticsTimers>,
    wind: Res<WorldWindSource>,
    wind_sources: Query<&WindDirectionalSource>,
    mut projectiles: Query<(Entity, &Transform, &mut Projectile)>,
) {
    let source = wind
        .0
        .wind_source()
        .and_then(|entity| wind_sources.get(*entity).ok());

    for (entity, transform, mut projectile) in projectiles.iter_mut() {
        if projectile.is_spawned() {
            continue;
        }
        projectile.position = transform.translation;
        projectile.set_actor(entity.into());
        projectile.on_spawn(source.map(|source| source as &dyn WindProvider));

        let lifetime = projectile.lifetime();
        projectile.lifetime_timer = Some(
            timers
                .0
                .schedule(lifetime, BallisticsTask::ExpireProjectile(entity)),
        );
        debug!(
            "projectile {:?} spawned at {:?}, wind {:?}",
            entity,
            projectile.position,
            projectile.wind()
        );
    }
}

/// Advances the world timers and runs whatever came due.
pub fn tick_ballistics_timers(
    time: Res<Time<Fixed>>,
    mut timers: ResMut<BallisticsTimers>,
    mut wind: ResMut<WorldWindSource>,
    wind_sources: Query<Entity, With<WindDirectionalSource>>,
    mut projectiles: Query<&mut Projectile>,
) {
    for task in timers.0.advance(time.delta_secs()) {
        match task {
            BallisticsTask::ResolveWindSource => {
                match wind.0.resolve(|| wind_sources.iter().next()) {
                    Some(entity) => info!("resolved wind source {:?}", entity),
                    None => warn!("no wind source in the world, projectiles fly in calm air"),
                }
            }
            BallisticsTask::ExpireProjectile(entity) => {
                if let Ok(mut projectile) = projectiles.get_mut(entity) {
                    projectile.lifetime_timer = None;
                    projectile.destroy(DestroyReason::Lifetime);
                }
            }
        }
    }
}

pub fn apply_activation_requests(
    mut requests: MessageReader<ActivateProjectileEvent>,
    mut projectiles: Query<&mut Projectile>,
) {
    for request in requests.read() {
        match projectiles.get_mut(request.projectile) {
            Ok(mut projectile) => projectile.activate(request.velocity_multiplier),
            Err(_) => debug!("activation for missing projectile {:?}", request.projectile),
        }
    }
}

/// Carries out the responses chosen for this update's impacts.
pub fn apply_impact_responses(
    mut responses: MessageReader<ImpactResponseEvent>,
    mut projectiles: Query<(&mut Projectile, &mut Transform)>,
) {
    for response in responses.read() {
        let Ok((mut projectile, mut transform)) = projectiles.get_mut(response.projectile) else {
            continue;
        };
        response.response.apply(&mut projectile, &response.impact);
        transform.translation = projectile.position;
    }
}

/// Despawns destroyed projectiles and cancels their lifetime timers.
pub fn despawn_destroyed_projectiles(
    mut commands: Commands,
    mut timers: ResMut<BallisticsTimers>,
    mut destroyed_events: MessageWriter<ProjectileDestroyedEvent>,
    projectiles: Query<(Entity, &Projectile)>,
) {
    for (entity, projectile) in projectiles.iter() {
        let Some(reason) = projectile.destroy_reason() else {
            continue;
        };
        if let Some(handle) = projectile.lifetime_timer {
            timers.0.cancel(handle);
        }
        debug!(
            "projectile {:?} destroyed ({:?}) after {:.3}s",
            entity, reason, projectile.age
        );
        destroyed_events.write(ProjectileDestroyedEvent {
            projectile: entity,
            reason,
            position: projectile.position,
        });
        commands.entity(entity).despawn();
    }
}
