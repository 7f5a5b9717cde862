//! # Bevy Hybrid Ballistics
//!
//! Trace-based projectile ballistics for Bevy 0.18.
//!
//! ## Features
//! - Swept line traces between frames, so fast rounds never tunnel
//! - Curve-driven drag and a per-world ambient wind source
//! - Penetration thickness estimated with a double ray cast
//! - Ricochets by reflection about the struck surface
//! - Impact decisions left to the game, with a material-driven default
//! - Headless [`BallisticsSimulation`](simulation::BallisticsSimulation) for servers and tools
//!
//! Units are centimeters and seconds, Y-up.
//!
//! ## Quick Start
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_hybrid_ballistics::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(BallisticsPluginGroup)
//!         .run();
//! }
//! ```

pub mod components;
pub mod error;
pub mod events;
pub mod resources;
pub mod scene;
pub mod schedule;
pub mod simulation;
pub mod systems;
pub mod types;
pub mod wind;

pub mod prelude {
    pub use crate::components::*;
    pub use crate::error::ProjectileSpecError;
    pub use crate::events::*;
    pub use crate::resources::*;
    pub use crate::scene::{BoxScene, SceneBox};
    pub use crate::simulation::{BallisticsSimulation, ProjectileId, StepReport};
    pub use crate::systems::flight::ProjectileImpact;
    pub use crate::systems::surface::{
        materials, ImpactConsumer, ImpactResponse, MaterialImpactPolicy,
    };
    pub use crate::types::*;
    pub use crate::wind::{WindProvider, WindSample};
    pub use crate::BallisticsPluginGroup;
    pub use crate::{BallisticsCorePlugin, BallisticsDebugPlugin, BallisticsSet, BallisticsSurfacePlugin};
}

use bevy::prelude::*;

/// Ordering of the ballistics work inside `FixedUpdate`.
///
/// Game systems that answer [`ProjectileImpactEvent`](events::ProjectileImpactEvent)
/// with [`ImpactResponseEvent`](events::ImpactResponseEvent) belong in
/// [`BallisticsSet::Decide`].
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BallisticsSet {
    /// Timers, firing, spawn setup and activation
    Prepare,
    /// Movement and swept traces
    Flight,
    /// Impact responses are chosen
    Decide,
    /// Responses are applied and destroyed projectiles despawned
    Apply,
}

/// Main plugin group that includes all ballistics subsystems.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hybrid_ballistics::prelude::*;
///
/// let mut app = App::new();
/// app.add_plugins(BallisticsPluginGroup.build().disable::<BallisticsDebugPlugin>());
/// ```
#[derive(Default)]
pub struct BallisticsPluginGroup;

impl PluginGroup for BallisticsPluginGroup {
    fn build(self) -> bevy::app::PluginGroupBuilder {
        bevy::app::PluginGroupBuilder::start::<Self>()
            .add(BallisticsCorePlugin)
            .add(BallisticsSurfacePlugin)
            .add(BallisticsDebugPlugin)
    }
}

/// Projectile simulation plugin.
///
/// Traces go through avian3d's spatial queries when its pipeline is
/// present (feature `dim3`). Inserting a [`BoxScene`](scene::BoxScene)
/// resource serves them headlessly instead.
///
/// # Systems
/// - `tick_ballistics_timers` - Lifetimes and the delayed wind lookup
/// - `fire_projectiles` - Spawns projectiles for fire requests
/// - `setup_spawned_projectiles` - Units, wind snapshot, lifetime timer
/// - `update_projectiles` - Drag, wind, movement, swept traces
/// - `apply_impact_responses` - Penetration, ricochet or stop
/// - `despawn_destroyed_projectiles` - Cleanup
pub struct BallisticsCorePlugin;

impl Plugin for BallisticsCorePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<components::Projectile>()
            .register_type::<components::WindDirectionalSource>()
            .register_type::<components::SkeletalBody>()
            .register_type::<resources::BallisticsConfig>()
            .init_resource::<resources::BallisticsConfig>()
            .init_resource::<resources::BallisticsTimers>()
            .init_resource::<resources::WorldWindSource>()
            .add_message::<events::FireProjectileEvent>()
            .add_message::<events::ActivateProjectileEvent>()
            .add_message::<events::ProjectileImpactEvent>()
            .add_message::<events::ImpactResponseEvent>()
            .add_message::<events::ProjectileDestroyedEvent>();

        let max_debug_shapes = app
            .world()
            .resource::<resources::BallisticsConfig>()
            .max_debug_shapes;
        app.insert_resource(resources::DebugTraceBuffer::new(max_debug_shapes));

        app.configure_sets(
            FixedUpdate,
            (
                BallisticsSet::Prepare,
                BallisticsSet::Flight,
                BallisticsSet::Decide,
                BallisticsSet::Apply,
            )
                .chain(),
        )
        .add_systems(Startup, systems::logic::initialize_wind_lookup)
        .add_systems(
            FixedUpdate,
            (
                systems::logic::tick_ballistics_timers,
                systems::logic::fire_projectiles,
                systems::logic::setup_spawned_projectiles,
                systems::logic::apply_activation_requests,
            )
                .chain()
                .in_set(BallisticsSet::Prepare),
        )
        .add_systems(
            FixedUpdate,
            systems::collision::update_projectiles_in_scene
                .run_if(resource_exists::<scene::BoxScene>)
                .in_set(BallisticsSet::Flight),
        )
        .add_systems(
            FixedUpdate,
            (
                systems::logic::apply_impact_responses,
                systems::logic::despawn_destroyed_projectiles,
            )
                .chain()
                .in_set(BallisticsSet::Apply),
        );

        #[cfg(feature = "dim3")]
        {
            use avian3d::prelude::SpatialQueryPipeline;
            app.add_systems(
                FixedUpdate,
                systems::collision::update_projectiles
                    .run_if(
                        resource_exists::<SpatialQueryPipeline>
                            .and(not(resource_exists::<scene::BoxScene>)),
                    )
                    .in_set(BallisticsSet::Flight),
            );
        }
    }
}

/// Material-driven impact decisions.
///
/// Answers every impact from the [`SurfaceMaterial`](components::SurfaceMaterial)
/// of the struck object, using the
/// [`MaterialImpactPolicy`](systems::surface::MaterialImpactPolicy) resource
/// for objects without one. Leave it out to decide impacts yourself.
pub struct BallisticsSurfacePlugin;

impl Plugin for BallisticsSurfacePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<components::SurfaceMaterial>()
            .init_resource::<systems::surface::MaterialImpactPolicy>()
            .add_systems(
                FixedUpdate,
                systems::surface::resolve_impacts_by_material.in_set(BallisticsSet::Decide),
            );
    }
}

/// Debug plugin for ballistics visualization.
pub struct BallisticsDebugPlugin;

impl Plugin for BallisticsDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                systems::debug::draw_trace_buffer,
                systems::debug::draw_projectile_debug,
            ),
        );
    }
}
