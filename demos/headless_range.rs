use bevy::app::ScheduleRunnerPlugin;
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use bevy_hybrid_ballistics::prelude::*;
use std::time::Duration;

fn main() {
    println!("Starting headless firing range...");
    println!("Runs for 12 simulated seconds, long enough for every round to expire.");

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))))
        .add_plugins(BallisticsCorePlugin)
        .add_plugins(BallisticsSurfacePlugin)
        // Skip the debug plugin (headless)
        .insert_resource(build_range())
        .add_systems(Startup, setup_range)
        .add_systems(Update, stop_after_timeout)
        .add_systems(FixedUpdate, (fire_volleys, report_impacts, report_destroyed))
        .run();
}

/// Plank, steel plate and a concrete backstop along +X; a dirt floor.
fn build_range() -> BoxScene {
    let mut scene = BoxScene::default();
    scene.insert(
        SceneBox::new(Vec3::new(2000.0, 0.0, -200.0), Vec3::new(2004.0, 300.0, 200.0))
            .with_material(materials::wood()),
    );
    scene.insert(
        SceneBox::new(Vec3::new(4000.0, 0.0, -200.0), Vec3::new(4001.0, 300.0, 200.0))
            .with_material(materials::metal()),
    );
    scene.insert(
        SceneBox::new(Vec3::new(8000.0, 0.0, -1000.0), Vec3::new(8100.0, 1000.0, 1000.0))
            .with_material(materials::concrete()),
    );
    scene.insert(
        SceneBox::new(Vec3::new(-1000.0, -50.0, -1000.0), Vec3::new(9000.0, 0.0, 1000.0))
            .with_material(materials::dirt()),
    );
    scene
}

fn setup_range(mut commands: Commands) {
    println!("\n[SETUP] Crosswind 6 m/s from the left");
    commands.spawn((WindDirectionalSource::new(Vec3::Z, 600.0), Name::new("Crosswind")));
    commands.insert_resource(Time::<Fixed>::from_hz(60.0));
}

/// Fires one round straight, one grazing the floor and one high, every second.
fn fire_volleys(
    time: Res<Time<Fixed>>,
    mut next_volley: Local<f32>,
    mut fire_events: MessageWriter<FireProjectileEvent>,
) {
    if time.elapsed_secs() < *next_volley || *next_volley > 4.0 {
        return;
    }
    *next_volley += 1.0;

    let muzzle = Vec3::new(0.0, 150.0, 0.0);
    let spec = ProjectileSpec::default()
        .with_drag_curve(DragCurve::new([(0.0, 0.25), (1.0, 0.3), (3.0, 0.5)]));
    for direction in [
        Vec3::X,
        Vec3::new(1.0, -0.08, 0.0),
        Vec3::new(1.0, 0.02, 0.0),
    ] {
        fire_events.write(FireProjectileEvent::new(muzzle, direction, spec.clone()));
    }
    println!("[FIRE] Volley at {:.1}s", time.elapsed_secs());
}

fn report_impacts(mut impacts: MessageReader<ProjectileImpactEvent>) {
    for event in impacts.read() {
        let impact = &event.impact;
        println!(
            "[IMPACT] {:?} at {:.0?}: thickness {:.1} cm, angle {:.1} deg, force {:.2}",
            event.projectile, impact.hit.location, impact.thickness, impact.angle, event.impact_force
        );
    }
}

fn report_destroyed(mut destroyed: MessageReader<ProjectileDestroyedEvent>) {
    for event in destroyed.read() {
        println!(
            "[DESTROYED] {:?} ({:?}) at {:.0?}",
            event.projectile, event.reason, event.position
        );
    }
}

fn stop_after_timeout(time: Res<Time>, mut exit: MessageWriter<AppExit>) {
    if time.elapsed_secs() > 12.0 {
        println!("[FINISHED] Range closed.");
        exit.write(AppExit::Success);
    }
}
