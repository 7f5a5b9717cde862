use bevy::prelude::*;
use bevy_hybrid_ballistics::prelude::*;

const FRAME: f32 = 1.0 / 60.0;

fn calm_config() -> BallisticsConfig {
    BallisticsConfig {
        gravity: Vec3::ZERO,
        ..Default::default()
    }
}

fn rifle() -> ProjectileSpec {
    ProjectileSpec::default()
        .with_velocity_fps(3200.0)
        .with_weight_grains(55)
        .with_wind(false)
}

fn ignore_impacts(_: &mut Projectile, _: &ProjectileImpact) {}

#[test]
fn test_open_space_flight_ends_at_lifetime() {
    let mut sim = BallisticsSimulation::new(BoxScene::default(), calm_config());
    let id = sim.spawn(&rifle(), Vec3::ZERO, Vec3::X, None).unwrap();
    sim.activate(id, 1.0);

    let mut frames = 0;
    let mut impacts = 0;
    let reason = loop {
        frames += 1;
        let report = sim.step(FRAME, &mut ignore_impacts);
        impacts += report.impacts.len();
        if let Some((_, reason)) = report.destroyed.first() {
            break *reason;
        }
        assert!(frames < 1000, "projectile outlived its lifetime");
    };

    assert_eq!(reason, DestroyReason::Lifetime);
    assert_eq!(impacts, 0);
    assert_eq!(frames, 600);
    assert!((sim.elapsed() - 10.0).abs() < 1e-3);
    assert!(sim.is_empty());
}

#[test]
fn test_perpendicular_wall_penetration() {
    let mut scene = BoxScene::default();
    scene.add_box(Vec3::new(1000.0, -100.0, -100.0), Vec3::new(1005.0, 100.0, 100.0));
    let mut sim = BallisticsSimulation::new(scene, calm_config());
    let id = sim.spawn(&rifle(), Vec3::ZERO, Vec3::X, None).unwrap();
    sim.activate(id, 1.0);
    let speed = sim.projectile(id).unwrap().velocity.length();

    let mut seen = Vec::new();
    let mut consumer = |projectile: &mut Projectile, impact: &ProjectileImpact| {
        seen.push(*impact);
        projectile.set_at_penetrated_location(impact.penetrated_location, 0.5);
    };
    let report = sim.step(FRAME, &mut consumer);

    assert_eq!(report.impacts.len(), 1);
    assert_eq!(seen.len(), 1);
    let impact = seen[0];
    assert!((impact.thickness - 5.0).abs() < 1e-2);
    // head-on hits measure 0 degrees from the perpendicular
    assert!(impact.angle.abs() < 1e-2);

    let projectile = sim.projectile(id).unwrap();
    assert!((projectile.velocity.length() - speed * 0.5).abs() < 1.0);
    assert!(projectile.position.abs_diff_eq(Vec3::new(1006.0, 0.0, 0.0), 1e-2));
    assert_eq!(projectile.previous_position, projectile.position);
}

#[test]
fn test_ricochet_budget_between_two_walls() {
    let mut scene = BoxScene::default();
    scene.add_box(Vec3::new(1000.0, -100.0, -100.0), Vec3::new(1010.0, 100.0, 100.0));
    scene.add_box(Vec3::new(-1010.0, -100.0, -100.0), Vec3::new(-1000.0, 100.0, 100.0));
    let mut sim = BallisticsSimulation::new(scene, calm_config());
    let id = sim
        .spawn(&rifle().with_max_ricochets(4), Vec3::ZERO, Vec3::X, None)
        .unwrap();
    sim.activate(id, 1.0);

    let mut counts = Vec::new();
    let mut directions = Vec::new();
    let mut consumer = |projectile: &mut Projectile, impact: &ProjectileImpact| {
        projectile.perform_ricochet(&impact.hit, 1.0);
        counts.push(projectile.ricochet_count());
        directions.push(projectile.forward);
    };

    let mut destroyed = None;
    for _ in 0..30 {
        let report = sim.step(FRAME, &mut consumer);
        if let Some((_, reason)) = report.destroyed.first() {
            destroyed = Some(*reason);
            break;
        }
    }

    assert_eq!(destroyed, Some(DestroyReason::RicochetsExhausted));
    assert_eq!(counts, vec![1, 2, 3, 4, 4]);
    for pair in directions[..4].windows(2) {
        assert!(pair[0].abs_diff_eq(-pair[1], 1e-4));
    }
    // the exhausted impact leaves the direction alone
    assert_eq!(directions[4], directions[3]);
}

#[test]
fn test_speed_without_drag_curve_is_constant() {
    let mut sim = BallisticsSimulation::new(BoxScene::default(), calm_config());
    let plain = sim.spawn(&rifle(), Vec3::ZERO, Vec3::X, None).unwrap();
    let dragged = sim
        .spawn(
            &rifle().with_drag_curve(DragCurve::new([(0.0, 0.3), (1.0, 0.5)])),
            Vec3::new(0.0, 500.0, 0.0),
            Vec3::X,
            None,
        )
        .unwrap();
    sim.activate(plain, 1.0);
    sim.activate(dragged, 1.0);
    let launch = sim.projectile(plain).unwrap().velocity.length();

    let mut last = launch;
    for _ in 0..120 {
        sim.step(FRAME, &mut ignore_impacts);
        assert_eq!(sim.projectile(plain).unwrap().velocity.length(), launch);
        let speed = sim.projectile(dragged).unwrap().velocity.length();
        assert!(speed < last);
        last = speed;
    }
}

#[test]
fn test_wind_reaches_projectiles_spawned_after_resolution() {
    let mut sim = BallisticsSimulation::new(BoxScene::default(), calm_config());
    sim.add_wind_source(WindDirectionalSource::new(Vec3::Z, 42.0));

    let early = sim
        .spawn(&ProjectileSpec::default(), Vec3::ZERO, Vec3::X, None)
        .unwrap();
    sim.activate(early, 1.0);
    for _ in 0..121 {
        sim.step(FRAME, &mut ignore_impacts);
    }
    assert!(sim.is_wind_resolved());
    assert_eq!(sim.wind_source().map(|source| source.speed), Some(42.0));

    let late = sim
        .spawn(&ProjectileSpec::default(), Vec3::ZERO, Vec3::X, None)
        .unwrap();
    sim.activate(late, 1.0);
    for _ in 0..60 {
        sim.step(FRAME, &mut ignore_impacts);
    }

    // 42 / 4.2 cm/s² for one second
    let late = sim.projectile(late).unwrap();
    assert!((late.velocity.z - 10.0).abs() < 1e-2);
    assert_eq!(sim.projectile(early).unwrap().velocity.z, 0.0);
}

#[test]
fn test_material_policy_through_plank_into_concrete() {
    let mut scene = BoxScene::default();
    scene.insert(
        SceneBox::new(Vec3::new(800.0, -100.0, -100.0), Vec3::new(803.0, 100.0, 100.0))
            .with_material(materials::wood()),
    );
    scene.insert(
        SceneBox::new(Vec3::new(3000.0, -100.0, -100.0), Vec3::new(3100.0, 100.0, 100.0))
            .with_material(materials::concrete()),
    );
    let mut sim = BallisticsSimulation::new(scene, calm_config());
    let id = sim.spawn(&rifle(), Vec3::ZERO, Vec3::X, None).unwrap();
    sim.activate(id, 1.0);

    let mut policy = MaterialImpactPolicy::default();
    let first = sim.step(FRAME, &mut policy);
    assert_eq!(first.impacts.len(), 1);
    assert!(first.destroyed.is_empty());
    assert!(sim.projectile(id).unwrap().position.x > 803.0);

    let mut reason = None;
    for _ in 0..10 {
        let report = sim.step(FRAME, &mut policy);
        if let Some((_, destroyed)) = report.destroyed.first() {
            reason = Some(*destroyed);
            break;
        }
    }
    assert_eq!(reason, Some(DestroyReason::Stopped));
}
