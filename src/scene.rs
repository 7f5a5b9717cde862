//! Headless collision scene made of axis-aligned boxes.
//!
//! Serves line traces without a physics engine, for server-side simulation,
//! demos and tests.

use bevy::prelude::*;

use crate::components::SurfaceMaterial;
use crate::types::{ActorId, BodyKind, CollisionChannel, HitInfo, IgnoreSet, RayCaster};

/// An axis-aligned box in a [`BoxScene`].
#[derive(Clone, Debug, PartialEq)]
pub struct SceneBox {
    pub min: Vec3,
    pub max: Vec3,
    /// Layer bits of the channels this box blocks
    pub channels: u32,
    pub body: BodyKind,
    pub material: Option<SurfaceMaterial>,
}

impl SceneBox {
    /// A static box blocking every channel. Corners may be given in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
            channels: u32::MAX,
            body: BodyKind::Static,
            material: None,
        }
    }

    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.material = Some(material);
        self
    }

    pub fn skeletal(mut self) -> Self {
        self.body = BodyKind::Skeletal;
        self
    }

    /// Restricts the box to the given channels.
    pub fn blocking(mut self, channels: &[CollisionChannel]) -> Self {
        self.channels = channels.iter().fold(0, |bits, channel| bits | channel.layer_bits());
        self
    }

    /// Entry parameter along `start + delta * t`, `t` in `[0, 1]`, and the
    /// face normal. Rays starting inside the box do not hit it.
    fn intersect(&self, start: Vec3, delta: Vec3) -> Option<(f32, Vec3)> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vec3::ZERO;

        for axis in 0..3 {
            let origin = start[axis];
            let direction = delta[axis];
            let (min, max) = (self.min[axis], self.max[axis]);

            if direction.abs() <= f32::EPSILON {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let t_min_face = (min - origin) / direction;
            let t_max_face = (max - origin) / direction;
            let mut face_normal = Vec3::ZERO;
            let (near, far) = if direction > 0.0 {
                face_normal[axis] = -1.0;
                (t_min_face, t_max_face)
            } else {
                face_normal[axis] = 1.0;
                (t_max_face, t_min_face)
            };

            if near > t_enter {
                t_enter = near;
                normal = face_normal;
            }
            t_exit = t_exit.min(far);
        }

        if !t_enter.is_finite() || t_enter > t_exit || t_enter < 0.0 || t_enter > 1.0 {
            return None;
        }
        Some((t_enter, normal))
    }
}

/// A static world of boxes.
///
/// Insert it as a resource to serve the ECS plugins' traces without a
/// physics backend.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hybrid_ballistics::prelude::*;
///
/// let mut scene = BoxScene::default();
/// let wall = scene.add_box(Vec3::new(10.0, -1.0, -1.0), Vec3::new(12.0, 1.0, 1.0));
/// let hit = scene
///     .line_trace(Vec3::ZERO, Vec3::X * 20.0, CollisionChannel::Visibility, &IgnoreSet::default())
///     .unwrap();
/// assert_eq!(hit.actor, Some(wall));
/// assert_eq!(hit.location, Vec3::X * 10.0);
/// ```
#[derive(Resource, Clone, Debug, Default)]
pub struct BoxScene {
    boxes: Vec<(ActorId, SceneBox)>,
    next_actor: u64,
}

impl BoxScene {
    /// Adds a static box blocking every channel.
    pub fn add_box(&mut self, a: Vec3, b: Vec3) -> ActorId {
        self.insert(SceneBox::new(a, b))
    }

    pub fn insert(&mut self, shape: SceneBox) -> ActorId {
        self.next_actor += 1;
        let actor = ActorId(self.next_actor);
        self.boxes.push((actor, shape));
        actor
    }

    pub fn remove(&mut self, actor: ActorId) -> Option<SceneBox> {
        let index = self.boxes.iter().position(|(id, _)| *id == actor)?;
        Some(self.boxes.remove(index).1)
    }

    pub fn get(&self, actor: ActorId) -> Option<&SceneBox> {
        self.boxes
            .iter()
            .find_map(|(id, shape)| (*id == actor).then_some(shape))
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl RayCaster for BoxScene {
    fn line_trace(
        &self,
        start: Vec3,
        end: Vec3,
        channel: CollisionChannel,
        ignore: &IgnoreSet,
    ) -> Option<HitInfo> {
        let delta = end - start;
        let bits = channel.layer_bits();

        let (t, normal, actor, shape) = self
            .boxes
            .iter()
            .filter(|(actor, shape)| shape.channels & bits != 0 && !ignore.contains(*actor))
            .filter_map(|(actor, shape)| {
                shape
                    .intersect(start, delta)
                    .map(|(t, normal)| (t, normal, *actor, shape))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))?;

        let location = start + delta * t;
        Some(HitInfo {
            trace_start: start,
            location,
            impact_point: location,
            normal,
            impact_normal: normal,
            distance: delta.length() * t,
            actor: Some(actor),
            body: shape.body,
            physical_material: shape.material,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(scene: &BoxScene, start: Vec3, end: Vec3) -> Option<HitInfo> {
        scene.line_trace(start, end, CollisionChannel::Visibility, &IgnoreSet::default())
    }

    #[test]
    fn test_nearest_box_wins() {
        let mut scene = BoxScene::default();
        let far = scene.add_box(Vec3::new(50.0, -1.0, -1.0), Vec3::new(60.0, 1.0, 1.0));
        let near = scene.add_box(Vec3::new(20.0, -1.0, -1.0), Vec3::new(30.0, 1.0, 1.0));

        let hit = trace(&scene, Vec3::ZERO, Vec3::X * 100.0).unwrap();
        assert_eq!(hit.actor, Some(near));
        assert_eq!(hit.normal, Vec3::NEG_X);
        assert!((hit.distance - 20.0).abs() < 1e-4);

        let ignore = IgnoreSet::from_actors([Some(near)]);
        let hit = scene
            .line_trace(Vec3::ZERO, Vec3::X * 100.0, CollisionChannel::Visibility, &ignore)
            .unwrap();
        assert_eq!(hit.actor, Some(far));
    }

    #[test]
    fn test_segment_bounds() {
        let mut scene = BoxScene::default();
        scene.add_box(Vec3::new(20.0, -1.0, -1.0), Vec3::new(30.0, 1.0, 1.0));
        assert!(trace(&scene, Vec3::ZERO, Vec3::X * 10.0).is_none());
        assert!(trace(&scene, Vec3::X * 40.0, Vec3::X * 100.0).is_none());
        assert!(trace(&scene, Vec3::new(0.0, 5.0, 0.0), Vec3::new(100.0, 5.0, 0.0)).is_none());
    }

    #[test]
    fn test_reverse_trace_hits_far_face() {
        let mut scene = BoxScene::default();
        scene.add_box(Vec3::new(20.0, -1.0, -1.0), Vec3::new(30.0, 1.0, 1.0));
        let hit = trace(&scene, Vec3::X * 100.0, Vec3::ZERO).unwrap();
        assert!(hit.location.abs_diff_eq(Vec3::X * 30.0, 1e-4));
        assert_eq!(hit.normal, Vec3::X);
    }

    #[test]
    fn test_trace_from_inside_passes_out() {
        let mut scene = BoxScene::default();
        scene.add_box(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(10.0, 10.0, 10.0));
        assert!(trace(&scene, Vec3::ZERO, Vec3::X * 100.0).is_none());
    }

    #[test]
    fn test_channel_filtering() {
        let mut scene = BoxScene::default();
        let pawn = scene.insert(
            SceneBox::new(Vec3::new(20.0, -1.0, -1.0), Vec3::new(30.0, 1.0, 1.0))
                .blocking(&[CollisionChannel::Pawn])
                .skeletal(),
        );
        assert!(trace(&scene, Vec3::ZERO, Vec3::X * 100.0).is_none());
        let hit = scene
            .line_trace(Vec3::ZERO, Vec3::X * 100.0, CollisionChannel::Pawn, &IgnoreSet::default())
            .unwrap();
        assert_eq!(hit.actor, Some(pawn));
        assert_eq!(hit.body, BodyKind::Skeletal);
        assert!(scene.remove(pawn).is_some());
        assert!(scene.is_empty());
    }
}
