//! Global resources for the ballistics system.

use std::collections::VecDeque;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schedule::FrameTimers;
use crate::types::TraceSink;
use crate::wind::WindSourceLocator;

/// Global ballistics settings shared by every projectile.
///
/// Units are centimeters and seconds, Y-up.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hybrid_ballistics::resources::BallisticsConfig;
///
/// let config = BallisticsConfig {
///     gravity: Vec3::new(0.0, -1620.0, 0.0),
///     debug_draw: true,
///     ..Default::default()
/// };
/// assert_eq!(config.wind_resolution_delay, 2.0);
/// ```
#[derive(Resource, Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct BallisticsConfig {
    /// Gravity acceleration (cm/s²)
    pub gravity: Vec3,
    /// Delay before a world looks for its wind source (seconds)
    pub wind_resolution_delay: f32,
    /// Length of the forward probe used to measure penetration thickness (cm)
    pub thickness_trace_distance: f32,
    /// Frame movement (cm) below which the swept trace is skipped
    pub min_trace_length: f32,
    /// Re-align `forward` with the velocity after each movement step
    pub rotation_follows_velocity: bool,
    /// Draw every projectile path and impact, regardless of per-projectile flags
    pub debug_draw: bool,
    /// Debug shapes kept for drawing before the oldest are dropped
    pub max_debug_shapes: usize,
}

impl Default for BallisticsConfig {
    /// Default values:
    /// - Gravity: 980 cm/s² downward
    /// - Wind source resolved 2 s after world start
    /// - 100 m thickness probe
    /// - Velocity-aligned rotation
    /// - Debug drawing disabled
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -980.0, 0.0),
            wind_resolution_delay: 2.0,
            thickness_trace_distance: 10000.0,
            min_trace_length: 0.001,
            rotation_follows_velocity: true,
            debug_draw: false,
            max_debug_shapes: 4096,
        }
    }
}

/// Deferred work on the ECS world timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BallisticsTask {
    /// Look up the world's wind source
    ResolveWindSource,
    /// Lifetime of a projectile ran out
    ExpireProjectile(Entity),
}

/// Frame-stepped timers of the ECS world, advanced by the fixed timestep.
#[derive(Resource, Default)]
pub struct BallisticsTimers(pub FrameTimers<BallisticsTask>);

/// The wind emitter entity projectiles of this world sample at spawn.
#[derive(Resource, Default)]
pub struct WorldWindSource(pub WindSourceLocator<Entity>);

/// A shape queued for debug drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DebugShape {
    Segment { start: Vec3, end: Vec3, color: Color },
    Sphere { center: Vec3, radius: f32, color: Color },
}

/// Debug shapes produced by the simulation, drained by the gizmo system.
///
/// Bounded: once `max_size` shapes are queued the oldest are dropped.
#[derive(Resource, Debug)]
pub struct DebugTraceBuffer {
    pub shapes: VecDeque<DebugShape>,
    pub max_size: usize,
}

impl Default for DebugTraceBuffer {
    fn default() -> Self {
        Self::new(BallisticsConfig::default().max_debug_shapes)
    }
}

impl DebugTraceBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            shapes: VecDeque::new(),
            max_size,
        }
    }

    fn push(&mut self, shape: DebugShape) {
        if self.max_size == 0 {
            return;
        }
        while self.shapes.len() >= self.max_size {
            self.shapes.pop_front();
        }
        self.shapes.push_back(shape);
    }

    /// Takes every queued shape, oldest first.
    pub fn drain(&mut self) -> Vec<DebugShape> {
        self.shapes.drain(..).collect()
    }
}

impl TraceSink for DebugTraceBuffer {
    fn on_debug_segment(&mut self, start: Vec3, end: Vec3, color: Color) {
        self.push(DebugShape::Segment { start, end, color });
    }

    fn on_debug_sphere(&mut self, center: Vec3, radius: f32, color: Color) {
        self.push(DebugShape::Sphere {
            center,
            radius,
            color,
        });
    }
}
