//! Errors reported when a projectile cannot be created.

use std::fmt;

/// A [`ProjectileSpec`](crate::components::ProjectileSpec) or launch request
/// that cannot be simulated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectileSpecError {
    /// Muzzle velocity is zero, negative or not finite (ft/s)
    InvalidVelocity(f32),
    /// Bullet weight of zero grains
    ZeroWeight,
    /// Lifetime is zero, negative or not finite (seconds)
    InvalidLifetime(f32),
    /// Launch direction has no length or is not finite
    InvalidDirection,
}

impl fmt::Display for ProjectileSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVelocity(velocity) => {
                write!(f, "muzzle velocity must be positive, got {velocity} ft/s")
            }
            Self::ZeroWeight => f.write_str("bullet weight must be at least one grain"),
            Self::InvalidLifetime(lifetime) => {
                write!(f, "lifetime must be positive, got {lifetime} s")
            }
            Self::InvalidDirection => f.write_str("launch direction must be a finite, non-zero vector"),
        }
    }
}

impl std::error::Error for ProjectileSpecError {}
