use bevy::math::DVec2;

/// Velocity and direction values carried by gas cells.
pub type Vector2 = DVec2;

/// Magnitude and angle helpers used by the flow solver.
pub trait Vector2Ext: Sized {
    /// Euclidean length.
    fn magnitude(&self) -> f64;

    /// Rescales the vector to `magnitude` while keeping its direction.
    /// The zero vector has no direction and is left untouched.
    fn set_magnitude(&mut self, magnitude: f64);

    fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.set_magnitude(magnitude);
        self
    }

    /// Unsigned angle between the two directions, in `[0, π]`.
    /// Returns 0 when either vector is zero.
    fn unsigned_angle(&self, other: Self) -> f64;
}

impl Vector2Ext for DVec2 {
    fn magnitude(&self) -> f64 {
        self.length()
    }

    fn set_magnitude(&mut self, magnitude: f64) {
        let current = self.length();
        if current > 0.0 {
            *self *= magnitude / current;
        }
    }

    fn unsigned_angle(&self, other: Self) -> f64 {
        if *self == DVec2::ZERO || other == DVec2::ZERO {
            return 0.0;
        }
        self.perp_dot(other).atan2(self.dot(other)).abs()
    }
}
