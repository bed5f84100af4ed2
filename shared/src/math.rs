use serde::{Deserialize, Serialize};

///Represents a vector in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vector2 {
    ///Value along the x-axis.
    pub x: f32,
    ///Value along the y-axis.
    pub y: f32,
}

impl Vector2 {
    ///Creates a new vector.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the unit vector pointing at `degrees`.
    pub fn polar(degrees: f32) -> Vector2 {
        let radians = degrees.to_radians();
        Vector2 {
            x: radians.cos(),
            y: radians.sin(),
        }
    }

    /// Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        self.squared_magnitude().sqrt()
    }

    /// Returns the squared magnitude of the vector.
    ///
    /// Prefer this over [`Vector2::magnitude`] for distance comparisons.
    pub fn squared_magnitude(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Returns the normalized vector.
    pub fn normalize(&self) -> Vector2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vector2 { x: 0.0, y: 0.0 }
        } else {
            Vector2 {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    /// Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vector2 {
        Vector2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    /// Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Returns `self - other`.
    pub fn sub(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Returns the dot product of two vectors.
    pub fn dot(&self, other: &Vector2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Returns the vector rotated counter-clockwise by `degrees`.
    pub fn rotated(&self, degrees: f32) -> Vector2 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Vector2 {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Returns the point of the segment `start..end` closest to `self`,
    /// together with its fraction along the segment in `[0, 1]`.
    ///
    /// A degenerate segment yields `start` at fraction 0.
    pub fn closest_on_segment(&self, start: &Vector2, end: &Vector2) -> (Vector2, f32) {
        let segment = end.sub(start);
        let length_sqr = segment.squared_magnitude();
        if length_sqr == 0.0 {
            return (*start, 0.0);
        }
        let fraction = (self.sub(start).dot(&segment) / length_sqr).clamp(0.0, 1.0);
        (start.add(&segment.scale(fraction)), fraction)
    }

    /// Bearing of the vector in degrees, wrapped to `[0, 360)`.
    pub fn polar_angle(&self) -> f32 {
        wrap_degrees(self.y.atan2(self.x).to_degrees())
    }
}

/// Wraps an angle into `[0, 360)`.
pub fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Unsigned shortest angle between two bearings, in `[0, 180]`.
pub fn angle_between(a: f32, b: f32) -> f32 {
    let delta = wrap_degrees(b - a);
    if delta > 180.0 {
        360.0 - delta
    } else {
        delta
    }
}
