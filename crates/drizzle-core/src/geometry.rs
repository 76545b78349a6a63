//! Geometry helpers for placing particles under an angled fall.

use fastrand::Rng;

/// A position in surface pixels. The origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `to`, with `t` clamped to 0..=1.
    pub fn lerp(self, to: Point, t: f32) -> Point {
        let t = t.clamp(0.0, 1.0);
        Point {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

/// Surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Uniform sample from `[min, max)`. Returns `min` for an empty range.
pub fn random_in_range(rng: &mut Rng, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    min + rng.f32() * (max - min)
}

/// Whether a fall angle lies strictly within (-90°, 90°).
pub fn is_supported_angle(angle: f32) -> bool {
    angle > -90.0 && angle < 90.0
}

/// Horizontal displacement over a fall of `height` pixels at `angle` degrees.
pub fn drift(height: f32, angle: f32) -> f32 {
    if angle == 0.0 {
        return 0.0;
    }
    height * deg_to_rad(angle).tan()
}

/// Range to sample the start X from so that `start + drift` lands in `[0, width]`.
///
/// A rightward drift shifts the range left and a leftward drift shifts it
/// right by the same amount.
pub fn start_x_range(width: f32, drift: f32) -> (f32, f32) {
    (-drift, width - drift)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    #[test]
    fn test_deg_to_rad() {
        assert!((deg_to_rad(180.0) - std::f32::consts::PI).abs() < EPSILON);
        assert!((deg_to_rad(-45.0) + std::f32::consts::FRAC_PI_4).abs() < EPSILON);
    }

    #[test]
    fn test_random_in_range_bounds() {
        let mut rng = Rng::with_seed(7);
        for _ in 0..1000 {
            let v = random_in_range(&mut rng, -20.0, 30.0);
            assert!((-20.0..30.0).contains(&v));
        }
        assert_eq!(random_in_range(&mut rng, 5.0, 5.0), 5.0);
        assert_eq!(random_in_range(&mut rng, 5.0, 1.0), 5.0);
    }

    #[test]
    fn test_drift() {
        assert_eq!(drift(300.0, 0.0), 0.0);
        assert!((drift(300.0, 45.0) - 300.0).abs() < EPSILON);
        assert!((drift(300.0, -45.0) + 300.0).abs() < EPSILON);
    }

    #[test]
    fn test_start_range_keeps_end_in_bounds() {
        let width = 200.0;
        for angle in [-60.0, -10.0, 0.0, 10.0, 60.0] {
            let d = drift(100.0, angle);
            let (lo, hi) = start_x_range(width, d);
            assert!((lo + d).abs() < EPSILON);
            assert!((hi + d - width).abs() < EPSILON);
        }
        // rightward fall biases the start left, leftward fall biases it right
        assert!(start_x_range(width, 50.0).0 < 0.0);
        assert!(start_x_range(width, -50.0).1 > width);
    }

    #[test]
    fn test_supported_angle() {
        assert!(is_supported_angle(0.0));
        assert!(is_supported_angle(89.9));
        assert!(is_supported_angle(-89.9));
        assert!(!is_supported_angle(90.0));
        assert!(!is_supported_angle(-90.0));
        assert!(!is_supported_angle(95.0));
        assert!(!is_supported_angle(f32::NAN));
    }

    #[test]
    fn test_lerp_clamps() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 20.0);
        assert_eq!(a.lerp(b, 0.5), Point::new(5.0, 10.0));
        assert_eq!(a.lerp(b, 2.0), b);
        assert_eq!(a.lerp(b, -1.0), a);
    }
}
