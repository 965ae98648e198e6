//! Points and distances.

/// A point with sub-pixel coordinates. Pixel addresses are obtained by rounding.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates rounded to the nearest integer
    pub fn rounded(self) -> Self {
        Self {
            x: self.x.round(),
            y: self.y.round(),
        }
    }

    /// True when the point sits exactly on a pixel address
    pub fn is_integral(self) -> bool {
        self.x.fract() == 0.0 && self.y.fract() == 0.0
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point2D, b: Point2D) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance(Point2D::new(0.0, 0.0), Point2D::new(3.0, 4.0)), 5.0);
        assert_eq!(distance(Point2D::new(-1.0, 2.0), Point2D::new(-1.0, 2.0)), 0.0);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        let p = Point2D::new(2.5, -2.5).rounded();
        assert_eq!(p, Point2D::new(3.0, -3.0));
        assert!(p.is_integral());
        assert!(!Point2D::new(1.25, 3.0).is_integral());
    }
}
