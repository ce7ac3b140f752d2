//! Element bounds geometry
//!
//! Axis-aligned rectangles in viewport coordinates. The only nontrivial
//! operation is `fraction_inside`, which drives the visibility threshold:
//! an element counts as visible once a sufficient fraction of its area
//! intersects the viewport.

/// Axis-aligned bounds of an element, in viewport coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    /// X position (absolute, after layout)
    pub x: f32,
    /// Y position (absolute, after layout)
    pub y: f32,
    /// Computed width
    pub width: f32,
    /// Computed height
    pub height: f32,
}

impl Bounds {
    /// Create new bounds
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if a point is inside the bounds
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// Check if bounds overlap another bounds
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// The overlapping region of two bounds, if any
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.width).min(other.x + other.width);
        let y1 = (self.y + self.height).min(other.y + other.height);

        if x1 > x0 && y1 > y0 {
            Some(Bounds::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }

    /// Area in square units
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Fraction of this element's area that lies inside `viewport` (0.0 to 1.0)
    ///
    /// Zero-area elements degenerate to a point test: fully inside or fully
    /// outside.
    pub fn fraction_inside(&self, viewport: &Bounds) -> f32 {
        let area = self.area();
        if area <= f32::EPSILON {
            return if viewport.contains(self.x, self.y) {
                1.0
            } else {
                0.0
            };
        }

        match self.intersection(viewport) {
            Some(overlap) => (overlap.area() / area).clamp(0.0, 1.0),
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let b = Bounds::new(10.0, 10.0, 100.0, 50.0);
        assert!(b.contains(10.0, 10.0));
        assert!(b.contains(50.0, 30.0));
        assert!(!b.contains(110.0, 30.0));
        assert!(!b.contains(50.0, 60.0));
    }

    #[test]
    fn test_intersects() {
        let a = Bounds::new(0.0, 0.0, 100.0, 100.0);
        let b = Bounds::new(50.0, 50.0, 100.0, 100.0);
        let c = Bounds::new(200.0, 200.0, 10.0, 10.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_intersection_area() {
        let a = Bounds::new(0.0, 0.0, 100.0, 100.0);
        let b = Bounds::new(50.0, 50.0, 100.0, 100.0);

        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap, Bounds::new(50.0, 50.0, 50.0, 50.0));
        assert!((overlap.area() - 2500.0).abs() < 1e-4);

        let c = Bounds::new(200.0, 0.0, 10.0, 10.0);
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn test_fraction_inside() {
        let viewport = Bounds::new(0.0, 0.0, 1000.0, 500.0);

        // Fully inside
        let inner = Bounds::new(100.0, 100.0, 200.0, 100.0);
        assert!((inner.fraction_inside(&viewport) - 1.0).abs() < 1e-6);

        // Half of the element hangs below the viewport
        let half = Bounds::new(100.0, 450.0, 200.0, 100.0);
        assert!((half.fraction_inside(&viewport) - 0.5).abs() < 1e-6);

        // Fully outside
        let outside = Bounds::new(100.0, 600.0, 200.0, 100.0);
        assert_eq!(outside.fraction_inside(&viewport), 0.0);
    }

    #[test]
    fn test_fraction_inside_zero_area() {
        let viewport = Bounds::new(0.0, 0.0, 1000.0, 500.0);

        let point_in = Bounds::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(point_in.fraction_inside(&viewport), 1.0);

        let point_out = Bounds::new(10.0, 600.0, 0.0, 0.0);
        assert_eq!(point_out.fraction_inside(&viewport), 0.0);
    }
}
