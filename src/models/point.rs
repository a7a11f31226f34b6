/// 2D point with floating point coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Calculate squared distance (faster, no sqrt)
    pub fn distance_squared(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Z component of the cross product of (a - b) and (c - b)
    pub fn cross_product_z(a: &Point, b: &Point, c: &Point) -> f32 {
        (c.x - b.x) * (a.y - b.y) - (c.y - b.y) * (a.x - b.x)
    }
}

/// Order three points as `[bottom_left, top_left, top_right]`.
///
/// The two points furthest apart span the diagonal, the remaining one is the
/// top-left corner. The cross product sign decides which end of the diagonal
/// is top-right.
pub fn order_best_patterns<T: Copy>(patterns: [T; 3], center: impl Fn(&T) -> Point) -> [T; 3] {
    let [p0, p1, p2] = patterns.map(|p| (p, center(&p)));
    let zero_one = p0.1.distance(&p1.1);
    let one_two = p1.1.distance(&p2.1);
    let zero_two = p0.1.distance(&p2.1);

    let (mut a, b, mut c) = if one_two >= zero_one && one_two >= zero_two {
        (p1, p0, p2)
    } else if zero_two >= one_two && zero_two >= zero_one {
        (p0, p1, p2)
    } else {
        (p0, p2, p1)
    };

    if Point::cross_product_z(&a.1, &b.1, &c.1) < 0.0 {
        std::mem::swap(&mut a, &mut c);
    }
    [a.0, b.0, c.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn test_order_upright() {
        let tl = Point::new(10.0, 10.0);
        let tr = Point::new(100.0, 10.0);
        let bl = Point::new(10.0, 100.0);
        let ordered = order_best_patterns([tr, bl, tl], |p| *p);
        assert_eq!(ordered, [bl, tl, tr]);
    }

    #[test]
    fn test_order_mirrored_swaps_corners() {
        // Transposed layout: what looked like top-right is now bottom-left
        let tl = Point::new(10.0, 10.0);
        let a = Point::new(10.0, 100.0);
        let b = Point::new(100.0, 10.0);
        let ordered = order_best_patterns([tl, a, b], |p| *p);
        assert_eq!(ordered, [a, tl, b]);
    }
}
