//! Projective transforms between quadrilaterals

use crate::models::Point;

/// 3x3 projective transform, stored column-major as the closed-form
/// square/quadrilateral construction produces it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveTransform {
    a11: f32,
    a12: f32,
    a13: f32,
    a21: f32,
    a22: f32,
    a23: f32,
    a31: f32,
    a32: f32,
    a33: f32,
}

impl PerspectiveTransform {
    #[allow(clippy::too_many_arguments)]
    fn new(
        a11: f32,
        a21: f32,
        a31: f32,
        a12: f32,
        a22: f32,
        a32: f32,
        a13: f32,
        a23: f32,
        a33: f32,
    ) -> Self {
        Self {
            a11,
            a12,
            a13,
            a21,
            a22,
            a23,
            a31,
            a32,
            a33,
        }
    }

    /// Transform mapping the quadrilateral `from` onto `to`, corners in the
    /// same winding order
    pub fn quadrilateral_to_quadrilateral(from: [Point; 4], to: [Point; 4]) -> Self {
        let q_to_s = Self::quadrilateral_to_square(from);
        let s_to_q = Self::square_to_quadrilateral(to);
        s_to_q.times(&q_to_s)
    }

    /// Unit square (0,0), (1,0), (1,1), (0,1) onto the quadrilateral
    pub fn square_to_quadrilateral(quad: [Point; 4]) -> Self {
        let [p0, p1, p2, p3] = quad;
        let dx3 = p0.x - p1.x + p2.x - p3.x;
        let dy3 = p0.y - p1.y + p2.y - p3.y;
        if dx3 == 0.0 && dy3 == 0.0 {
            // Affine
            return Self::new(
                p1.x - p0.x,
                p2.x - p1.x,
                p0.x,
                p1.y - p0.y,
                p2.y - p1.y,
                p0.y,
                0.0,
                0.0,
                1.0,
            );
        }
        let dx1 = p1.x - p2.x;
        let dx2 = p3.x - p2.x;
        let dy1 = p1.y - p2.y;
        let dy2 = p3.y - p2.y;
        let denominator = dx1 * dy2 - dx2 * dy1;
        let a13 = (dx3 * dy2 - dx2 * dy3) / denominator;
        let a23 = (dx1 * dy3 - dx3 * dy1) / denominator;
        Self::new(
            p1.x - p0.x + a13 * p1.x,
            p3.x - p0.x + a23 * p3.x,
            p0.x,
            p1.y - p0.y + a13 * p1.y,
            p3.y - p0.y + a23 * p3.y,
            p0.y,
            a13,
            a23,
            1.0,
        )
    }

    /// The quadrilateral onto the unit square
    pub fn quadrilateral_to_square(quad: [Point; 4]) -> Self {
        // Adjoint is the inverse up to scale
        Self::square_to_quadrilateral(quad).build_adjoint()
    }

    fn build_adjoint(&self) -> Self {
        Self::new(
            self.a22 * self.a33 - self.a23 * self.a32,
            self.a23 * self.a31 - self.a21 * self.a33,
            self.a21 * self.a32 - self.a22 * self.a31,
            self.a13 * self.a32 - self.a12 * self.a33,
            self.a11 * self.a33 - self.a13 * self.a31,
            self.a12 * self.a31 - self.a11 * self.a32,
            self.a12 * self.a23 - self.a13 * self.a22,
            self.a13 * self.a21 - self.a11 * self.a23,
            self.a11 * self.a22 - self.a12 * self.a21,
        )
    }

    fn times(&self, other: &Self) -> Self {
        Self::new(
            self.a11 * other.a11 + self.a21 * other.a12 + self.a31 * other.a13,
            self.a11 * other.a21 + self.a21 * other.a22 + self.a31 * other.a23,
            self.a11 * other.a31 + self.a21 * other.a32 + self.a31 * other.a33,
            self.a12 * other.a11 + self.a22 * other.a12 + self.a32 * other.a13,
            self.a12 * other.a21 + self.a22 * other.a22 + self.a32 * other.a23,
            self.a12 * other.a31 + self.a22 * other.a32 + self.a32 * other.a33,
            self.a13 * other.a11 + self.a23 * other.a12 + self.a33 * other.a13,
            self.a13 * other.a21 + self.a23 * other.a22 + self.a33 * other.a23,
            self.a13 * other.a31 + self.a23 * other.a32 + self.a33 * other.a33,
        )
    }

    /// Transform a single point
    pub fn transform(&self, p: Point) -> Point {
        let denominator = self.a13 * p.x + self.a23 * p.y + self.a33;
        Point::new(
            (self.a11 * p.x + self.a21 * p.y + self.a31) / denominator,
            (self.a12 * p.x + self.a22 * p.y + self.a32) / denominator,
        )
    }

    /// Transform interleaved `x, y` pairs in place
    pub fn transform_points(&self, points: &mut [f32]) {
        for pair in points.chunks_exact_mut(2) {
            let p = self.transform(Point::new(pair[0], pair[1]));
            pair[0] = p.x;
            pair[1] = p.y;
        }
    }
}
