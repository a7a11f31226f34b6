//! Sample the module grid through a perspective transform

use crate::error::{QrError, Result};
use crate::models::BitMatrix;
use crate::utils::geometry::PerspectiveTransform;

/// Read a `dimension` x `dimension` module grid from `image`, mapping each
/// module centre through `transform`
pub fn sample_grid(
    image: &BitMatrix,
    dimension: usize,
    transform: &PerspectiveTransform,
) -> Result<BitMatrix> {
    if dimension == 0 {
        return Err(QrError::NotFound);
    }
    let mut bits = BitMatrix::square(dimension);
    let mut points = vec![0.0f32; 2 * dimension];
    for y in 0..dimension {
        let i_value = y as f32 + 0.5;
        for (x, pair) in points.chunks_exact_mut(2).enumerate() {
            pair[0] = x as f32 + 0.5;
            pair[1] = i_value;
        }
        transform.transform_points(&mut points);
        check_and_nudge_points(image, &mut points)?;
        for (x, pair) in points.chunks_exact(2).enumerate() {
            let (px, py) = (pair[0] as i64, pair[1] as i64);
            if px < 0 || py < 0 || px >= image.width() as i64 || py >= image.height() as i64 {
                return Err(QrError::NotFound);
            }
            if image.get(px as usize, py as usize) {
                bits.set(x, y, true);
            }
        }
    }
    Ok(bits)
}

/// Pull points lying at most one pixel outside the image back onto its edge.
///
/// Only the runs at either end of the row are checked; a point further out
/// means the transform is wrong and the symbol is rejected.
pub fn check_and_nudge_points(image: &BitMatrix, points: &mut [f32]) -> Result<()> {
    let width = image.width() as i64;
    let height = image.height() as i64;
    let pairs = points.len() / 2;

    let nudge = |pair: &mut [f32]| -> Result<bool> {
        let x = pair[0] as i64;
        let y = pair[1] as i64;
        if x < -1 || x > width || y < -1 || y > height {
            return Err(QrError::NotFound);
        }
        let mut nudged = false;
        if x == -1 {
            pair[0] = 0.0;
            nudged = true;
        } else if x == width {
            pair[0] = (width - 1) as f32;
            nudged = true;
        }
        if y == -1 {
            pair[1] = 0.0;
            nudged = true;
        } else if y == height {
            pair[1] = (height - 1) as f32;
            nudged = true;
        }
        Ok(nudged)
    };

    for index in 0..pairs {
        if !nudge(&mut points[2 * index..2 * index + 2])? {
            break;
        }
    }
    for index in (0..pairs).rev() {
        if !nudge(&mut points[2 * index..2 * index + 2])? {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;

    fn identity_scaled(scale: f32, dimension: usize) -> PerspectiveTransform {
        let d = dimension as f32;
        PerspectiveTransform::quadrilateral_to_quadrilateral(
            [
                Point::new(0.0, 0.0),
                Point::new(d, 0.0),
                Point::new(d, d),
                Point::new(0.0, d),
            ],
            [
                Point::new(0.0, 0.0),
                Point::new(d * scale, 0.0),
                Point::new(d * scale, d * scale),
                Point::new(0.0, d * scale),
            ],
        )
    }

    #[test]
    fn test_sample_scaled_checkerboard() {
        let scale = 4;
        let dimension = 5;
        let mut image = BitMatrix::square(dimension * scale);
        for y in 0..dimension * scale {
            for x in 0..dimension * scale {
                if (x / scale + y / scale) % 2 == 0 {
                    image.set(x, y, true);
                }
            }
        }
        let bits = sample_grid(&image, dimension, &identity_scaled(scale as f32, dimension)).unwrap();
        for y in 0..dimension {
            for x in 0..dimension {
                assert_eq!(bits.get(x, y), (x + y) % 2 == 0, "module ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_nudge_edge_points() {
        let image = BitMatrix::square(10);
        let mut points = [-0.5, 3.0, 10.2, 3.0, 5.0, 10.9];
        check_and_nudge_points(&image, &mut points).unwrap();
        // -0.5 truncates to 0 and is already inside
        assert_eq!(points[0], -0.5);
        // walking in from the far end nudges until a point needs no change
        assert_eq!(points[5], 9.0);
        assert_eq!(points[2], 9.0);

        let mut points = [-1.5, 3.0, 4.0, 4.0];
        check_and_nudge_points(&image, &mut points).unwrap();
        assert_eq!(points[0], 0.0);
    }

    #[test]
    fn test_far_outside_rejected() {
        let image = BitMatrix::square(10);
        let mut points = [-3.0, 3.0];
        assert_eq!(
            check_and_nudge_points(&image, &mut points),
            Err(QrError::NotFound)
        );
        let bigger = identity_scaled(4.0, 5);
        assert_eq!(sample_grid(&image, 5, &bigger), Err(QrError::NotFound));
    }
}
