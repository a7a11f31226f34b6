//! Rasterize a symbol to 8-bit luminance

use image::GrayImage;

use crate::models::BitMatrix;

const DARK: u8 = 0;
const LIGHT: u8 = 255;

/// Square luminance raster: `scale` pixels per module and `quiet_zone`
/// light modules on each side. Returns the pixels and the edge length.
pub fn to_luma(modules: &BitMatrix, scale: usize, quiet_zone: usize) -> (Vec<u8>, usize) {
    let scale = scale.max(1);
    let size = (modules.width() + 2 * quiet_zone) * scale;
    let mut pixels = vec![LIGHT; size * size];
    for y in 0..modules.height() {
        for x in 0..modules.width() {
            if !modules.get(x, y) {
                continue;
            }
            let top = (y + quiet_zone) * scale;
            let left = (x + quiet_zone) * scale;
            for row in pixels[top * size..(top + scale) * size].chunks_exact_mut(size) {
                row[left..left + scale].fill(DARK);
            }
        }
    }
    (pixels, size)
}

/// [`to_luma`] as an `image` buffer
pub fn to_image(modules: &BitMatrix, scale: usize, quiet_zone: usize) -> GrayImage {
    let (pixels, size) = to_luma(modules, scale, quiet_zone);
    let size = size as u32;
    GrayImage::from_fn(size, size, |x, y| {
        image::Luma([pixels[(y * size + x) as usize]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_with_quiet_zone() {
        let mut modules = BitMatrix::square(2);
        modules.set(1, 0, true);
        let (pixels, size) = to_luma(&modules, 2, 1);
        assert_eq!(size, 8);
        // module (1, 0) covers pixels x 4..6, y 2..4
        assert_eq!(pixels[2 * size + 4], DARK);
        assert_eq!(pixels[3 * size + 5], DARK);
        assert_eq!(pixels[2 * size + 3], LIGHT);
        assert_eq!(pixels.iter().filter(|&&p| p == DARK).count(), 4);
    }

    #[test]
    fn test_image_matches_raster() {
        let mut modules = BitMatrix::square(3);
        modules.set(0, 2, true);
        let image = to_image(&modules, 1, 0);
        assert_eq!(image.dimensions(), (3, 3));
        assert_eq!(image.get_pixel(0, 2).0, [DARK]);
        assert_eq!(image.get_pixel(2, 0).0, [LIGHT]);
    }
}
