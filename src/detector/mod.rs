//! QR code detection
//!
//! Locates a symbol in a binarized image and samples its module grid:
//! - Finder pattern detection (the three square markers)
//! - Alignment pattern detection (for versions 2+)
//! - Perspective transform and grid sampling

/// Alignment pattern detection for QR versions 2+
pub mod alignment;
/// Finder pattern detection using 1:1:3:1:1 ratio scanning
pub mod finder;
/// Sample grid extraction through a perspective transform
pub mod transform;

use log::debug;

use crate::config::{self, DecodeHints};
use crate::error::{QrError, Result};
use crate::models::{BitMatrix, Pattern, Point, Version};
use crate::utils::geometry::PerspectiveTransform;

use alignment::AlignmentPatternFinder;
use finder::{FinderPatternFinder, FinderPatternInfo};

/// A sampled module grid and the image points it was located by
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorResult {
    /// Module grid, `true` is dark
    pub bits: BitMatrix,
    /// `[bottom_left, top_left, top_right]`, plus the alignment pattern when found
    pub points: Vec<Point>,
}

/// Finds and samples one symbol in a binarized image
pub struct Detector<'a> {
    image: &'a BitMatrix,
}

impl<'a> Detector<'a> {
    /// Detector over a binarized image
    pub fn new(image: &'a BitMatrix) -> Self {
        Self { image }
    }

    /// The binarized image being searched
    pub fn image(&self) -> &BitMatrix {
        self.image
    }

    /// Locate the finder patterns and sample the grid they span
    pub fn detect(&self, hints: &DecodeHints) -> Result<DetectorResult> {
        let info = FinderPatternFinder::new(self.image, hints).find()?;
        self.process_finder_pattern_info(&info, hints)
    }

    /// Sample the grid spanned by already located finder patterns
    pub fn process_finder_pattern_info(
        &self,
        info: &FinderPatternInfo,
        hints: &DecodeHints,
    ) -> Result<DetectorResult> {
        let FinderPatternInfo {
            bottom_left,
            top_left,
            top_right,
        } = *info;

        let module_size = self.calculate_module_size(&top_left, &top_right, &bottom_left);
        if module_size.is_nan() || module_size < 1.0 {
            return Err(QrError::NotFound);
        }
        let dimension = compute_dimension(&top_left, &top_right, &bottom_left, module_size)?;
        let provisional = Version::provisional_for_dimension(dimension)?;
        debug!(
            "finders span {dimension} modules at {module_size:.2} px, provisional version {}",
            provisional.number()
        );

        let mut alignment = None;
        if !provisional.alignment_centers().is_empty() {
            let modules_between_centers = (provisional.dimension() - 7) as f32;
            let bottom_right_x = top_right.x() - top_left.x() + bottom_left.x();
            let bottom_right_y = top_right.y() - top_left.y() + bottom_left.y();
            // The bottom-right alignment centre sits 3 modules in from the
            // corner the finders imply
            let correction = 1.0 - 3.0 / modules_between_centers;
            let est_x = top_left.x() + correction * (bottom_right_x - top_left.x());
            let est_y = top_left.y() + correction * (bottom_right_y - top_left.y());

            let max_factor = config::alignment_allowance_max();
            let mut factor = config::alignment_allowance_start();
            while factor <= max_factor {
                match self.find_alignment_in_region(module_size, est_x, est_y, factor as f32, hints)
                {
                    Ok(pattern) => {
                        alignment = Some(pattern);
                        break;
                    }
                    Err(_) => {
                        debug!("no alignment pattern within {factor} modules of ({est_x:.1}, {est_y:.1})");
                        factor <<= 1;
                    }
                }
            }
        }

        let transform = create_transform(&top_left, &top_right, &bottom_left, alignment.as_ref(), dimension);
        let bits = transform::sample_grid(self.image, dimension, &transform)?;

        let mut points = vec![bottom_left.center, top_left.center, top_right.center];
        if let Some(pattern) = alignment {
            points.push(pattern.center);
        }
        Ok(DetectorResult { bits, points })
    }

    /// Average module size measured along the top and left edges
    fn calculate_module_size(&self, top_left: &Pattern, top_right: &Pattern, bottom_left: &Pattern) -> f32 {
        (self.module_size_one_way(top_left, top_right) + self.module_size_one_way(top_left, bottom_left)) / 2.0
    }

    /// Finder width in pixels / 7, measured from both patterns towards each other
    fn module_size_one_way(&self, pattern: &Pattern, other: &Pattern) -> f32 {
        let (px, py) = (pattern.x() as i32, pattern.y() as i32);
        let (ox, oy) = (other.x() as i32, other.y() as i32);
        let one = self.size_of_black_white_black_run_both_ways(px, py, ox, oy);
        let two = self.size_of_black_white_black_run_both_ways(ox, oy, px, py);
        match (one, two) {
            (Some(one), Some(two)) => (one + two) / 14.0,
            (Some(one), None) => one / 7.0,
            (None, Some(two)) => two / 7.0,
            (None, None) => f32::NAN,
        }
    }

    /// Run through the finder centre towards `to` and the same distance away
    /// from it, clipped to the image
    fn size_of_black_white_black_run_both_ways(
        &self,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    ) -> Option<f32> {
        let width = self.image.width() as i32;
        let height = self.image.height() as i32;
        let result = self.size_of_black_white_black_run(from_x, from_y, to_x, to_y)?;

        let mut scale = 1.0f32;
        let mut other_to_x = from_x - (to_x - from_x);
        if other_to_x < 0 {
            scale = from_x as f32 / (from_x - other_to_x) as f32;
            other_to_x = 0;
        } else if other_to_x >= width {
            scale = (width - 1 - from_x) as f32 / (other_to_x - from_x) as f32;
            other_to_x = width - 1;
        }
        let mut other_to_y = (from_y as f32 - (to_y - from_y) as f32 * scale) as i32;

        scale = 1.0;
        if other_to_y < 0 {
            scale = from_y as f32 / (from_y - other_to_y) as f32;
            other_to_y = 0;
        } else if other_to_y >= height {
            scale = (height - 1 - from_y) as f32 / (other_to_y - from_y) as f32;
            other_to_y = height - 1;
        }
        let other_to_x = (from_x as f32 + (other_to_x - from_x) as f32 * scale) as i32;

        let other = self.size_of_black_white_black_run(from_x, from_y, other_to_x, other_to_y)?;
        // The centre pixel is counted by both runs
        Some(result + other - 1.0)
    }

    /// Bresenham walk from `from` until the dark-light-dark sequence ends;
    /// the distance covered, or `None` if the line ends first
    fn size_of_black_white_black_run(&self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> Option<f32> {
        let steep = (to_y - from_y).abs() > (to_x - from_x).abs();
        let (from_x, from_y, to_x, to_y) = if steep {
            (from_y, from_x, to_y, to_x)
        } else {
            (from_x, from_y, to_x, to_y)
        };

        let dx = (to_x - from_x).abs();
        let dy = (to_y - from_y).abs();
        let mut error = -dx / 2;
        let x_step = if from_x < to_x { 1 } else { -1 };
        let y_step = if from_y < to_y { 1 } else { -1 };

        // 0: dark centre, 1: light ring, 2: dark ring
        let mut state = 0;
        let x_limit = to_x + x_step;
        let mut x = from_x;
        let mut y = from_y;
        while x != x_limit {
            let (real_x, real_y) = if steep { (y, x) } else { (x, y) };
            if (state == 1) == self.image.get_signed(real_x, real_y) {
                if state == 2 {
                    return Some(distance(x, y, from_x, from_y));
                }
                state += 1;
            }
            error += dy;
            if error > 0 {
                if y == to_y {
                    break;
                }
                y += y_step;
                error -= dx;
            }
            x += x_step;
        }
        // Ran off the end while in the last dark run
        if state == 2 {
            return Some(distance(to_x + x_step, to_y, from_x, from_y));
        }
        None
    }

    /// Search a square of `allowance_factor` modules around the estimate
    fn find_alignment_in_region(
        &self,
        module_size: f32,
        est_x: f32,
        est_y: f32,
        allowance_factor: f32,
        hints: &DecodeHints,
    ) -> Result<Pattern> {
        let allowance = (allowance_factor * module_size) as i64;
        let (est_x, est_y) = (est_x as i64, est_y as i64);
        let max_x = self.image.width() as i64 - 1;
        let max_y = self.image.height() as i64 - 1;

        let left = (est_x - allowance).max(0);
        let right = (est_x + allowance).min(max_x);
        if ((right - left) as f32) < module_size * 3.0 {
            return Err(QrError::NotFound);
        }
        let top = (est_y - allowance).max(0);
        let bottom = (est_y + allowance).min(max_y);
        if ((bottom - top) as f32) < module_size * 3.0 {
            return Err(QrError::NotFound);
        }

        AlignmentPatternFinder::new(
            self.image,
            hints,
            left as usize,
            top as usize,
            (right - left) as usize,
            (bottom - top) as usize,
            module_size,
        )
        .find()
    }
}

fn distance(ax: i32, ay: i32, bx: i32, by: i32) -> f32 {
    let dx = (ax - bx) as f32;
    let dy = (ay - by) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Symbol dimension from the finder spacing, snapped to 4k + 1
fn compute_dimension(top_left: &Pattern, top_right: &Pattern, bottom_left: &Pattern, module_size: f32) -> Result<usize> {
    let tltr = (top_left.center.distance(&top_right.center) / module_size).round() as i64;
    let tlbl = (top_left.center.distance(&bottom_left.center) / module_size).round() as i64;
    let dimension = (tltr + tlbl) / 2 + 7;
    let dimension = match dimension & 0x03 {
        0 => dimension + 1,
        2 => dimension - 1,
        3 => {
            return Err(QrError::format(format!(
                "estimated dimension {dimension} is not 4k + 1"
            )));
        }
        _ => dimension,
    };
    usize::try_from(dimension).map_err(|_| QrError::NotFound)
}

/// Map module space onto the image: finder centres sit 3.5 modules in from
/// their corners, the alignment centre 6.5 from the bottom-right one
fn create_transform(
    top_left: &Pattern,
    top_right: &Pattern,
    bottom_left: &Pattern,
    alignment: Option<&Pattern>,
    dimension: usize,
) -> PerspectiveTransform {
    let dim_minus_three = dimension as f32 - 3.5;
    let (bottom_right, source_bottom_right) = match alignment {
        Some(pattern) => (pattern.center, dim_minus_three - 3.0),
        None => (
            Point::new(
                top_right.x() - top_left.x() + bottom_left.x(),
                top_right.y() - top_left.y() + bottom_left.y(),
            ),
            dim_minus_three,
        ),
    };

    PerspectiveTransform::quadrilateral_to_quadrilateral(
        [
            Point::new(3.5, 3.5),
            Point::new(dim_minus_three, 3.5),
            Point::new(source_bottom_right, source_bottom_right),
            Point::new(3.5, dim_minus_three),
        ],
        [top_left.center, top_right.center, bottom_right, bottom_left.center],
    )
}
