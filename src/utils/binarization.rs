//! Luminance to black/white conversion.
//!
//! Two strategies are available: a local-threshold binarizer that copes with
//! shadows and gradients, and a cheaper global histogram one used for small
//! frames.

use std::sync::OnceLock;

use log::debug;

use super::luminance::LuminanceSource;
use crate::error::{QrError, Result};
use crate::models::BitMatrix;

const LUMINANCE_BITS: usize = 5;
const LUMINANCE_SHIFT: usize = 8 - LUMINANCE_BITS;
const LUMINANCE_BUCKETS: usize = 1 << LUMINANCE_BITS;

const BLOCK_SIZE_POWER: usize = 3;
const BLOCK_SIZE: usize = 1 << BLOCK_SIZE_POWER;
const BLOCK_SIZE_MASK: usize = BLOCK_SIZE - 1;
const MINIMUM_DIMENSION: usize = BLOCK_SIZE * 5;
const MIN_DYNAMIC_RANGE: u32 = 24;

/// Binarization strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binarizer {
    /// 8x8 block thresholds averaged over a 5x5 block neighbourhood
    #[default]
    Hybrid,
    /// One black point from a histogram of four sampled rows
    GlobalHistogram,
}

impl Binarizer {
    /// Convert the whole source; `true` is black
    pub fn black_matrix(&self, source: &dyn LuminanceSource) -> Result<BitMatrix> {
        let (width, height) = (source.width(), source.height());
        match self {
            Binarizer::Hybrid if width >= MINIMUM_DIMENSION && height >= MINIMUM_DIMENSION => {
                debug!("hybrid binarizer on {width}x{height}");
                Ok(hybrid_matrix(source))
            }
            Binarizer::Hybrid | Binarizer::GlobalHistogram => {
                debug!("global histogram binarizer on {width}x{height}");
                global_histogram_matrix(source)
            }
        }
    }
}

/// A luminance source paired with a binarizer; the black matrix is computed
/// once and cached.
pub struct BinaryBitmap<'a> {
    source: &'a dyn LuminanceSource,
    binarizer: Binarizer,
    matrix: OnceLock<Result<BitMatrix>>,
}

impl<'a> BinaryBitmap<'a> {
    /// Pair `source` with `binarizer`; nothing is computed until asked
    pub fn new(source: &'a dyn LuminanceSource, binarizer: Binarizer) -> Self {
        Self {
            source,
            binarizer,
            matrix: OnceLock::new(),
        }
    }

    /// Source width
    pub fn width(&self) -> usize {
        self.source.width()
    }

    /// Source height
    pub fn height(&self) -> usize {
        self.source.height()
    }

    /// Strategy in use
    pub fn binarizer(&self) -> Binarizer {
        self.binarizer
    }

    /// The binarized image
    pub fn black_matrix(&self) -> Result<&BitMatrix> {
        self.matrix
            .get_or_init(|| self.binarizer.black_matrix(self.source))
            .as_ref()
            .map_err(Clone::clone)
    }
}

fn global_histogram_matrix(source: &dyn LuminanceSource) -> Result<BitMatrix> {
    let (width, height) = (source.width(), source.height());
    let mut buckets = [0u32; LUMINANCE_BUCKETS];

    // Four rows around the centre, skipping the outer fifth on each side
    for y in 1..5 {
        let row = source.row(height * y / 5);
        let right = (width * 4) / 5;
        for &pixel in &row[width / 5..right] {
            buckets[(pixel as usize) >> LUMINANCE_SHIFT] += 1;
        }
    }
    let black_point = estimate_black_point(&buckets)?;

    let luminances = source.matrix();
    let mut matrix = BitMatrix::new(width, height);
    for y in 0..height {
        let offset = y * width;
        for x in 0..width {
            if (luminances[offset + x] as u32) < black_point {
                matrix.set(x, y, true);
            }
        }
    }
    Ok(matrix)
}

/// Valley between the two tallest, well-separated histogram peaks
fn estimate_black_point(buckets: &[u32; LUMINANCE_BUCKETS]) -> Result<u32> {
    let num_buckets = buckets.len();
    let mut max_bucket_count = 0;
    let mut first_peak = 0;
    let mut first_peak_size = 0;
    for (x, &count) in buckets.iter().enumerate() {
        if count > first_peak_size {
            first_peak = x;
            first_peak_size = count;
        }
        max_bucket_count = max_bucket_count.max(count);
    }

    // Second peak: tall and far from the first
    let mut second_peak = 0;
    let mut second_peak_score = 0u64;
    for (x, &count) in buckets.iter().enumerate() {
        let distance = x.abs_diff(first_peak) as u64;
        let score = count as u64 * distance * distance;
        if score > second_peak_score {
            second_peak = x;
            second_peak_score = score;
        }
    }

    // A single populated bucket has no second peak at all
    if second_peak_score == 0 {
        return Err(QrError::NotFound);
    }
    if first_peak > second_peak {
        std::mem::swap(&mut first_peak, &mut second_peak);
    }
    if second_peak - first_peak <= num_buckets / 16 {
        return Err(QrError::NotFound);
    }

    let mut best_valley = second_peak - 1;
    let mut best_valley_score = -1i64;
    for x in (first_peak + 1..second_peak).rev() {
        let from_first = (x - first_peak) as i64;
        let score = from_first
            * from_first
            * (second_peak - x) as i64
            * (max_bucket_count - buckets[x]) as i64;
        if score > best_valley_score {
            best_valley = x;
            best_valley_score = score;
        }
    }
    Ok((best_valley << LUMINANCE_SHIFT) as u32)
}

fn hybrid_matrix(source: &dyn LuminanceSource) -> BitMatrix {
    let (width, height) = (source.width(), source.height());
    let luminances = source.matrix();
    let sub_width = (width >> BLOCK_SIZE_POWER) + usize::from(width & BLOCK_SIZE_MASK != 0);
    let sub_height = (height >> BLOCK_SIZE_POWER) + usize::from(height & BLOCK_SIZE_MASK != 0);

    let black_points = calculate_black_points(&luminances, sub_width, sub_height, width, height);
    let mut matrix = BitMatrix::new(width, height);
    calculate_threshold_for_block(
        &luminances,
        sub_width,
        sub_height,
        width,
        height,
        &black_points,
        &mut matrix,
    );
    matrix
}

/// Per-block black point: the block mean, or for flat blocks a guess
/// biased towards white unless the neighbours say otherwise
fn calculate_black_points(
    luminances: &[u8],
    sub_width: usize,
    sub_height: usize,
    width: usize,
    height: usize,
) -> Vec<Vec<u32>> {
    let max_y_offset = height - BLOCK_SIZE;
    let max_x_offset = width - BLOCK_SIZE;
    let mut black_points = vec![vec![0u32; sub_width]; sub_height];

    for y in 0..sub_height {
        let y_offset = (y << BLOCK_SIZE_POWER).min(max_y_offset);
        for x in 0..sub_width {
            let x_offset = (x << BLOCK_SIZE_POWER).min(max_x_offset);
            let mut sum = 0u32;
            let mut min = 0xFFu32;
            let mut max = 0u32;

            let mut yy = 0;
            while yy < BLOCK_SIZE {
                let offset = (y_offset + yy) * width + x_offset;
                for &pixel in &luminances[offset..offset + BLOCK_SIZE] {
                    let pixel = pixel as u32;
                    sum += pixel;
                    min = min.min(pixel);
                    max = max.max(pixel);
                }
                yy += 1;
                if max - min > MIN_DYNAMIC_RANGE {
                    // Contrast established; only the sum matters from here
                    while yy < BLOCK_SIZE {
                        let offset = (y_offset + yy) * width + x_offset;
                        sum += luminances[offset..offset + BLOCK_SIZE]
                            .iter()
                            .map(|&p| p as u32)
                            .sum::<u32>();
                        yy += 1;
                    }
                }
            }

            let mut average = sum >> (BLOCK_SIZE_POWER * 2);
            if max - min <= MIN_DYNAMIC_RANGE {
                average = min / 2;
                if y > 0 && x > 0 {
                    let neighbour_average = (black_points[y - 1][x]
                        + 2 * black_points[y][x - 1]
                        + black_points[y - 1][x - 1])
                        / 4;
                    if min < neighbour_average {
                        average = neighbour_average;
                    }
                }
            }
            black_points[y][x] = average;
        }
    }
    black_points
}

#[inline]
fn cap(value: usize, max: usize) -> usize {
    if value < 2 { 2 } else { value.min(max) }
}

fn calculate_threshold_for_block(
    luminances: &[u8],
    sub_width: usize,
    sub_height: usize,
    width: usize,
    height: usize,
    black_points: &[Vec<u32>],
    matrix: &mut BitMatrix,
) {
    let max_y_offset = height - BLOCK_SIZE;
    let max_x_offset = width - BLOCK_SIZE;
    for y in 0..sub_height {
        let y_offset = (y << BLOCK_SIZE_POWER).min(max_y_offset);
        let top = cap(y, sub_height - 3);
        for x in 0..sub_width {
            let x_offset = (x << BLOCK_SIZE_POWER).min(max_x_offset);
            let left = cap(x, sub_width - 3);
            let sum: u32 = black_points[top - 2..=top + 2]
                .iter()
                .map(|row| row[left - 2..=left + 2].iter().sum::<u32>())
                .sum();
            let average = sum / 25;
            threshold_block(luminances, x_offset, y_offset, average, width, matrix);
        }
    }
}

fn threshold_block(
    luminances: &[u8],
    x_offset: usize,
    y_offset: usize,
    threshold: u32,
    stride: usize,
    matrix: &mut BitMatrix,
) {
    for y in 0..BLOCK_SIZE {
        let offset = (y_offset + y) * stride + x_offset;
        for x in 0..BLOCK_SIZE {
            if luminances[offset + x] as u32 <= threshold {
                matrix.set(x_offset + x, y_offset + y, true);
            }
        }
    }
}
