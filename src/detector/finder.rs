//! Finder pattern search: scan rows for the 1:1:3:1:1 dark/light signature,
//! confirm each hit vertically, horizontally and diagonally, and pick the
//! three centres that best form a right isosceles triangle.

use log::{debug, trace};

use crate::config::DecodeHints;
use crate::error::{QrError, Result};
use crate::models::point::order_best_patterns;
use crate::models::{BitMatrix, Pattern};

const CENTER_QUORUM: usize = 2;
/// Minimum rows between scans
const MIN_SKIP: usize = 3;
/// Sets the row-skip density only: rows are skipped
/// `3 * height / (4 * MAX_MODULES)` at a time
const MAX_MODULES: usize = 97;

/// The three finder patterns of one symbol, labelled by corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderPatternInfo {
    /// Finder below the top-left one, in symbol orientation
    pub bottom_left: Pattern,
    /// Finder at the right angle
    pub top_left: Pattern,
    /// Finder to the right of the top-left one
    pub top_right: Pattern,
}

impl FinderPatternInfo {
    /// Label three patterns by their geometry
    pub fn from_patterns(patterns: [Pattern; 3]) -> Self {
        let [bottom_left, top_left, top_right] = order_best_patterns(patterns, |p| p.center);
        Self {
            bottom_left,
            top_left,
            top_right,
        }
    }
}

/// Total of a run-length state
#[inline]
fn total(state_count: &[usize]) -> usize {
    state_count.iter().sum()
}

/// Whether five run lengths are close enough to 1:1:3:1:1, within
/// `module_size / divisor` per module
fn ratios_match(state_count: &[usize; 5], divisor: f32) -> bool {
    if state_count.contains(&0) {
        return false;
    }
    let total_size = total(state_count);
    if total_size < 7 {
        return false;
    }
    let module_size = total_size as f32 / 7.0;
    let max_variance = module_size / divisor;
    (module_size - state_count[0] as f32).abs() < max_variance
        && (module_size - state_count[1] as f32).abs() < max_variance
        && (3.0 * module_size - state_count[2] as f32).abs() < 3.0 * max_variance
        && (module_size - state_count[3] as f32).abs() < max_variance
        && (module_size - state_count[4] as f32).abs() < max_variance
}

/// 1:1:3:1:1 within half a module per run
pub(crate) fn found_pattern_cross(state_count: &[usize; 5]) -> bool {
    ratios_match(state_count, 2.0)
}

/// Looser check used along the diagonal, where runs are stretched by sqrt(2)
fn found_pattern_diagonal(state_count: &[usize; 5]) -> bool {
    ratios_match(state_count, 1.333)
}

/// Centre of the middle run, given the column just past the last run
fn center_from_end(state_count: &[usize; 5], end: usize) -> f32 {
    (end - state_count[4] - state_count[3]) as f32 - state_count[2] as f32 / 2.0
}

/// Drop the first dark/light pair so the last three runs can start a new match
fn shift_counts2(state_count: &mut [usize; 5]) {
    state_count[0] = state_count[2];
    state_count[1] = state_count[3];
    state_count[2] = state_count[4];
    state_count[3] = 1;
    state_count[4] = 0;
}

/// Row scanner for finder patterns over a binarized image
pub struct FinderPatternFinder<'a> {
    image: &'a BitMatrix,
    hints: &'a DecodeHints,
    possible_centers: Vec<Pattern>,
    has_skipped: bool,
}

impl<'a> FinderPatternFinder<'a> {
    /// Finder over the whole image; `hints` control scan density and callbacks
    pub fn new(image: &'a BitMatrix, hints: &'a DecodeHints) -> Self {
        Self {
            image,
            hints,
            possible_centers: Vec::new(),
            has_skipped: false,
        }
    }

    /// Candidates collected so far
    pub fn possible_centers(&self) -> &[Pattern] {
        &self.possible_centers
    }

    /// Scan the image and return the best three finder patterns
    pub fn find(&mut self) -> Result<FinderPatternInfo> {
        let max_i = self.image.height();
        let max_j = self.image.width();

        // Skip rows proportionally to the image height; a version 1 symbol
        // filling the frame still gets several scans per finder
        let mut i_skip = (3 * max_i) / (4 * MAX_MODULES);
        if i_skip < MIN_SKIP || self.hints.try_harder {
            i_skip = MIN_SKIP;
        }

        let mut done = false;
        let mut state_count = [0usize; 5];
        let mut i = i_skip - 1;
        while i < max_i && !done {
            state_count = [0; 5];
            let mut current_state = 0;
            let mut j = 0;
            while j < max_j {
                if self.image.get(j, i) {
                    // Dark pixel
                    if current_state & 1 == 1 {
                        current_state += 1;
                    }
                    state_count[current_state] += 1;
                } else if current_state & 1 == 0 {
                    // Light pixel ending a dark run
                    if current_state == 4 {
                        if found_pattern_cross(&state_count) {
                            if self.handle_possible_center(&state_count, i, j) {
                                i_skip = 2;
                                if self.has_skipped {
                                    done = self.have_multiply_confirmed_centers();
                                } else {
                                    let row_skip = self.find_row_skip();
                                    if row_skip > state_count[2] {
                                        // Jump to just above where the third pattern should start
                                        i = (i + row_skip - state_count[2]).saturating_sub(i_skip);
                                        j = max_j - 1;
                                    }
                                }
                            } else {
                                shift_counts2(&mut state_count);
                                current_state = 3;
                                j += 1;
                                continue;
                            }
                            current_state = 0;
                            state_count = [0; 5];
                        } else {
                            shift_counts2(&mut state_count);
                            current_state = 3;
                        }
                    } else {
                        current_state += 1;
                        state_count[current_state] += 1;
                    }
                } else {
                    state_count[current_state] += 1;
                }
                j += 1;
            }

            if found_pattern_cross(&state_count)
                && self.handle_possible_center(&state_count, i, max_j)
            {
                i_skip = state_count[0];
                if self.has_skipped {
                    done = self.have_multiply_confirmed_centers();
                }
            }
            i += i_skip.max(1);
        }

        debug!("finder scan found {} candidate centres", self.possible_centers.len());
        let best = self.select_best_patterns()?;
        Ok(FinderPatternInfo::from_patterns(best))
    }

    /// Vertical run lengths through column `center_j` around row `start_i`;
    /// the refined row centre if they match
    fn cross_check_vertical(
        &self,
        start_i: usize,
        center_j: usize,
        max_count: usize,
        original_total: usize,
    ) -> Option<f32> {
        let image = self.image;
        let max_i = image.height();
        let mut state_count = [0usize; 5];

        // Up from the centre
        let mut i = start_i as isize;
        while i >= 0 && image.get(center_j, i as usize) {
            state_count[2] += 1;
            i -= 1;
        }
        if i < 0 {
            return None;
        }
        while i >= 0 && !image.get(center_j, i as usize) && state_count[1] <= max_count {
            state_count[1] += 1;
            i -= 1;
        }
        if i < 0 || state_count[1] > max_count {
            return None;
        }
        while i >= 0 && image.get(center_j, i as usize) && state_count[0] <= max_count {
            state_count[0] += 1;
            i -= 1;
        }
        if state_count[0] > max_count {
            return None;
        }

        // Down from the centre
        let mut i = start_i + 1;
        while i < max_i && image.get(center_j, i) {
            state_count[2] += 1;
            i += 1;
        }
        if i == max_i {
            return None;
        }
        while i < max_i && !image.get(center_j, i) && state_count[3] < max_count {
            state_count[3] += 1;
            i += 1;
        }
        if i == max_i || state_count[3] >= max_count {
            return None;
        }
        while i < max_i && image.get(center_j, i) && state_count[4] < max_count {
            state_count[4] += 1;
            i += 1;
        }
        if state_count[4] >= max_count {
            return None;
        }

        // Reject if the vertical extent differs from the horizontal one by 40% or more
        let state_total = total(&state_count);
        if 5 * state_total.abs_diff(original_total) >= 2 * original_total {
            return None;
        }
        found_pattern_cross(&state_count).then(|| center_from_end(&state_count, i))
    }

    /// Same as [`Self::cross_check_vertical`] along row `center_i`
    fn cross_check_horizontal(
        &self,
        start_j: usize,
        center_i: usize,
        max_count: usize,
        original_total: usize,
    ) -> Option<f32> {
        let image = self.image;
        let max_j = image.width();
        let mut state_count = [0usize; 5];

        let mut j = start_j as isize;
        while j >= 0 && image.get(j as usize, center_i) {
            state_count[2] += 1;
            j -= 1;
        }
        if j < 0 {
            return None;
        }
        while j >= 0 && !image.get(j as usize, center_i) && state_count[1] <= max_count {
            state_count[1] += 1;
            j -= 1;
        }
        if j < 0 || state_count[1] > max_count {
            return None;
        }
        while j >= 0 && image.get(j as usize, center_i) && state_count[0] <= max_count {
            state_count[0] += 1;
            j -= 1;
        }
        if state_count[0] > max_count {
            return None;
        }

        let mut j = start_j + 1;
        while j < max_j && image.get(j, center_i) {
            state_count[2] += 1;
            j += 1;
        }
        if j == max_j {
            return None;
        }
        while j < max_j && !image.get(j, center_i) && state_count[3] < max_count {
            state_count[3] += 1;
            j += 1;
        }
        if j == max_j || state_count[3] >= max_count {
            return None;
        }
        while j < max_j && image.get(j, center_i) && state_count[4] < max_count {
            state_count[4] += 1;
            j += 1;
        }
        if state_count[4] >= max_count {
            return None;
        }

        let state_total = total(&state_count);
        if 5 * state_total.abs_diff(original_total) >= original_total {
            return None;
        }
        found_pattern_cross(&state_count).then(|| center_from_end(&state_count, j))
    }

    /// Whether the down-right diagonal through the centre also shows 1:1:3:1:1
    fn cross_check_diagonal(&self, center_i: usize, center_j: usize) -> bool {
        let image = self.image;
        let mut state_count = [0usize; 5];

        // Up and to the left
        let mut i = 0;
        while center_i >= i && center_j >= i && image.get(center_j - i, center_i - i) {
            state_count[2] += 1;
            i += 1;
        }
        if state_count[2] == 0 {
            return false;
        }
        while center_i >= i && center_j >= i && !image.get(center_j - i, center_i - i) {
            state_count[1] += 1;
            i += 1;
        }
        if state_count[1] == 0 {
            return false;
        }
        while center_i >= i && center_j >= i && image.get(center_j - i, center_i - i) {
            state_count[0] += 1;
            i += 1;
        }
        if state_count[0] == 0 {
            return false;
        }

        // Down and to the right
        let max_i = image.height();
        let max_j = image.width();
        let mut i = 1;
        while center_i + i < max_i && center_j + i < max_j && image.get(center_j + i, center_i + i)
        {
            state_count[2] += 1;
            i += 1;
        }
        while center_i + i < max_i
            && center_j + i < max_j
            && !image.get(center_j + i, center_i + i)
        {
            state_count[3] += 1;
            i += 1;
        }
        if state_count[3] == 0 {
            return false;
        }
        while center_i + i < max_i && center_j + i < max_j && image.get(center_j + i, center_i + i)
        {
            state_count[4] += 1;
            i += 1;
        }
        if state_count[4] == 0 {
            return false;
        }

        found_pattern_diagonal(&state_count)
    }

    /// Confirm a row hit and fold it into the candidate list.
    ///
    /// Returns whether the hit was confirmed in every direction.
    fn handle_possible_center(&mut self, state_count: &[usize; 5], i: usize, j: usize) -> bool {
        let state_total = total(state_count);
        let center_j = center_from_end(state_count, j);
        let Some(center_i) =
            self.cross_check_vertical(i, center_j as usize, state_count[2], state_total)
        else {
            return false;
        };
        // Re-cross-check horizontally through the refined row
        let Some(center_j) = self.cross_check_horizontal(
            center_j as usize,
            center_i as usize,
            state_count[2],
            state_total,
        ) else {
            return false;
        };
        if !self.cross_check_diagonal(center_i as usize, center_j as usize) {
            return false;
        }

        let estimated_module_size = state_total as f32 / 7.0;
        match self
            .possible_centers
            .iter()
            .position(|c| c.about_equals(estimated_module_size, center_i, center_j))
        {
            Some(index) => {
                let combined = self.possible_centers[index].combine_estimate(
                    center_i,
                    center_j,
                    estimated_module_size,
                );
                self.possible_centers[index] = combined;
            }
            None => {
                let pattern = Pattern::finder(center_j, center_i, estimated_module_size);
                trace!("new finder candidate at ({center_j:.1}, {center_i:.1})");
                self.possible_centers.push(pattern);
                self.hints.found_point(pattern.center);
            }
        }
        true
    }

    /// Rows that can be skipped once two patterns are confirmed: the third
    /// one cannot start before half their offset
    fn find_row_skip(&mut self) -> usize {
        if self.possible_centers.len() <= 1 {
            return 0;
        }
        let mut first_confirmed: Option<&Pattern> = None;
        for center in &self.possible_centers {
            if center.count < CENTER_QUORUM {
                continue;
            }
            match first_confirmed {
                None => first_confirmed = Some(center),
                Some(first) => {
                    // Both top patterns or both left ones; the skip is half
                    // the difference of their offsets
                    let dx = (first.x() - center.x()).abs();
                    let dy = (first.y() - center.y()).abs();
                    self.has_skipped = true;
                    return (((dx - dy) / 2.0) as i64).max(0) as usize;
                }
            }
        }
        0
    }

    /// Three or more confirmed centres whose module sizes agree within 5%
    fn have_multiply_confirmed_centers(&self) -> bool {
        let mut confirmed_count = 0;
        let mut total_module_size = 0.0f32;
        for pattern in &self.possible_centers {
            if pattern.count >= CENTER_QUORUM {
                confirmed_count += 1;
                total_module_size += pattern.module_size;
            }
        }
        if confirmed_count < 3 {
            return false;
        }
        let average = total_module_size / self.possible_centers.len() as f32;
        let total_deviation: f32 = self
            .possible_centers
            .iter()
            .map(|p| (p.module_size - average).abs())
            .sum();
        total_deviation <= 0.05 * total_module_size
    }

    /// The triple with similar module sizes closest to a right isosceles triangle
    fn select_best_patterns(&self) -> Result<[Pattern; 3]> {
        let mut candidates: Vec<Pattern> = self
            .possible_centers
            .iter()
            .copied()
            .filter(|p| p.count >= CENTER_QUORUM)
            .collect();
        if candidates.len() < 3 {
            candidates = self.possible_centers.clone();
        }
        if candidates.len() < 3 {
            return Err(QrError::NotFound);
        }
        candidates.sort_by(|a, b| a.module_size.total_cmp(&b.module_size));

        let mut distortion = f64::MAX;
        let mut best = None;
        let size = candidates.len();
        for i in 0..size - 2 {
            let fpi = candidates[i];
            let min_module_size = fpi.module_size;
            for j in i + 1..size - 1 {
                let fpj = candidates[j];
                let squares0 = fpi.center.distance_squared(&fpj.center) as f64;
                for fpk in &candidates[j + 1..] {
                    if fpk.module_size > min_module_size * 1.4 {
                        continue;
                    }
                    let mut sides = [
                        squares0,
                        fpj.center.distance_squared(&fpk.center) as f64,
                        fpi.center.distance_squared(&fpk.center) as f64,
                    ];
                    sides.sort_by(f64::total_cmp);
                    let [a, b, c] = sides;
                    // c = 2a = 2b for a right isosceles triangle
                    let d = (c - 2.0 * b).abs() + (c - 2.0 * a).abs();
                    if d < distortion {
                        distortion = d;
                        best = Some([fpi, fpj, *fpk]);
                    }
                }
            }
        }
        best.ok_or(QrError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Draw a 7x7-module finder with its top-left corner at (x, y)
    fn draw_finder(matrix: &mut BitMatrix, x: usize, y: usize, module: usize) {
        for my in 0..7 {
            for mx in 0..7 {
                let ring = mx.min(my).min(6 - mx).min(6 - my);
                if ring != 1 {
                    for py in 0..module {
                        for px in 0..module {
                            matrix.set(x + mx * module + px, y + my * module + py, true);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_pattern_cross_ratios() {
        assert!(found_pattern_cross(&[3, 3, 9, 3, 3]));
        assert!(found_pattern_cross(&[3, 4, 8, 3, 3]));
        assert!(!found_pattern_cross(&[3, 3, 3, 3, 3]));
        assert!(!found_pattern_cross(&[1, 1, 3, 1, 0]));
        assert!(!found_pattern_cross(&[0, 1, 3, 1, 1]));
    }

    #[test]
    fn test_center_from_end() {
        // Runs 3,3,9,3,3 ending at column 23: centre at 23 - 6 - 4.5
        assert_eq!(center_from_end(&[3, 3, 9, 3, 3], 23), 12.5);
    }

    #[test]
    fn test_three_finders_located_and_ordered() {
        let module = 4;
        let mut matrix = BitMatrix::new(200, 200);
        draw_finder(&mut matrix, 20, 20, module);
        draw_finder(&mut matrix, 140, 20, module);
        draw_finder(&mut matrix, 20, 140, module);

        let hints = DecodeHints::new();
        let info = FinderPatternFinder::new(&matrix, &hints).find().unwrap();
        let centre = 3.5 * module as f32;
        assert!((info.top_left.x() - (20.0 + centre)).abs() < 1.5);
        assert!((info.top_left.y() - (20.0 + centre)).abs() < 1.5);
        assert!((info.top_right.x() - (140.0 + centre)).abs() < 1.5);
        assert!((info.bottom_left.y() - (140.0 + centre)).abs() < 1.5);
        assert!((info.top_left.module_size - module as f32).abs() < 0.5);
    }

    #[test]
    fn test_callback_sees_candidates() {
        let mut matrix = BitMatrix::new(200, 200);
        draw_finder(&mut matrix, 20, 20, 4);
        draw_finder(&mut matrix, 140, 20, 4);
        draw_finder(&mut matrix, 20, 140, 4);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let hints = DecodeHints::new().with_result_point_callback(move |p| {
            if let Ok(mut points) = sink.lock() {
                points.push(p);
            }
        });
        let mut finder = FinderPatternFinder::new(&matrix, &hints);
        finder.find().unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), finder.possible_centers().len());
        assert!(seen.len() >= 3);
    }

    #[test]
    fn test_two_finders_not_enough() {
        let mut matrix = BitMatrix::new(200, 200);
        draw_finder(&mut matrix, 20, 20, 4);
        draw_finder(&mut matrix, 140, 20, 4);
        let hints = DecodeHints::new();
        assert_eq!(
            FinderPatternFinder::new(&matrix, &hints).find(),
            Err(QrError::NotFound)
        );
    }

    #[test]
    fn test_blank_image() {
        let matrix = BitMatrix::new(100, 100);
        let hints = DecodeHints::new().with_try_harder(true);
        assert_eq!(
            FinderPatternFinder::new(&matrix, &hints).find(),
            Err(QrError::NotFound)
        );
    }
}
