//! Alignment pattern search inside a small window around its expected centre.
//!
//! Only the light-dark-light 1:1:1 slice through the middle is matched; the
//! outer dark ring is too easily merged with neighbouring modules to be
//! useful on small symbols.

use log::trace;

use crate::config::DecodeHints;
use crate::error::{QrError, Result};
use crate::models::{BitMatrix, Pattern};

/// Scanner for one alignment pattern in a search window
pub struct AlignmentPatternFinder<'a> {
    image: &'a BitMatrix,
    hints: &'a DecodeHints,
    start_x: usize,
    start_y: usize,
    width: usize,
    height: usize,
    module_size: f32,
    possible_centers: Vec<Pattern>,
}

impl<'a> AlignmentPatternFinder<'a> {
    /// Search window `width` x `height` at (`start_x`, `start_y`), expecting
    /// modules of roughly `module_size` pixels
    pub fn new(
        image: &'a BitMatrix,
        hints: &'a DecodeHints,
        start_x: usize,
        start_y: usize,
        width: usize,
        height: usize,
        module_size: f32,
    ) -> Self {
        Self {
            image,
            hints,
            start_x,
            start_y,
            width,
            height,
            module_size,
            possible_centers: Vec::new(),
        }
    }

    /// Scan rows outward from the middle of the window.
    ///
    /// A centre seen twice wins immediately; otherwise the first one seen is
    /// returned.
    pub fn find(&mut self) -> Result<Pattern> {
        let max_j = self.start_x + self.width;
        let middle_i = self.start_y + self.height / 2;
        for i_gen in 0..self.height {
            // middle, middle+1, middle-1, middle+2, ...
            let offset = (i_gen + 1) / 2;
            let i = if i_gen & 1 == 0 {
                middle_i + offset
            } else {
                match middle_i.checked_sub(offset) {
                    Some(i) => i,
                    None => continue,
                }
            };
            if i >= self.image.height() {
                continue;
            }

            let mut state_count = [0usize; 3];
            let mut j = self.start_x;
            // Starting inside a light run says nothing about its length
            while j < max_j && !self.image.get(j, i) {
                j += 1;
            }
            let mut current_state = 0;
            while j < max_j {
                if self.image.get(j, i) {
                    if current_state == 1 {
                        state_count[1] += 1;
                    } else if current_state == 2 {
                        if self.found_pattern_cross(&state_count) {
                            if let Some(confirmed) = self.handle_possible_center(&state_count, i, j) {
                                return Ok(confirmed);
                            }
                        }
                        state_count[0] = state_count[2];
                        state_count[1] = 1;
                        state_count[2] = 0;
                        current_state = 1;
                    } else {
                        current_state += 1;
                        state_count[current_state] += 1;
                    }
                } else {
                    if current_state == 1 {
                        current_state += 1;
                    }
                    state_count[current_state] += 1;
                }
                j += 1;
            }
            if self.found_pattern_cross(&state_count) {
                if let Some(confirmed) = self.handle_possible_center(&state_count, i, max_j) {
                    return Ok(confirmed);
                }
            }
        }

        self.possible_centers.first().copied().ok_or(QrError::NotFound)
    }

    fn found_pattern_cross(&self, state_count: &[usize; 3]) -> bool {
        let max_variance = self.module_size / 2.0;
        state_count
            .iter()
            .all(|&count| (self.module_size - count as f32).abs() < max_variance)
    }

    /// Vertical light-dark-light counts through column `center_j`
    fn cross_check_vertical(
        &self,
        start_i: usize,
        center_j: usize,
        max_count: usize,
        original_total: usize,
    ) -> Option<f32> {
        let image = self.image;
        let max_i = image.height();
        let mut state_count = [0usize; 3];

        let mut i = start_i as isize;
        while i >= 0 && image.get(center_j, i as usize) && state_count[1] <= max_count {
            state_count[1] += 1;
            i -= 1;
        }
        if i < 0 || state_count[1] > max_count {
            return None;
        }
        while i >= 0 && !image.get(center_j, i as usize) && state_count[0] <= max_count {
            state_count[0] += 1;
            i -= 1;
        }
        if state_count[0] > max_count {
            return None;
        }

        let mut i = start_i + 1;
        while i < max_i && image.get(center_j, i) && state_count[1] <= max_count {
            state_count[1] += 1;
            i += 1;
        }
        if i == max_i || state_count[1] > max_count {
            return None;
        }
        while i < max_i && !image.get(center_j, i) && state_count[2] <= max_count {
            state_count[2] += 1;
            i += 1;
        }
        if state_count[2] > max_count {
            return None;
        }

        let state_total: usize = state_count.iter().sum();
        if 5 * state_total.abs_diff(original_total) >= 2 * original_total {
            return None;
        }
        self.found_pattern_cross(&state_count)
            .then(|| center_from_end(&state_count, i))
    }

    /// Record a candidate; a second sighting of the same centre is returned
    fn handle_possible_center(&mut self, state_count: &[usize; 3], i: usize, j: usize) -> Option<Pattern> {
        let state_total: usize = state_count.iter().sum();
        let center_j = center_from_end(state_count, j);
        let center_i =
            self.cross_check_vertical(i, center_j as usize, 2 * state_count[1], state_total)?;
        let estimated_module_size = state_total as f32 / 3.0;

        if let Some(existing) = self
            .possible_centers
            .iter()
            .find(|c| c.about_equals(estimated_module_size, center_i, center_j))
        {
            return Some(existing.combine_estimate(center_i, center_j, estimated_module_size));
        }
        let pattern = Pattern::alignment(center_j, center_i, estimated_module_size);
        trace!("alignment candidate at ({center_j:.1}, {center_i:.1})");
        self.possible_centers.push(pattern);
        self.hints.found_point(pattern.center);
        None
    }
}

fn center_from_end(state_count: &[usize; 3], end: usize) -> f32 {
    (end - state_count[2]) as f32 - state_count[1] as f32 / 2.0
}
