//! Mask selection penalties (ISO 18004 section 7.8.3)

use super::matrix_util::ModuleGrid;

const N1: u32 = 3;
const N2: u32 = 3;
const N3: u32 = 40;
const N4: u32 = 10;

/// Sum of all four penalty rules
pub fn total_penalty(grid: &ModuleGrid) -> u32 {
    rule1(grid) + rule2(grid) + rule3(grid) + rule4(grid)
}

/// Runs of five or more same-coloured modules in a row or column
pub fn rule1(grid: &ModuleGrid) -> u32 {
    rule1_internal(grid, true) + rule1_internal(grid, false)
}

fn rule1_internal(grid: &ModuleGrid, horizontal: bool) -> u32 {
    let size = grid.size();
    let mut penalty = 0;
    for i in 0..size {
        let mut run = 0;
        let mut previous = None;
        for j in 0..size {
            let dark = if horizontal { grid.is_dark(j, i) } else { grid.is_dark(i, j) };
            if previous == Some(dark) {
                run += 1;
            } else {
                if run >= 5 {
                    penalty += N1 + (run - 5);
                }
                run = 1;
                previous = Some(dark);
            }
        }
        if run >= 5 {
            penalty += N1 + (run - 5);
        }
    }
    penalty
}

/// Every 2x2 block of one colour
pub fn rule2(grid: &ModuleGrid) -> u32 {
    let size = grid.size();
    let mut blocks = 0;
    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let dark = grid.is_dark(x, y);
            if dark == grid.is_dark(x + 1, y)
                && dark == grid.is_dark(x, y + 1)
                && dark == grid.is_dark(x + 1, y + 1)
            {
                blocks += 1;
            }
        }
    }
    N2 * blocks
}

/// 1:1:3:1:1 finder-like runs with four light modules on either side
pub fn rule3(grid: &ModuleGrid) -> u32 {
    let size = grid.size();
    let mut hits = 0;
    for y in 0..size {
        for x in 0..size {
            if x + 6 < size
                && finder_like(|k| grid.is_dark(x + k, y))
                && (is_light_run(grid, x as isize - 4, x as isize, |k| (k, y))
                    || is_light_run(grid, x as isize + 7, x as isize + 11, |k| (k, y)))
            {
                hits += 1;
            }
            if y + 6 < size
                && finder_like(|k| grid.is_dark(x, y + k))
                && (is_light_run(grid, y as isize - 4, y as isize, |k| (x, k))
                    || is_light_run(grid, y as isize + 7, y as isize + 11, |k| (x, k)))
            {
                hits += 1;
            }
        }
    }
    N3 * hits
}

fn finder_like(dark_at: impl Fn(usize) -> bool) -> bool {
    const PATTERN: [bool; 7] = [true, false, true, true, true, false, true];
    PATTERN.iter().enumerate().all(|(k, &dark)| dark_at(k) == dark)
}

/// Whether modules `from..to` along one line are all light; the part outside
/// the symbol counts as light
fn is_light_run(
    grid: &ModuleGrid,
    from: isize,
    to: isize,
    at: impl Fn(usize) -> (usize, usize),
) -> bool {
    let from = from.max(0) as usize;
    let to = to.min(grid.size() as isize).max(0) as usize;
    (from..to).all(|k| {
        let (x, y) = at(k);
        !grid.is_dark(x, y)
    })
}

/// Deviation of the dark share from 50%, per 5% step
pub fn rule4(grid: &ModuleGrid) -> u32 {
    let size = grid.size();
    let total = size * size;
    let dark = (0..size)
        .flat_map(|y| (0..size).map(move |x| (x, y)))
        .filter(|&(x, y)| grid.is_dark(x, y))
        .count();
    let five_percent_variances = (dark * 2).abs_diff(total) * 10 / total;
    N4 * five_percent_variances as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(rows: &[&str]) -> ModuleGrid {
        let mut grid = ModuleGrid::new(rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                grid.set(x, y, c == '#');
            }
        }
        grid
    }

    #[test]
    fn test_rule1_runs() {
        // Each row is one 5-run (3 points); each column alternates
        let grid = grid_from(&["#####", ".....", "#####", ".....", "#####"]);
        assert_eq!(rule1_internal(&grid, true), 15);
        assert_eq!(rule1_internal(&grid, false), 0);
    }

    #[test]
    fn test_rule2_blocks() {
        let grid = grid_from(&["##.", "##.", "..."]);
        assert_eq!(rule2(&grid), N2);
        let grid = grid_from(&["##.", "##.", ".##"]);
        assert_eq!(rule2(&grid), N2);
        let grid = grid_from(&["...", "...", "..."]);
        assert_eq!(rule2(&grid), 4 * N2);
    }

    #[test]
    fn test_rule3_finder_like() {
        let grid = grid_from(&[
            "#.###.#....",
            "...........",
            "...........",
            "...........",
            "...........",
            "...........",
            "...........",
            "...........",
            "...........",
            "...........",
            "...........",
        ]);
        assert_eq!(rule3(&grid), N3);
    }

    #[test]
    fn test_rule4_balance() {
        let half = grid_from(&["#.", ".#"]);
        assert_eq!(rule4(&half), 0);
        let dark = grid_from(&["##", "##"]);
        assert_eq!(rule4(&dark), 100);
    }
}
