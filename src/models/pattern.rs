use super::Point;

/// Which locator a [`Pattern`] is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// 7x7 corner finder (1:1:3:1:1)
    Finder,
    /// 5x5 alignment pattern (1:1:1 around its centre)
    Alignment,
}

/// A located finder or alignment pattern centre.
///
/// Values are immutable: a repeated sighting produces a new pattern through
/// [`Pattern::combine_estimate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pattern {
    /// Centre in image coordinates
    pub center: Point,
    /// Estimated module size in pixels
    pub module_size: f32,
    /// Number of scan lines that confirmed this centre
    pub count: usize,
    /// Finder or alignment
    pub kind: PatternKind,
}

impl Pattern {
    /// New finder pattern seen once
    pub fn finder(x: f32, y: f32, module_size: f32) -> Self {
        Self {
            center: Point::new(x, y),
            module_size,
            count: 1,
            kind: PatternKind::Finder,
        }
    }

    /// New alignment pattern
    pub fn alignment(x: f32, y: f32, module_size: f32) -> Self {
        Self {
            center: Point::new(x, y),
            module_size,
            count: 1,
            kind: PatternKind::Alignment,
        }
    }

    /// X coordinate of the centre
    pub fn x(&self) -> f32 {
        self.center.x
    }

    /// Y coordinate of the centre
    pub fn y(&self) -> f32 {
        self.center.y
    }

    /// Whether a sighting at row `i`, column `j` with the given module size
    /// is this same pattern
    pub fn about_equals(&self, module_size: f32, i: f32, j: f32) -> bool {
        if (i - self.center.y).abs() <= module_size && (j - self.center.x).abs() <= module_size {
            let size_diff = (module_size - self.module_size).abs();
            return size_diff <= 1.0 || size_diff <= self.module_size;
        }
        false
    }

    /// Fold a new sighting into this estimate
    pub fn combine_estimate(&self, i: f32, j: f32, new_module_size: f32) -> Self {
        match self.kind {
            PatternKind::Finder => {
                let n = self.count as f32;
                let combined = n + 1.0;
                Self {
                    center: Point::new(
                        (n * self.center.x + j) / combined,
                        (n * self.center.y + i) / combined,
                    ),
                    module_size: (n * self.module_size + new_module_size) / combined,
                    count: self.count + 1,
                    kind: PatternKind::Finder,
                }
            }
            PatternKind::Alignment => Self {
                center: Point::new((self.center.x + j) / 2.0, (self.center.y + i) / 2.0),
                module_size: (self.module_size + new_module_size) / 2.0,
                count: self.count,
                kind: PatternKind::Alignment,
            },
        }
    }
}
