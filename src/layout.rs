/// Grid shape and figure size (inches) for a faceted figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPlan {
    pub rows: usize,
    pub cols: usize,
    pub width: f64,
    pub height: f64,
}

impl LayoutPlan {
    /// Fill `preferred_cols` columns first, then add rows.
    ///
    /// `extra_height` is added once to the figure height for legend/title room.
    pub fn new(
        n_panels: usize,
        preferred_cols: usize,
        base_width: f64,
        base_height: f64,
        extra_height: f64,
    ) -> Self {
        let cols = preferred_cols.min(n_panels).max(1);
        let rows = n_panels.div_ceil(cols);
        Self {
            rows,
            cols,
            width: base_width * cols as f64,
            height: base_height * rows as f64 + extra_height,
        }
    }

    /// Row-major grid position of panel `index`.
    pub fn position(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    pub fn is_bottom_row(&self, index: usize) -> bool {
        self.position(index).0 + 1 == self.rows
    }

    pub fn is_first_col(&self, index: usize) -> bool {
        self.position(index).1 == 0
    }

    /// Pixel size at `dpi` pixels per inch.
    pub fn pixels(&self, dpi: u32) -> (u32, u32) {
        let dpi = dpi as f64;
        (
            (self.width * dpi).round() as u32,
            (self.height * dpi).round() as u32,
        )
    }
}
