//! Binary masks produced per band

/// Row-major boolean grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl BinaryMask {
    /// All-background mask
    pub fn new(rows: usize, cols: usize) -> Self {
        BinaryMask { rows, cols, cells: vec![false; rows * cols] }
    }

    /// All-foreground mask
    pub fn filled(rows: usize, cols: usize) -> Self {
        BinaryMask { rows, cols, cells: vec![true; rows * cols] }
    }

    /// Builds a mask from `rows` string rows where `#` is foreground
    ///
    /// Handy for writing shapes by hand; any other character is background.
    pub fn from_rows(rows: &[&str]) -> Self {
        let cols = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut mask = BinaryMask::new(rows.len(), cols);
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate().take(cols) {
                mask.set(r, c, ch == '#');
            }
        }
        mask
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell value; out-of-range reads are background
    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        self.cells[row * self.cols + col] = value;
    }

    /// Number of foreground cells
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|c| *c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let mask = BinaryMask::from_rows(&["#.", ".#", "##"]);
        assert_eq!((mask.rows(), mask.cols()), (3, 2));
        assert!(mask.get(0, 0));
        assert!(!mask.get(0, 1));
        assert!(!mask.get(5, 5));
        assert_eq!(mask.count(), 4);
    }
}
