//! Point structures for plane and pixel coordinates

/// A point in a coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate (longitude in geographic systems)
    pub x: f64,
    /// Y coordinate (latitude in geographic systems)
    pub y: f64,
}

impl Point {
    /// Create a new 2D point
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Integer pixel index, `row` down and `col` right from the top-left cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pixel {
    pub row: i64,
    pub col: i64,
}

impl Pixel {
    pub fn new(row: i64, col: i64) -> Self {
        Pixel { row, col }
    }
}
