//! Morphological noise filtering of band masks
//!
//! A closing (dilation then erosion) with an elliptical structuring element
//! fills gaps and pockets smaller than the element. The element is laid out
//! exactly like OpenCV's `MORPH_ELLIPSE`, anchored at its center.

use log::debug;

use crate::coordinate::LinearUnit;
use crate::raster::BinaryMask;

/// Elliptical structuring element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    width: usize,
    height: usize,
    anchor: (usize, usize),
    cells: Vec<bool>,
}

impl StructuringElement {
    /// Ellipse inscribed in a `width × height` box
    pub fn ellipse(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let r = (height / 2) as i64;
        let c = (width / 2) as i64;
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

        let mut cells = vec![false; width * height];
        for i in 0..height as i64 {
            let dy = i - r;
            if dy.abs() > r {
                continue;
            }
            let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round_ties_even() as i64;
            let start = (c - dx).max(0) as usize;
            let end = (c + dx + 1).min(width as i64) as usize;
            for j in start..end {
                cells[i as usize * width + j] = true;
            }
        }

        StructuringElement { width, height, anchor: (r as usize, c as usize), cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.cells[row * self.width + col]
    }

    /// `(dr, dc)` offsets of the active cells relative to the anchor
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let (ar, ac) = (self.anchor.0 as isize, self.anchor.1 as isize);
        let mut offsets = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                if self.cells[row * self.width + col] {
                    offsets.push((row as isize - ar, col as isize - ac));
                }
            }
        }
        offsets
    }

    /// Active cells as one column span per element row
    ///
    /// Every row of an ellipse is contiguous, so a span fully describes it.
    pub fn spans(&self) -> Vec<Span> {
        let (ar, ac) = (self.anchor.0 as isize, self.anchor.1 as isize);
        (0..self.height)
            .filter_map(|row| {
                let active = |col: &usize| self.cells[row * self.width + col];
                let first = (0..self.width).find(active)?;
                let last = (0..self.width).rev().find(active)?;
                Some(Span { dr: row as isize - ar, first: first as isize - ac, last: last as isize - ac })
            })
            .collect()
    }
}

/// Columns `first..=last` of element row `dr`, relative to the anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub dr: isize,
    pub first: isize,
    pub last: isize,
}

/// Closing filter; `None` element means identity
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseFilter {
    element: Option<StructuringElement>,
}

impl NoiseFilter {
    /// Filter that leaves masks untouched
    pub fn identity() -> Self {
        NoiseFilter { element: None }
    }

    /// Filter sized in metres
    ///
    /// # Arguments
    /// * `size_m` - Noise size in metres; `<= 0` disables filtering
    /// * `resolution` - Pixel size `(x, y)` in the CRS's linear unit
    /// * `unit` - Linear unit of the grid's CRS
    ///
    /// The half-extents of the ellipse are `round(size / resolution)` on
    /// each axis after converting the size into the CRS's unit.
    pub fn from_physical(size_m: f64, resolution: (f64, f64), unit: LinearUnit) -> Self {
        if size_m.is_nan() || size_m <= 0.0 {
            return Self::identity();
        }

        let size = unit.from_metres(size_m);
        let half_extent = |res: f64| {
            if res > 0.0 && res.is_finite() {
                (size / res).round().max(0.0) as usize
            } else {
                0
            }
        };
        let (hx, hy) = (half_extent(resolution.0), half_extent(resolution.1));
        debug!("Noise filter of {} m is {} {}, half-extents {}x{} px", size_m, size, unit.name(), hx, hy);

        if hx == 0 && hy == 0 {
            return Self::identity();
        }
        NoiseFilter { element: Some(StructuringElement::ellipse(2 * hx + 1, 2 * hy + 1)) }
    }

    /// Filter with a `k × k` ellipse given directly in pixels; `k <= 0` disables
    pub fn from_kernel_pixels(kernel_size: i64) -> Self {
        if kernel_size <= 0 {
            return Self::identity();
        }
        let k = kernel_size as usize;
        NoiseFilter { element: Some(StructuringElement::ellipse(k, k)) }
    }

    pub fn is_identity(&self) -> bool {
        self.element.is_none()
    }

    pub fn element(&self) -> Option<&StructuringElement> {
        self.element.as_ref()
    }

    /// Applies the closing
    pub fn apply(&self, mask: &BinaryMask) -> BinaryMask {
        match &self.element {
            None => mask.clone(),
            Some(element) => {
                let spans = element.spans();
                erode(&dilate(mask, &spans), &spans)
            },
        }
    }
}

/// Running counts of one mask row; `counts[c]` is the number of set cells before `c`
struct RowCounts {
    counts: Vec<u32>,
}

impl RowCounts {
    fn new(cols: usize) -> Self {
        RowCounts { counts: Vec::with_capacity(cols + 1) }
    }

    fn load(&mut self, mask: &BinaryMask, row: usize) {
        self.counts.clear();
        self.counts.push(0);
        let mut total = 0;
        for col in 0..mask.cols() {
            total += mask.get(row, col) as u32;
            self.counts.push(total);
        }
    }

    fn total(&self) -> u32 {
        self.counts.last().copied().unwrap_or(0)
    }

    /// `(set cells, cells)` of the window `col + first ..= col + last`, clipped to the row
    fn window(&self, col: usize, span: &Span) -> (u32, u32) {
        let cols = (self.counts.len() - 1) as isize;
        let start = (col as isize + span.first).clamp(0, cols) as usize;
        let end = (col as isize + span.last + 1).clamp(0, cols) as usize;
        if end <= start {
            return (0, 0);
        }
        (self.counts[end] - self.counts[start], (end - start) as u32)
    }
}

/// Output row that source row `source` feeds through element row `dr`
fn target_row(source: usize, dr: isize, rows: usize) -> Option<usize> {
    let target = source as isize - dr;
    (target >= 0 && target < rows as isize).then_some(target as usize)
}

/// Dilation; cells outside the mask never contribute
///
/// Each source row is summed once and then tested against every span in
/// constant time per cell.
fn dilate(mask: &BinaryMask, spans: &[Span]) -> BinaryMask {
    let (rows, cols) = (mask.rows(), mask.cols());
    let mut out = BinaryMask::new(rows, cols);
    let mut counts = RowCounts::new(cols);

    for source in 0..rows {
        counts.load(mask, source);
        if counts.total() == 0 {
            continue;
        }
        for span in spans {
            let Some(target) = target_row(source, span.dr, rows) else { continue };
            for col in 0..cols {
                if !out.get(target, col) && counts.window(col, span).0 > 0 {
                    out.set(target, col, true);
                }
            }
        }
    }
    out
}

/// Erosion; cells outside the mask count as foreground
fn erode(mask: &BinaryMask, spans: &[Span]) -> BinaryMask {
    let (rows, cols) = (mask.rows(), mask.cols());
    let mut out = BinaryMask::filled(rows, cols);
    let mut counts = RowCounts::new(cols);

    for source in 0..rows {
        counts.load(mask, source);
        if counts.total() as usize == cols {
            continue;
        }
        for span in spans {
            let Some(target) = target_row(source, span.dr, rows) else { continue };
            for col in 0..cols {
                if out.get(target, col) {
                    let (set, len) = counts.window(col, span);
                    if set < len {
                        out.set(target, col, false);
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Closing by scanning every element offset per cell
    fn closing_by_offsets(mask: &BinaryMask, element: &StructuringElement) -> BinaryMask {
        let offsets = element.offsets();
        let (rows, cols) = (mask.rows() as isize, mask.cols() as isize);
        let inside = |r: isize, c: isize| r >= 0 && r < rows && c >= 0 && c < cols;

        let mut dilated = BinaryMask::new(mask.rows(), mask.cols());
        for row in 0..rows {
            for col in 0..cols {
                let hit = offsets.iter().any(|&(dr, dc)| {
                    let (r, c) = (row + dr, col + dc);
                    inside(r, c) && mask.get(r as usize, c as usize)
                });
                dilated.set(row as usize, col as usize, hit);
            }
        }

        let mut closed = BinaryMask::new(mask.rows(), mask.cols());
        for row in 0..rows {
            for col in 0..cols {
                let keep = offsets.iter().all(|&(dr, dc)| {
                    let (r, c) = (row + dr, col + dc);
                    !inside(r, c) || dilated.get(r as usize, c as usize)
                });
                closed.set(row as usize, col as usize, keep);
            }
        }
        closed
    }

    /// Deterministic xorshift mask with roughly `density` percent foreground
    fn random_mask(rows: usize, cols: usize, density: u64, seed: &mut u64) -> BinaryMask {
        let mut mask = BinaryMask::new(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                *seed ^= *seed << 13;
                *seed ^= *seed >> 7;
                *seed ^= *seed << 17;
                mask.set(row, col, *seed % 100 < density);
            }
        }
        mask
    }

    #[test]
    fn test_ellipse_matches_opencv_layout() {
        let element = StructuringElement::ellipse(5, 5);
        let rows: Vec<String> = (0..5)
            .map(|r| (0..5).map(|c| if element.contains(r, c) { '#' } else { '.' }).collect())
            .collect();
        assert_eq!(rows, vec!["..#..", "#####", "#####", "#####", "..#.."]);
    }

    #[test]
    fn test_three_by_three_is_a_cross() {
        let element = StructuringElement::ellipse(3, 3);
        assert_eq!(element.offsets().len(), 5);
        assert!(!element.contains(0, 0));
    }

    #[test]
    fn test_spans_cover_the_offsets() {
        for (w, h) in [(1, 1), (3, 3), (5, 9), (15, 15), (81, 81)] {
            let element = StructuringElement::ellipse(w, h);
            let mut from_spans: Vec<(isize, isize)> = element
                .spans()
                .iter()
                .flat_map(|s| (s.first..=s.last).map(move |dc| (s.dr, dc)))
                .collect();
            from_spans.sort();
            let mut offsets = element.offsets();
            offsets.sort();
            assert_eq!(from_spans, offsets, "{}x{}", w, h);
        }
    }

    #[test]
    fn test_closing_matches_offset_scan_on_random_masks() {
        let mut seed = 0x9E37_79B9_7F4A_7C15u64;
        for case in 0..200 {
            let rows = 4 + case % 17;
            let cols = 3 + (case * 7) % 19;
            let density = 20 + (case as u64 * 13) % 70;
            let mask = random_mask(rows, cols, density, &mut seed);
            let (w, h) = (1 + 2 * (case % 4), 1 + 2 * ((case / 4) % 4));
            let element = StructuringElement::ellipse(w, h);
            let filter = NoiseFilter { element: Some(element.clone()) };

            assert_eq!(filter.apply(&mask), closing_by_offsets(&mask, &element), "case {} ({}x{} element)", case, w, h);
        }
    }

    #[test]
    fn test_zero_size_is_identity() {
        let mask = BinaryMask::from_rows(&["#.#", ".#.", "#.#"]);
        let filter = NoiseFilter::from_physical(0.0, (1.0, 1.0), LinearUnit::Metre);
        assert!(filter.is_identity());
        assert_eq!(filter.apply(&mask), mask);
        assert_eq!(NoiseFilter::from_kernel_pixels(0).apply(&mask), mask);
    }

    #[test]
    fn test_closing_fills_small_gap() {
        let mask = BinaryMask::from_rows(&[
            "#######",
            "#######",
            "###.###",
            "#######",
            "#######",
        ]);
        let closed = NoiseFilter::from_kernel_pixels(3).apply(&mask);
        assert!(closed.get(2, 3));
        assert_eq!(closed.count(), 35);
    }

    #[test]
    fn test_closing_keeps_isolated_region_shape() {
        let mask = BinaryMask::from_rows(&[
            ".......",
            ".......",
            "..###..",
            "..###..",
            "..###..",
            ".......",
            ".......",
        ]);
        let closed = NoiseFilter::from_kernel_pixels(3).apply(&mask);
        assert_eq!(closed, mask);
    }

    #[test]
    fn test_physical_size_uses_resolution() {
        let filter = NoiseFilter::from_physical(2.0, (1.0, 0.5), LinearUnit::Metre);
        let element = filter.element().unwrap();
        assert_eq!((element.width(), element.height()), (5, 9));
    }

    #[test]
    fn test_feet_enlarge_the_element() {
        let metres = NoiseFilter::from_physical(2.0, (1.0, 1.0), LinearUnit::Metre);
        let feet = NoiseFilter::from_physical(2.0, (1.0, 1.0), LinearUnit::UsSurveyFoot);
        assert_eq!(metres.element().unwrap().width(), 5);
        // 2 m is about 6.56 US survey feet
        assert_eq!(feet.element().unwrap().width(), 15);
    }
}
