//! Border following on binary masks
//!
//! Suzuki & Abe's topological border following through `imageproc`: every
//! outer and hole border is traced with 8-connectivity together with the
//! border that encloses it, giving the full containment tree. Straight runs
//! are compressed to their end points.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use log::trace;

use crate::coordinate::Pixel;
use crate::raster::BinaryMask;

/// A traced border in pixel space, not closed
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Pixel>,
    /// Whether the border separates a region from a hole inside it
    pub is_hole: bool,
}

/// Node of the containment forest; indices point into the forest's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContourNode {
    pub contour_index: usize,
    pub parent: Option<usize>,
    pub first_child: Option<usize>,
    pub next_sibling: Option<usize>,
    pub prev_sibling: Option<usize>,
}

/// Contours with their containment topology
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourForest {
    contours: Vec<Contour>,
    nodes: Vec<ContourNode>,
    first_root: Option<usize>,
    last_root: Option<usize>,
    last_child: Vec<Option<usize>>,
}

impl ContourForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a contour as the last child of `parent` (or the last root)
    ///
    /// # Returns
    /// The index of the new node
    pub fn push(&mut self, contour: Contour, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        let prev_sibling = match parent {
            Some(p) => self.last_child[p],
            None => self.last_root,
        };

        self.contours.push(contour);
        self.nodes.push(ContourNode {
            contour_index: index,
            parent,
            first_child: None,
            next_sibling: None,
            prev_sibling,
        });
        self.last_child.push(None);

        if let Some(prev) = prev_sibling {
            self.nodes[prev].next_sibling = Some(index);
        }
        match parent {
            Some(p) => {
                if self.nodes[p].first_child.is_none() {
                    self.nodes[p].first_child = Some(index);
                }
                self.last_child[p] = Some(index);
            },
            None => {
                if self.first_root.is_none() {
                    self.first_root = Some(index);
                }
                self.last_root = Some(index);
            },
        }

        index
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &ContourNode {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[ContourNode] {
        &self.nodes
    }

    /// Contour of a node
    pub fn contour(&self, index: usize) -> &Contour {
        &self.contours[self.nodes[index].contour_index]
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Root nodes in discovery order
    pub fn roots(&self) -> Siblings<'_> {
        Siblings { forest: self, next: self.first_root }
    }

    /// Direct children of `index` in discovery order
    pub fn children(&self, index: usize) -> Siblings<'_> {
        Siblings { forest: self, next: self.nodes[index].first_child }
    }
}

/// Walks a sibling chain through `next_sibling`
pub struct Siblings<'a> {
    forest: &'a ContourForest,
    next: Option<usize>,
}

impl Iterator for Siblings<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.forest.nodes[current].next_sibling;
        Some(current)
    }
}

/// Mask as an 8-bit image with a one-pixel background frame
///
/// The frame makes regions touching the mask edge trace like any other.
fn framed_image(mask: &BinaryMask) -> GrayImage {
    let mut image = GrayImage::new(mask.cols() as u32 + 2, mask.rows() as u32 + 2);
    for row in 0..mask.rows() {
        for col in 0..mask.cols() {
            if mask.get(row, col) {
                image.put_pixel(col as u32 + 1, row as u32 + 1, Luma([255]));
            }
        }
    }
    image
}

/// Traces every border of `mask`
///
/// An empty mask yields an empty forest. Contours come out in raster-scan
/// discovery order, so a parent always precedes its children.
pub fn trace_contours(mask: &BinaryMask) -> ContourForest {
    let mut forest = ContourForest::new();
    if mask.is_empty() {
        return forest;
    }

    for border in find_contours::<i64>(&framed_image(mask)) {
        let points: Vec<(i64, i64)> = border.points.iter().map(|p| (p.y - 1, p.x - 1)).collect();
        let contour = Contour {
            points: compress_runs(&points).into_iter().map(|(row, col)| Pixel::new(row, col)).collect(),
            is_hole: matches!(border.border_type, BorderType::Hole),
        };
        forest.push(contour, border.parent);
    }

    trace!("Traced {} borders", forest.len());
    forest
}

/// Keeps only the pixels where the chain changes direction
fn compress_runs(points: &[(i64, i64)]) -> Vec<(i64, i64)> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let delta = |a: (i64, i64), b: (i64, i64)| (b.0 - a.0, b.1 - a.1);

    let kept: Vec<(i64, i64)> = (0..n)
        .filter(|&k| {
            let prev = points[(k + n - 1) % n];
            let next = points[(k + 1) % n];
            delta(prev, points[k]) != delta(points[k], next)
        })
        .map(|k| points[k])
        .collect();

    if kept.is_empty() {
        points[..1].to_vec()
    } else {
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use imageproc::region_labelling::{connected_components, Connectivity};

    /// Corner pixels as `(row, col)`, sorted so the tracing start does not matter
    fn corners(contour: &Contour) -> Vec<(i64, i64)> {
        let mut points: Vec<(i64, i64)> = contour.points.iter().map(|p| (p.row, p.col)).collect();
        points.sort();
        points
    }

    fn component_count(image: &GrayImage, connectivity: Connectivity) -> u32 {
        connected_components(image, connectivity, Luma([0u8])).pixels().map(|p| p.0[0]).max().unwrap_or(0)
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let forest = trace_contours(&BinaryMask::new(4, 4));
        assert!(forest.is_empty());
        assert_eq!(forest.roots().count(), 0);
    }

    #[test]
    fn test_square_is_compressed_to_corners() {
        let mask = BinaryMask::from_rows(&[
            ".....",
            ".###.",
            ".###.",
            ".###.",
            ".....",
        ]);
        let forest = trace_contours(&mask);
        assert_eq!(forest.len(), 1);

        let contour = forest.contour(0);
        assert!(!contour.is_hole);
        assert_eq!(corners(contour), vec![(1, 1), (1, 3), (3, 1), (3, 3)]);
    }

    #[test]
    fn test_single_pixel() {
        let forest = trace_contours(&BinaryMask::from_rows(&["...", ".#.", "..."]));
        assert_eq!(forest.len(), 1);
        assert_eq!(corners(forest.contour(0)), vec![(1, 1)]);
    }

    #[test]
    fn test_region_touching_the_edge() {
        let forest = trace_contours(&BinaryMask::from_rows(&["##", "##"]));
        assert_eq!(forest.len(), 1);
        assert_eq!(forest.contour(0).points.len(), 4);
    }

    #[test]
    fn test_hole_is_child_of_outer_border() {
        let mask = BinaryMask::from_rows(&[
            "#####",
            "#...#",
            "#...#",
            "#####",
        ]);
        let forest = trace_contours(&mask);
        assert_eq!(forest.len(), 2);

        let roots: Vec<usize> = forest.roots().collect();
        assert_eq!(roots, vec![0]);
        let children: Vec<usize> = forest.children(0).collect();
        assert_eq!(children, vec![1]);
        assert!(forest.contour(1).is_hole);
        assert_eq!(forest.node(1).parent, Some(0));
    }

    #[test]
    fn test_separate_regions_are_sibling_roots() {
        let mask = BinaryMask::from_rows(&[
            "##..##",
            "##..##",
            "......",
            "..##..",
        ]);
        let forest = trace_contours(&mask);
        let roots: Vec<usize> = forest.roots().collect();
        assert_eq!(roots.len(), 3);
        assert_eq!(forest.node(roots[0]).next_sibling, Some(roots[1]));
        assert_eq!(forest.node(roots[1]).prev_sibling, Some(roots[0]));
        assert!(roots.iter().all(|r| forest.node(*r).parent.is_none()));
    }

    #[test]
    fn test_island_inside_hole_is_grandchild() {
        let mask = BinaryMask::from_rows(&[
            "#######",
            "#.....#",
            "#.###.#",
            "#.###.#",
            "#.###.#",
            "#.....#",
            "#######",
        ]);
        let forest = trace_contours(&mask);
        assert_eq!(forest.len(), 3);

        let hole = forest.children(0).next().unwrap();
        let island = forest.children(hole).next().unwrap();
        assert!(forest.contour(hole).is_hole);
        assert!(!forest.contour(island).is_hole);
        assert_eq!(corners(forest.contour(island)), vec![(2, 2), (2, 4), (4, 2), (4, 4)]);
    }

    #[test]
    fn test_two_holes_share_a_parent() {
        let mask = BinaryMask::from_rows(&[
            "#######",
            "#.###.#",
            "#.###.#",
            "#######",
        ]);
        let forest = trace_contours(&mask);
        assert_eq!(forest.children(0).count(), 2);
    }

    #[test]
    fn test_compress_runs_keeps_turns() {
        let line = [(0, 0), (0, 1), (0, 2), (1, 2), (2, 2), (2, 1), (2, 0), (1, 0)];
        assert_eq!(compress_runs(&line), vec![(0, 0), (0, 2), (2, 2), (2, 0)]);
    }

    #[test]
    fn test_topology_matches_connected_components() {
        let mut seed = 0x2545_F491_4F6C_DD1Du64;
        for case in 0..500 {
            let (rows, cols) = (3 + case % 10, 3 + (case * 7) % 10);
            let density = 30 + (case as u64 * 11) % 51;
            let mut mask = BinaryMask::new(rows, cols);
            for row in 0..rows {
                for col in 0..cols {
                    seed ^= seed << 13;
                    seed ^= seed >> 7;
                    seed ^= seed << 17;
                    mask.set(row, col, seed % 100 < density);
                }
            }

            let forest = trace_contours(&mask);
            let outers = forest.contours().iter().filter(|c| !c.is_hole).count() as u32;
            let holes = forest.contours().iter().filter(|c| c.is_hole).count() as u32;

            let framed = framed_image(&mask);
            let mut background = framed.clone();
            background.pixels_mut().for_each(|p| p.0[0] = 255 - p.0[0]);

            assert_eq!(outers, component_count(&framed, Connectivity::Eight), "case {}", case);
            // The frame joins every open background cell into one component
            assert_eq!(holes + 1, component_count(&background, Connectivity::Four), "case {}", case);

            for (index, node) in forest.nodes().iter().enumerate() {
                match node.parent {
                    None => assert!(!forest.contour(index).is_hole, "case {}", case),
                    Some(parent) => {
                        assert_ne!(forest.contour(index).is_hole, forest.contour(parent).is_hole, "case {}", case)
                    },
                }
            }
        }
    }
}
