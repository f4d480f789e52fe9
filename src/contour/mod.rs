//! Border tracing and polygon assembly

pub mod assembler;
pub mod tracer;

pub use assembler::{assemble_polygons, close_ring, is_degenerate, Polygon};
pub use tracer::{trace_contours, Contour, ContourForest, ContourNode};
