//! Compression handling for TIFF files
//!
//! This module implements strategies for handling different compression methods.

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod zstandard;

pub use handler::CompressionHandler;
pub use factory::CompressionFactory;
