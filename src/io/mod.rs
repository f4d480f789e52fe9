//! Low-level input: seekable sources and endian-aware number decoding

pub mod byte_order;
pub mod seekable;
