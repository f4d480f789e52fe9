//! Utility modules for common functionality
//!
//! Logging, configuration, progress reporting and output writing shared by
//! the library and the binary.

pub mod config;
pub mod logger;
pub mod output;
pub mod progress;

pub use config::Config;
pub use progress::ProgressTracker;
