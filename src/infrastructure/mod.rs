//! Infrastructure layer - concrete implementations of I/O ports

pub mod output;

pub use output::{FileSystemOutput, OutputWriter};
