//! Input/output edges: errors, constants, images, inputs and the command line

/// Command-line parsing and subcommand execution
pub mod cli;
/// Format constants and tunable defaults
pub mod configuration;
/// Error type shared by every module
pub mod error;
/// Image file decoding and encoding
pub mod image;
/// Resolution of command-line inputs to named image files
pub mod input;
/// Batch progress display
pub mod progress;
