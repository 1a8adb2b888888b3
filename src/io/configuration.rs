//! Format constants and runtime configuration defaults

// Container format
/// Leading bytes of every container
pub const MAGIC: [u8; 4] = *b"CHPK";
/// Container layout revision written and accepted by this codec
pub const FORMAT_VERSION: u32 = 1;
/// File extension used for containers
pub const CONTAINER_EXTENSION: &str = "chpk";

// Difference detection defaults
/// Edge length of the square cells scanned by the differencer
pub const DEFAULT_BLOCK_SIZE: u32 = 16;
/// Per-channel difference a pixel may have before it counts as changed
pub const DEFAULT_DIFF_THRESHOLD: u8 = 0;
/// Euclidean RGB distance threshold (zero disables distance mode)
pub const DEFAULT_COLOR_DISTANCE: f64 = 0.0;
/// Fraction of changed pixels a cell may hold and still count as identical
pub const DEFAULT_TOLERANCE_RATIO: f64 = 0.0;

// Rectangle merging heuristics
/// Minimum shared edge, relative to the shorter side, for adjacent rectangles to merge
pub const MERGE_EDGE_OVERLAP_RATIO: f64 = 0.5;
/// Maximum union area relative to the summed input areas
pub const MERGE_WASTE_LIMIT: f64 = 1.25;

// Compression
/// zlib level used when none is given
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;
/// Highest zlib level accepted
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

// Image edges
/// Extensions recognised when expanding an input directory
pub const SUPPORTED_INPUT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];
/// Extension used for unpacked images when none is requested
pub const DEFAULT_OUTPUT_FORMAT: &str = "png";

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
/// Batches smaller than this run without a progress bar
pub const MIN_PROGRESS_ITEMS: usize = 2;
