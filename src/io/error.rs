//! Error types and context management for pack, unpack and mutation operations

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for all container operations
#[derive(Debug)]
pub enum PackError {
    /// Failed to decode a source image
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image decoding error
        source: image::ImageError,
    },

    /// Failed to encode or save a reconstructed image
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image encoding error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Runtime option validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Pixel data does not describe a valid raster
    InvalidPixelBuffer {
        /// Description of what's wrong with the buffer
        reason: String,
    },

    /// Variant names must be non-empty
    InvalidVariantName {
        /// The rejected name
        name: String,
    },

    /// Two images differ in width or height
    DimensionMismatch {
        /// Dimensions of the reference image (width, height)
        expected: (u32, u32),
        /// Dimensions of the offending image (width, height)
        found: (u32, u32),
    },

    /// Two images differ in channel count
    ChannelMismatch {
        /// Channel count of the reference image
        expected: u8,
        /// Channel count of the offending image
        found: u8,
    },

    /// Input does not start with the container magic bytes
    MagicMismatch {
        /// The first four bytes that were found instead
        found: [u8; 4],
    },

    /// Container version is not understood by this codec
    UnsupportedVersion {
        /// Version field read from the container
        found: u32,
    },

    /// Input ended before a field could be read completely
    TruncatedData {
        /// Field or region being read
        context: &'static str,
    },

    /// Structurally invalid container contents
    CorruptData {
        /// Description of the inconsistency
        reason: String,
    },

    /// A size or offset does not fit the container's 32-bit fields
    Overflow {
        /// Field that overflowed
        field: &'static str,
    },

    /// Byte compression or decompression failed
    Compression {
        /// Either "compress" or "decompress"
        operation: &'static str,
        /// Underlying codec error
        source: std::io::Error,
    },

    /// No variant with this name exists in the container
    VariantNotFound {
        /// The requested name
        name: String,
    },

    /// A variant name is already taken
    DuplicateVariantName {
        /// The colliding name
        name: String,
    },

    /// Removal would leave the container without variants
    CannotRemoveAllVariants,

    /// Nothing to pack
    EmptyInput,
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::InvalidPixelBuffer { reason } => {
                write!(f, "Invalid pixel buffer: {reason}")
            }
            Self::InvalidVariantName { name } => {
                write!(f, "Invalid variant name '{name}': names must be non-empty")
            }
            Self::DimensionMismatch { expected, found } => {
                write!(
                    f,
                    "Image dimensions {}x{} do not match expected {}x{}",
                    found.0, found.1, expected.0, expected.1
                )
            }
            Self::ChannelMismatch { expected, found } => {
                write!(
                    f,
                    "Image has {found} channels but {expected} were expected"
                )
            }
            Self::MagicMismatch { found } => {
                write!(f, "Not a charpack container (magic bytes {found:02x?})")
            }
            Self::UnsupportedVersion { found } => {
                write!(f, "Unsupported container version {found}")
            }
            Self::TruncatedData { context } => {
                write!(f, "Container data ends early while reading {context}")
            }
            Self::CorruptData { reason } => {
                write!(f, "Corrupt container data: {reason}")
            }
            Self::Overflow { field } => {
                write!(f, "Value of '{field}' does not fit in a 32-bit field")
            }
            Self::Compression { operation, source } => {
                write!(f, "Failed to {operation} payload: {source}")
            }
            Self::VariantNotFound { name } => {
                write!(f, "Variant '{name}' not found")
            }
            Self::DuplicateVariantName { name } => {
                write!(f, "Variant '{name}' already exists")
            }
            Self::CannotRemoveAllVariants => {
                write!(f, "Cannot remove every variant from a container")
            }
            Self::EmptyInput => write!(f, "No images to pack"),
        }
    }
}

impl std::error::Error for PackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } | Self::Compression { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for container results
pub type Result<T> = std::result::Result<T, PackError>;

/// Tags raw I/O failures with the operation and path they belong to
pub trait IoContext<T> {
    /// Convert an I/O result into a [`PackError::FileSystem`] result
    ///
    /// # Errors
    ///
    /// Propagates the original I/O error with the operation and path attached
    fn io_context(self, operation: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context(self, operation: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| PackError::FileSystem {
            path: path.to_path_buf(),
            operation,
            source,
        })
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> PackError {
    PackError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a corrupt data error
pub fn corrupt(reason: &impl ToString) -> PackError {
    PackError::CorruptData {
        reason: reason.to_string(),
    }
}
