//! Little-endian field reading and writing for the container layout

use crate::io::error::{PackError, Result};
use num_traits::{FromBytes, ToBytes};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Sequential little-endian reader over any byte source
///
/// Running out of input surfaces as [`PackError::TruncatedData`]; any other
/// I/O failure is tagged with the source path.
pub struct ByteReader<R> {
    inner: R,
    position: u64,
    origin: PathBuf,
}

impl<R: Read> ByteReader<R> {
    /// Wrap an in-memory or streaming source
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            position: 0,
            origin: PathBuf::from("<memory>"),
        }
    }

    /// Attach the path the bytes come from, for error messages
    #[must_use]
    pub fn with_origin(mut self, path: &Path) -> Self {
        self.origin = path.to_path_buf();
        self
    }

    /// Bytes consumed so far
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Read one little-endian integer
    ///
    /// # Errors
    ///
    /// Returns [`PackError::TruncatedData`] if the input ends first
    pub fn read_le<T>(&mut self, context: &'static str) -> Result<T>
    where
        T: FromBytes,
        T::Bytes: Default,
    {
        let mut bytes = T::Bytes::default();
        self.fill(bytes.as_mut(), context)?;
        Ok(T::from_le_bytes(&bytes))
    }

    /// Read a `u32` length field as `usize`
    ///
    /// # Errors
    ///
    /// Returns [`PackError::TruncatedData`] if the input ends first
    pub fn read_len(&mut self, context: &'static str) -> Result<usize> {
        Ok(self.read_le::<u32>(context)? as usize)
    }

    /// Read exactly `len` bytes
    ///
    /// The buffer grows with the data actually read, so a corrupt length
    /// cannot trigger a huge up-front allocation.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::TruncatedData`] if fewer than `len` bytes remain
    pub fn read_bytes(&mut self, len: usize, context: &'static str) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let outcome = (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut buffer);
        let read = outcome.map_err(|source| self.io_error(source))?;
        self.position += read as u64;
        if read < len {
            return Err(PackError::TruncatedData { context });
        }
        Ok(buffer)
    }

    /// Read a length-prefixed UTF-8 string
    ///
    /// # Errors
    ///
    /// Returns [`PackError::TruncatedData`] if the input ends first, or
    /// [`PackError::CorruptData`] if the bytes are not valid UTF-8
    pub fn read_string(&mut self, context: &'static str) -> Result<String> {
        let len = self.read_len(context)?;
        let bytes = self.read_bytes(len, context)?;
        String::from_utf8(bytes).map_err(|e| PackError::CorruptData {
            reason: format!("{context} is not valid UTF-8: {e}"),
        })
    }

    /// Fill `buffer` completely from the source
    ///
    /// # Errors
    ///
    /// Returns [`PackError::TruncatedData`] if the input ends first
    pub fn fill(&mut self, buffer: &mut [u8], context: &'static str) -> Result<()> {
        match self.inner.read_exact(buffer) {
            Ok(()) => {
                self.position += buffer.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(PackError::TruncatedData { context })
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Whether the source has no bytes left
    ///
    /// # Errors
    ///
    /// Returns [`PackError::FileSystem`] if the source cannot be read
    pub fn is_exhausted(&mut self) -> Result<bool> {
        let mut next = [0u8; 1];
        loop {
            match self.inner.read(&mut next) {
                Ok(read) => return Ok(read == 0),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(self.io_error(e)),
            }
        }
    }

    fn io_error(&self, source: std::io::Error) -> PackError {
        PackError::FileSystem {
            path: self.origin.clone(),
            operation: "read",
            source,
        }
    }
}

/// Append-only little-endian writer
#[derive(Default)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    /// Create a writer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Append one little-endian integer
    pub fn put_le<T: ToBytes>(&mut self, value: T) {
        self.buffer.extend_from_slice(value.to_le_bytes().as_ref());
    }

    /// Append a length as a `u32` field
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Overflow`] if `len` does not fit in 32 bits
    pub fn put_len(&mut self, len: usize, field: &'static str) -> Result<()> {
        self.put_le(to_u32(len, field)?);
        Ok(())
    }

    /// Append raw bytes
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Append a length-prefixed UTF-8 string
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Overflow`] if the string is longer than `u32::MAX` bytes
    pub fn put_string(&mut self, value: &str, field: &'static str) -> Result<()> {
        self.put_len(value.len(), field)?;
        self.put_bytes(value.as_bytes());
        Ok(())
    }

    /// Finish writing and take the bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

/// Narrow a size or offset to the container's 32-bit field width
///
/// # Errors
///
/// Returns [`PackError::Overflow`] if the value exceeds `u32::MAX`
pub fn to_u32<T: TryInto<u32>>(value: T, field: &'static str) -> Result<u32> {
    value.try_into().map_err(|_| PackError::Overflow { field })
}
