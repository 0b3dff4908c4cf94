//! Two-byte container header: magic, then version.

use thiserror::Error;

use crate::reader::{ContainerReader, OutOfBounds};

/// First byte of every `.risum` container.
pub const MAGIC: u8 = 111;
/// The only container version this build understands.
pub const VERSION: u8 = 0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Invalid magic byte: expected {MAGIC}, found {0}")]
    InvalidMagic(u8),
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic:   u8,
    pub version: u8,
}

impl Header {
    /// Read and validate the two header bytes.  The version byte is not read
    /// when the magic byte is wrong.
    pub fn read(reader: &mut ContainerReader<'_>) -> Result<Self, HeaderError> {
        let magic = reader.read_u8()?;
        if magic != MAGIC {
            return Err(HeaderError::InvalidMagic(magic));
        }
        let version = reader.read_u8()?;
        if version != VERSION {
            return Err(HeaderError::UnsupportedVersion(version));
        }
        Ok(Self { magic, version })
    }
}
