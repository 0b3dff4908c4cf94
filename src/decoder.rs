//! Module decoder: one left-to-right pass over a `.risum` buffer.
//!
//! ```text
//! magic (u8 = 111) | version (u8 = 0) | len (u32 LE) | packed metadata
//! { marker (u8) | len (u32 LE) | packed asset }*   marker 0 ends the section
//! ```
//!
//! Asset frames pair positionally with `module.assets`.  The section ends at
//! a `0` marker, at the end of the buffer, or once every descriptor has a
//! frame; bytes after that point are not inspected.  Any error aborts the
//! whole decode and no partial asset list is returned.

use log::{debug, info, warn};
use std::fmt;
use thiserror::Error;

use crate::codec::{Codec, CodecError};
use crate::extension::resolve_filename;
use crate::header::{Header, HeaderError, MAGIC};
use crate::metadata::{MetadataError, ModuleMetadata};
use crate::reader::{ContainerReader, OutOfBounds};

/// Marker that closes the asset section.
pub const FRAME_END: u8 = 0;
/// Marker that introduces a length-prefixed asset payload.
pub const FRAME_ASSET: u8 = 1;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ── Errors ───────────────────────────────────────────────────────────────────

/// Coarse classification of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OutOfBounds,
    InvalidFormat,
    UnsupportedVersion,
    DecompressionError,
    MalformedMetadata,
}

/// Which packed block a decompression failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Metadata,
    Asset(usize),
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Metadata     => f.write_str("metadata block"),
            Block::Asset(index) => write!(f, "asset #{index}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
    #[error("Invalid magic byte: expected {MAGIC}, found {0}")]
    InvalidMagic(u8),
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error("Unknown frame marker {marker} at offset {offset}")]
    UnknownMarker { marker: u8, offset: usize },
    #[error("Failed to decompress {block}: {source}")]
    Decompression {
        block:  Block,
        #[source]
        source: CodecError,
    },
    #[error(transparent)]
    MalformedMetadata(#[from] MetadataError),
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::OutOfBounds(_)         => ErrorKind::OutOfBounds,
            DecodeError::InvalidMagic(_)        => ErrorKind::InvalidFormat,
            DecodeError::UnknownMarker { .. }   => ErrorKind::InvalidFormat,
            DecodeError::UnsupportedVersion(_)  => ErrorKind::UnsupportedVersion,
            DecodeError::Decompression { .. }   => ErrorKind::DecompressionError,
            DecodeError::MalformedMetadata(_)   => ErrorKind::MalformedMetadata,
        }
    }
}

impl From<HeaderError> for DecodeError {
    fn from(e: HeaderError) -> Self {
        match e {
            HeaderError::InvalidMagic(m)       => DecodeError::InvalidMagic(m),
            HeaderError::UnsupportedVersion(v) => DecodeError::UnsupportedVersion(v),
            HeaderError::OutOfBounds(e)        => DecodeError::OutOfBounds(e),
        }
    }
}

// ── Results ──────────────────────────────────────────────────────────────────

/// One decompressed asset with its output filename.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAsset {
    /// Position in `module.assets`.
    pub index:         usize,
    pub id:            String,
    pub filename:      String,
    pub declared_type: Option<String>,
    pub data:          Vec<u8>,
}

impl ResolvedAsset {
    /// Declared type, or `application/octet-stream` when absent or empty.
    pub fn content_type(&self) -> &str {
        match self.declared_type.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => DEFAULT_CONTENT_TYPE,
        }
    }

    pub fn size_kib(&self) -> f64 {
        self.data.len() as f64 / 1024.0
    }

    /// Size formatted as `"12.34 KB"`.
    pub fn display_size(&self) -> String {
        format!("{:.2} KB", self.size_kib())
    }

    /// BLAKE3 of the decoded content.
    pub fn content_hash(&self) -> [u8; 32] {
        blake3::hash(&self.data).into()
    }
}

/// How the asset section of a container ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionEnd {
    /// The module declares no assets; frames were not read.
    NoAssets,
    /// Every descriptor was paired with a frame.
    Complete,
    /// A `0` marker was read.
    Terminator,
    /// The buffer ran out between frames.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct DecodedModule {
    pub header:   Header,
    pub metadata: ModuleMetadata,
    pub assets:   Vec<ResolvedAsset>,
    pub end:      SectionEnd,
}

impl DecodedModule {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Descriptors that never received a frame.
    pub fn missing_assets(&self) -> usize {
        self.metadata.assets.len() - self.assets.len()
    }
}

// ── Decoder ──────────────────────────────────────────────────────────────────

/// Drives a [`ContainerReader`] through a whole container, unpacking every
/// block with one codec.
pub struct ModuleDecoder<'c> {
    codec: &'c dyn Codec,
}

impl<'c> ModuleDecoder<'c> {
    pub fn new(codec: &'c dyn Codec) -> Self {
        Self { codec }
    }

    pub fn decode(&self, buf: &[u8]) -> Result<DecodedModule, DecodeError> {
        let mut reader = ContainerReader::new(buf);
        let header = Header::read(&mut reader)?;

        let packed = reader.read_length_prefixed()?;
        let raw = self.unpack(packed, Block::Metadata)?;
        let metadata = ModuleMetadata::from_bytes(&raw)?;
        debug!(
            "metadata: {} packed -> {} bytes, module '{}' declares {} asset(s)",
            packed.len(), raw.len(), metadata.name, metadata.assets.len()
        );

        if metadata.assets.is_empty() {
            info!("module '{}' has no assets", metadata.name);
            return Ok(DecodedModule { header, metadata, assets: Vec::new(), end: SectionEnd::NoAssets });
        }

        let mut assets: Vec<ResolvedAsset> = Vec::with_capacity(metadata.assets.len());
        let end = loop {
            if assets.len() == metadata.assets.len() {
                break SectionEnd::Complete;
            }
            if reader.at_end() {
                break SectionEnd::Exhausted;
            }

            let offset = reader.offset();
            match reader.read_u8()? {
                FRAME_END => break SectionEnd::Terminator,
                FRAME_ASSET => {
                    let index = assets.len();
                    let packed = reader.read_length_prefixed()?;
                    let data = self.unpack(packed, Block::Asset(index))?;

                    let descriptor = &metadata.assets[index];
                    let filename = resolve_filename(
                        &descriptor.id,
                        descriptor.declared_type.as_deref(),
                        &data,
                    );
                    debug!(
                        "asset #{index} at offset {offset}: {} packed -> {} bytes as '{filename}'",
                        packed.len(), data.len()
                    );

                    assets.push(ResolvedAsset {
                        index,
                        id: descriptor.id.clone(),
                        filename,
                        declared_type: descriptor.declared_type.clone(),
                        data,
                    });
                }
                marker => return Err(DecodeError::UnknownMarker { marker, offset }),
            }
        };

        if end != SectionEnd::Complete {
            warn!(
                "asset section ended ({end:?}) after {} of {} declared asset(s)",
                assets.len(), metadata.assets.len()
            );
        }
        info!("decoded module '{}': {} asset(s)", metadata.name, assets.len());

        Ok(DecodedModule { header, metadata, assets, end })
    }

    fn unpack(&self, packed: &[u8], block: Block) -> Result<Vec<u8>, DecodeError> {
        self.codec
            .decompress(packed)
            .map_err(|source| DecodeError::Decompression { block, source })
    }
}

/// Decode a whole container held in memory.
pub fn decode_module(buf: &[u8], codec: &dyn Codec) -> Result<DecodedModule, DecodeError> {
    ModuleDecoder::new(codec).decode(buf)
}
