pub mod reader;
pub mod header;
pub mod codec;
pub mod metadata;
pub mod extension;
pub mod decoder;
pub mod extract;

pub use reader::{ContainerReader, OutOfBounds};
pub use header::{Header, MAGIC, VERSION};
pub use codec::{Codec, CodecId, get_codec};
pub use metadata::{AssetDescriptor, ModuleMetadata};
pub use extension::{resolve_filename, sniff_extension};
pub use decoder::{decode_module, DecodeError, DecodedModule, ErrorKind, ModuleDecoder, ResolvedAsset};
pub use extract::{ExtractOptions, Extraction};
