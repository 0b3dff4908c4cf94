//! High-level [`Extraction`] API: the surface a front end embeds.
//!
//! ```no_run
//! use risum::extract::{Extraction, ExtractOptions};
//!
//! let opts = ExtractOptions::default();
//! let ex = Extraction::open("character.risum", &opts)?;
//! for info in ex.list() {
//!     println!("{} ({})", info.filename, info.display_size);
//! }
//! ex.extract_all(ex.archive_name(), &opts)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::codec::{get_codec, CodecId};
use crate::decoder::{decode_module, DecodeError, DecodedModule, ResolvedAsset};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Refusing to write asset with unsafe filename {0:?}")]
    UnsafeFilename(String),
}

// ── ExtractOptions ────────────────────────────────────────────────────────────

/// Configuration for [`Extraction::open`] and [`Extraction::extract_all`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Codec every packed block in the container was written with.
    pub codec:           CodecId,
    /// Also write `<stem>_structure.json` next to the assets.
    pub write_structure: bool,
    /// Replace files that already exist in the destination.
    pub overwrite:       bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            codec:           CodecId::Zstd,
            write_structure: true,
            overwrite:       true,
        }
    }
}

// ── AssetInfo ─────────────────────────────────────────────────────────────────

/// Lightweight descriptor returned by [`Extraction::list`].
#[derive(Debug, Clone)]
pub struct AssetInfo {
    pub index:        usize,
    pub filename:     String,
    pub content_type: String,
    pub size:         usize,
    pub display_size: String,
    /// Hex of the first 6 bytes of the BLAKE3 content hash.
    pub hash_prefix:  String,
}

impl From<&ResolvedAsset> for AssetInfo {
    fn from(a: &ResolvedAsset) -> Self {
        AssetInfo {
            index:        a.index,
            filename:     a.filename.clone(),
            content_type: a.content_type().to_owned(),
            size:         a.data.len(),
            display_size: a.display_size(),
            hash_prefix:  hex::encode(&a.content_hash()[..6]),
        }
    }
}

/// Paths written by [`Extraction::extract_all`].
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    pub assets:    Vec<PathBuf>,
    pub structure: Option<PathBuf>,
}

// ── Extraction ────────────────────────────────────────────────────────────────

pub struct Extraction {
    stem:   String,
    module: DecodedModule,
}

impl Extraction {
    /// Read the whole file into memory and decode it.
    pub fn open<P: AsRef<Path>>(path: P, opts: &ExtractOptions) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let buf = fs::read(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "module".to_owned());
        debug!("read {} bytes from {}", buf.len(), path.display());
        Self::from_bytes(stem, &buf, opts.codec)
    }

    /// Decode an in-memory container.  `stem` names the structure file.
    pub fn from_bytes(stem: impl Into<String>, buf: &[u8], codec: CodecId) -> Result<Self, ExtractError> {
        let codec = get_codec(codec);
        let module = decode_module(buf, codec.as_ref())?;
        Ok(Self { stem: stem.into(), module })
    }

    pub fn module(&self) -> &DecodedModule { &self.module }

    pub fn list(&self) -> Vec<AssetInfo> {
        self.module.assets.iter().map(AssetInfo::from).collect()
    }

    /// `<module name>_assets`, the default output directory.  Path
    /// separators, `:` and NUL in the module name become `_`, so the result
    /// is always a single relative path component.
    pub fn archive_name(&self) -> String {
        let name: String = self.module.name()
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':' | '\0') { '_' } else { c })
            .collect();
        format!("{name}_assets")
    }

    pub fn structure_file_name(&self) -> String {
        format!("{}_structure.json", self.stem)
    }

    /// The full metadata document, pretty-printed.
    pub fn structure_json(&self) -> Result<String, ExtractError> {
        Ok(self.module.metadata.to_pretty_json()?)
    }

    pub fn write_structure<P: AsRef<Path>>(&self, dest: P, overwrite: bool) -> Result<PathBuf, ExtractError> {
        let dest = dest.as_ref();
        fs::create_dir_all(dest)?;
        let path = dest.join(self.structure_file_name());
        create_file(&path, overwrite)?.write_all(self.structure_json()?.as_bytes())?;
        Ok(path)
    }

    /// Write every resolved asset into `dest` under its resolved filename,
    /// creating `dest` if necessary.
    pub fn write_assets<P: AsRef<Path>>(&self, dest: P, overwrite: bool) -> Result<Vec<PathBuf>, ExtractError> {
        let dest = dest.as_ref();
        // Check every name before touching the filesystem.
        for asset in &self.module.assets {
            check_filename(&asset.filename)?;
        }
        fs::create_dir_all(dest)?;

        let mut written = Vec::with_capacity(self.module.assets.len());
        for asset in &self.module.assets {
            let path = dest.join(&asset.filename);
            create_file(&path, overwrite)?.write_all(&asset.data)?;
            debug!("wrote {} ({})", path.display(), asset.display_size());
            written.push(path);
        }
        Ok(written)
    }

    pub fn extract_all<P: AsRef<Path>>(&self, dest: P, opts: &ExtractOptions) -> Result<ExtractSummary, ExtractError> {
        let dest = dest.as_ref();
        let assets = self.write_assets(dest, opts.overwrite)?;
        let structure = if opts.write_structure {
            Some(self.write_structure(dest, opts.overwrite)?)
        } else {
            None
        };
        info!("extracted {} asset(s) to {}", assets.len(), dest.display());
        Ok(ExtractSummary { assets, structure })
    }
}

fn check_filename(name: &str) -> Result<(), ExtractError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(ExtractError::UnsafeFilename(name.to_owned()));
    }
    Ok(())
}

fn create_file(path: &Path, overwrite: bool) -> io::Result<File> {
    if overwrite {
        File::create(path)
    } else {
        OpenOptions::new().write(true).create_new(true).open(path)
    }
}
