//! Transparent decompression of data files.
//!
//! Survey microdata is often distributed compressed. Readers are wrapped by
//! a [`CompressionCodec`] picked from the file extension first, then from
//! magic bytes; an unrecognized file is read as-is.
//!
//! ## Built-in Codecs
//!
//! - **Gzip** (`.gz`) - via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`) - via `zstd` (feature: `compression-zstd`)
//! - **Bzip2** (`.bz2`) - via `bzip2` (feature: `compression-bzip2`)
//! - **Xz** (`.xz`) - via `xz2` (feature: `compression-xz`)
//!
//! Additional codecs can be added at runtime with [`register_codec`].

use std::io::{BufRead, BufReader, Read, Result};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Global codec registry.
static CODEC_REGISTRY: RwLock<Option<Vec<Arc<dyn CompressionCodec>>>> = RwLock::new(None);

fn init_registry() -> Vec<Arc<dyn CompressionCodec>> {
    let builtins: Vec<Builtin> = vec![
        #[cfg(feature = "compression-gzip")]
        GZIP,
        #[cfg(feature = "compression-zstd")]
        ZSTD,
        #[cfg(feature = "compression-bzip2")]
        BZIP2,
        #[cfg(feature = "compression-xz")]
        XZ,
    ];
    builtins
        .into_iter()
        .map(|codec| Arc::new(codec) as Arc<dyn CompressionCodec>)
        .collect()
}

fn get_registry() -> Vec<Arc<dyn CompressionCodec>> {
    let mut lock = CODEC_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(init_registry).clone()
}

/// Register a custom codec alongside the built-in ones.
pub fn register_codec(codec: Arc<dyn CompressionCodec>) {
    let mut lock = CODEC_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(init_registry).push(codec);
}

/// Pluggable decompression codec.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g., "gzip").
    fn name(&self) -> &str;

    /// Lowercase file extensions with the leading dot (e.g., `&[".gz"]`).
    fn extensions(&self) -> &[&str];

    /// Magic byte signature, if the format has one.
    fn magic_bytes(&self) -> Option<&[u8]>;

    /// Wrap a reader with decompression.
    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> Result<Box<dyn Read>>;
}

fn detect_from_extension(path: &Path) -> Option<Arc<dyn CompressionCodec>> {
    let path_str = path.to_string_lossy().to_lowercase();
    get_registry()
        .into_iter()
        .find(|codec| codec.extensions().iter().any(|ext| path_str.ends_with(ext)))
}

/// Peek at the start of the stream without consuming it.
fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<Arc<dyn CompressionCodec>> {
    let buf = reader.fill_buf().ok()?;
    if buf.is_empty() {
        return None;
    }
    get_registry().into_iter().find(|codec| {
        codec
            .magic_bytes()
            .is_some_and(|magic| buf.len() >= magic.len() && buf.starts_with(magic))
    })
}

/// Wrap `reader` with decompression if the path or content calls for it.
///
/// # Errors
/// Returns an error if the codec fails to initialize on the stream header.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    if let Some(codec) = detect_from_extension(path_hint.as_ref()) {
        tracing::debug!(codec = codec.name(), "decompressing by extension");
        return codec.wrap_reader_dyn(Box::new(reader));
    }

    let mut buf_reader = BufReader::new(reader);
    if let Some(codec) = detect_from_magic(&mut buf_reader) {
        tracing::debug!(codec = codec.name(), "decompressing by magic bytes");
        return codec.wrap_reader_dyn(Box::new(buf_reader));
    }

    Ok(Box::new(buf_reader))
}

/// A compiled-in codec: its detection data plus a decoder constructor.
struct Builtin {
    name: &'static str,
    extensions: &'static [&'static str],
    magic: &'static [u8],
    decoder: fn(Box<dyn Read>) -> Result<Box<dyn Read>>,
}

impl CompressionCodec for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn extensions(&self) -> &[&str] {
        self.extensions
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(self.magic)
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> Result<Box<dyn Read>> {
        (self.decoder)(reader)
    }
}

// All decoders accept concatenated multi-member streams.

#[cfg(feature = "compression-gzip")]
const GZIP: Builtin = Builtin {
    name: "gzip",
    extensions: &[".gz", ".gzip"],
    magic: &[0x1f, 0x8b],
    decoder: |r| Ok(Box::new(flate2::read::MultiGzDecoder::new(r))),
};

#[cfg(feature = "compression-zstd")]
const ZSTD: Builtin = Builtin {
    name: "zstd",
    extensions: &[".zst", ".zstd"],
    magic: &[0x28, 0xb5, 0x2f, 0xfd],
    decoder: |r| Ok(Box::new(zstd::stream::read::Decoder::new(r)?)),
};

#[cfg(feature = "compression-bzip2")]
const BZIP2: Builtin = Builtin {
    name: "bzip2",
    extensions: &[".bz2", ".bzip2"],
    magic: b"BZh",
    decoder: |r| Ok(Box::new(bzip2::read::MultiBzDecoder::new(r))),
};

#[cfg(feature = "compression-xz")]
const XZ: Builtin = Builtin {
    name: "xz",
    extensions: &[".xz"],
    magic: &[0xfd, b'7', b'z', b'X', b'Z', 0x00],
    decoder: |r| Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(r))),
};
