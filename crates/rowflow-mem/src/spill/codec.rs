//! Per-frame compression for spill segments.
//!
//! Each frame is compressed on its own so a run can be decoded one record at
//! a time during the merge. `zstd` and `lz4` are behind cargo features of the
//! same name; asking for a codec that was not compiled in is an error.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Codec {
    None = 0,
    Zstd = 1,
    Lz4 = 2,
}

#[cfg(feature = "zstd")]
const ZSTD_LEVEL: i32 = 3;

impl Codec {
    /// Decode the tag stored in a segment header.
    pub fn from_u8(tag: u8) -> Result<Self> {
        [Codec::None, Codec::Zstd, Codec::Lz4]
            .into_iter()
            .find(|c| *c as u8 == tag)
            .ok_or_else(|| Error::CodecUnsupported(format!("tag {tag}")))
    }

    /// Parse a configuration name ("none", "zstd", "lz4"), ignoring case.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Codec::None),
            "zstd" => Ok(Codec::Zstd),
            "lz4" => Ok(Codec::Lz4),
            other => Err(Error::CodecUnsupported(format!("'{other}'"))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Codec::None => "none",
            Codec::Zstd => "zstd",
            Codec::Lz4 => "lz4",
        }
    }

    /// Whether this build can encode and decode the codec.
    pub fn is_available(self) -> bool {
        match self {
            Codec::None => true,
            Codec::Zstd => cfg!(feature = "zstd"),
            Codec::Lz4 => cfg!(feature = "lz4"),
        }
    }

    fn unavailable(self) -> Error {
        Error::CodecUnsupported(format!("{} (feature not enabled)", self.name()))
    }
}

pub fn compress(codec: Codec, input: &[u8]) -> Result<Vec<u8>> {
    match codec {
        Codec::None => Ok(input.to_vec()),
        Codec::Zstd => zstd_compress(input),
        Codec::Lz4 => lz4_compress(input),
    }
}

pub fn decompress(codec: Codec, input: &[u8]) -> Result<Vec<u8>> {
    match codec {
        Codec::None => Ok(input.to_vec()),
        Codec::Zstd => zstd_decompress(input),
        Codec::Lz4 => lz4_decompress(input),
    }
}

#[cfg(feature = "zstd")]
fn zstd_compress(input: &[u8]) -> Result<Vec<u8>> {
    zstd::bulk::compress(input, ZSTD_LEVEL).map_err(|e| Error::Codec(format!("zstd: {e}")))
}

#[cfg(feature = "zstd")]
fn zstd_decompress(input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    zstd::stream::copy_decode(input, &mut out).map_err(|e| Error::Codec(format!("zstd: {e}")))?;
    Ok(out)
}

#[cfg(not(feature = "zstd"))]
fn zstd_compress(_input: &[u8]) -> Result<Vec<u8>> {
    Err(Codec::Zstd.unavailable())
}

#[cfg(not(feature = "zstd"))]
fn zstd_decompress(_input: &[u8]) -> Result<Vec<u8>> {
    Err(Codec::Zstd.unavailable())
}

#[cfg(feature = "lz4")]
fn lz4_compress(input: &[u8]) -> Result<Vec<u8>> {
    Ok(lz4_flex::compress_prepend_size(input))
}

#[cfg(feature = "lz4")]
fn lz4_decompress(input: &[u8]) -> Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(input).map_err(|e| Error::Codec(format!("lz4: {e}")))
}

#[cfg(not(feature = "lz4"))]
fn lz4_compress(_input: &[u8]) -> Result<Vec<u8>> {
    Err(Codec::Lz4.unavailable())
}

#[cfg(not(feature = "lz4"))]
fn lz4_decompress(_input: &[u8]) -> Result<Vec<u8>> {
    Err(Codec::Lz4.unavailable())
}
