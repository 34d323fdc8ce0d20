//! Segment file header, frame encoding, and metadata.
//!
//! Layout on disk:
//! [ magic: u32 ][ version: u16 ][ codec: u8 ][ reserved: u8 ]
//! [ record_count: u64 ][ payload_len: u64 ]
//! [ frame ]*   where frame = [ len: u32 ][ codec(json((seq, record))) ]
//!
//! End-to-end checksum is computed over (header || payload) using blake3 and
//! kept in memory in `SegmentMeta`; segments never outlive the process.

use serde::{Deserialize, Serialize};

use rowflow_core::types::Record;

use super::codec::{self, Codec};
use crate::error::{Error, Result};

pub const MAGIC: u32 = 0x52464C57; // "RFLW"
pub const VERSION: u16 = 1;
pub const HEADER_LEN: usize = 4 + 2 + 1 + 1 + 8 + 8;
pub const FRAME_PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentHeader {
    pub magic: u32,
    pub version: u16,
    pub codec: Codec,
    pub record_count: u64,
    pub payload_len: u64,
}

impl SegmentHeader {
    pub fn new(codec: Codec, record_count: u64, payload_len: u64) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            codec,
            record_count,
            payload_len,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&self.magic.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.push(self.codec as u8);
        out.push(0u8); // reserved
        out.extend_from_slice(&self.record_count.to_le_bytes());
        out.extend_from_slice(&self.payload_len.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Storage("short header".into()));
        }
        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        let codec = Codec::from_u8(bytes[6])?;
        // bytes[7] reserved
        let record_count = le_u64(&bytes[8..16]);
        let payload_len = le_u64(&bytes[16..24]);

        if magic != MAGIC || version != VERSION {
            return Err(Error::Storage("bad magic/version".into()));
        }

        Ok(Self {
            magic,
            version,
            codec,
            record_count,
            payload_len,
        })
    }
}

fn le_u64(b: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&b[..8]);
    u64::from_le_bytes(buf)
}

/// Encode one `(intake sequence, record)` entry as a length-prefixed frame.
pub fn encode_frame(codec: Codec, seq: u64, record: &Record) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(&(seq, record))
        .map_err(|e| Error::Codec(format!("json serialize: {e}")))?;
    let body = codec::compress(codec, &json)?;
    let len = u32::try_from(body.len())
        .map_err(|_| Error::Codec(format!("frame of {} bytes is too large", body.len())))?;

    let mut out = Vec::with_capacity(FRAME_PREFIX_LEN + body.len());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a frame body (without its length prefix).
pub fn decode_frame(codec: Codec, body: &[u8]) -> Result<(u64, Record)> {
    let json = codec::decompress(codec, body)?;
    serde_json::from_slice(&json).map_err(|e| Error::Codec(format!("json deserialize: {e}")))
}

/// Human-friendly name for a segment, derived from a spill id and a run index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentName(pub String);

impl SegmentName {
    pub fn new(id: rowflow_core::id::SpillId, run_index: u32) -> Self {
        SegmentName(format!("{id}_run{run_index}"))
    }
}

/// Metadata the engine keeps for a spilled run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub name: SegmentName,
    pub path: String,
    pub codec: Codec,
    pub record_count: u64,
    pub payload_len: u64,
    pub checksum: [u8; 32],
}
