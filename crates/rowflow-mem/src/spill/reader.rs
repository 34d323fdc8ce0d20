//! Streaming reader over one spilled run.
//!
//! Frames are decoded one at a time; the checksum is accumulated while
//! reading and verified once the last frame has been consumed.

use std::io::Read;

use rowflow_core::types::Record;

use super::segment::{self, SegmentHeader, SegmentMeta, FRAME_PREFIX_LEN, HEADER_LEN};
use crate::error::{Error, Result};

pub struct RunReader {
    inner: Box<dyn Read + Send>,
    meta: SegmentMeta,
    hasher: blake3::Hasher,
    remaining: u64,
    payload_read: u64,
    finished: bool,
}

impl RunReader {
    /// Read and validate the header; the reader is then positioned at the
    /// first frame.
    pub fn open(mut inner: Box<dyn Read + Send>, meta: SegmentMeta) -> Result<Self> {
        let mut header_bytes = [0u8; HEADER_LEN];
        inner
            .read_exact(&mut header_bytes)
            .map_err(|e| corrupt(&meta, format!("reading header: {e}")))?;
        let header = SegmentHeader::from_bytes(&header_bytes)?;

        if header.record_count != meta.record_count || header.payload_len != meta.payload_len {
            return Err(corrupt(&meta, "header does not match spill metadata".into()));
        }
        if header.codec != meta.codec {
            return Err(corrupt(&meta, "codec does not match spill metadata".into()));
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(&header_bytes);

        Ok(Self {
            inner,
            remaining: header.record_count,
            meta,
            hasher,
            payload_read: 0,
            finished: false,
        })
    }

    fn read_frame(&mut self) -> Result<(u64, Record)> {
        let mut prefix = [0u8; FRAME_PREFIX_LEN];
        self.inner
            .read_exact(&mut prefix)
            .map_err(|e| corrupt(&self.meta, format!("reading frame length: {e}")))?;
        let len = u32::from_le_bytes(prefix) as u64;

        // The length is untrusted until the checksum is verified; never
        // allocate past what the segment claims to hold.
        let available = self
            .meta
            .payload_len
            .saturating_sub(self.payload_read + FRAME_PREFIX_LEN as u64);
        if len > available {
            return Err(corrupt(
                &self.meta,
                format!("frame length {len} exceeds remaining payload {available}"),
            ));
        }
        let len = len as usize;

        let mut body = vec![0u8; len];
        self.inner
            .read_exact(&mut body)
            .map_err(|e| corrupt(&self.meta, format!("reading frame body: {e}")))?;

        self.hasher.update(&prefix);
        self.hasher.update(&body);
        self.payload_read += (FRAME_PREFIX_LEN + len) as u64;

        segment::decode_frame(self.meta.codec, &body)
    }

    fn verify(&mut self) -> Result<()> {
        if self.payload_read != self.meta.payload_len {
            return Err(corrupt(
                &self.meta,
                format!(
                    "read {} payload bytes, expected {}",
                    self.payload_read, self.meta.payload_len
                ),
            ));
        }
        let actual: [u8; 32] = self.hasher.finalize().into();
        if actual != self.meta.checksum {
            return Err(Error::ChecksumMismatch {
                segment: self.meta.name.0.clone(),
            });
        }
        Ok(())
    }
}

impl Iterator for RunReader {
    type Item = Result<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.remaining == 0 {
            self.finished = true;
            return self.verify().err().map(Err);
        }
        match self.read_frame() {
            Ok(entry) => {
                self.remaining -= 1;
                Some(Ok(entry))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn corrupt(meta: &SegmentMeta, reason: String) -> Error {
    Error::Corrupt {
        segment: meta.name.0.clone(),
        reason,
    }
}
