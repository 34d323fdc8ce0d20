//! Spill manager for external-memory operators.
//!
//! Orchestrates writing sorted runs to storage as framed segments and
//! streaming them back one record at a time, with end-to-end checksums.
//!
//! Every manager writes into its own session directory under the configured
//! root, so engines sharing a spill root never see each other's segments.

pub mod codec;
pub mod reader;
pub mod segment;

use std::collections::HashMap;
use std::io::Read;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use rowflow_core::id::SpillId;
use rowflow_core::types::Record;
use uuid::Uuid;

use crate::error::{Error, Result};

pub use codec::Codec;
pub use reader::RunReader;
pub use segment::{SegmentHeader, SegmentMeta, SegmentName, HEADER_LEN};

/// Abstract storage interface for spill segments.
///
/// Implemented by `rowflow-io::FsStorage` for the local filesystem and by
/// `rowflow-io::MemoryStorage` for tests and small jobs.
pub trait Storage: Send + Sync {
    /// Write bytes to a path. Creates parent directories if needed.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Open a sequential reader positioned at the start of `path`.
    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>>;

    /// Delete a path. Idempotent (no error if path doesn't exist).
    fn delete(&self, path: &str) -> Result<()>;

    /// List all paths under a prefix.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Remove an empty directory left behind by deleted paths. Backends
    /// without directories have nothing to do.
    fn remove_dir(&self, _path: &str) -> Result<()> {
        Ok(())
    }
}

/// Central manager for spilling sorted runs to storage.
///
/// Shared behind an `Arc` by every sort an engine runs; bookkeeping uses
/// atomics and a mutex so `&self` is enough everywhere.
pub struct SpillManager {
    storage: Box<dyn Storage>,
    codec: Codec,
    session_dir: String,
    next_spill: AtomicU64,
    next_run: AtomicU32,
    segments: Mutex<HashMap<SegmentName, SegmentMeta>>,
}

impl SpillManager {
    /// Create a manager writing under a fresh session directory in `root_dir`.
    pub fn new(storage: Box<dyn Storage>, codec: Codec, root_dir: String) -> Self {
        let session_dir = format!(
            "{}/session-{}",
            root_dir.trim_end_matches('/'),
            Uuid::new_v4().simple()
        );
        Self {
            storage,
            codec,
            session_dir,
            next_spill: AtomicU64::new(0),
            next_run: AtomicU32::new(0),
            segments: Mutex::new(HashMap::new()),
        }
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Directory holding this manager's segments.
    pub fn session_dir(&self) -> &str {
        &self.session_dir
    }

    /// Allocate an id for a new external sort.
    pub fn next_spill_id(&self) -> SpillId {
        SpillId::new(self.next_spill.fetch_add(1, Ordering::Relaxed))
    }

    /// Generate a unique run index for this spill session.
    pub fn next_run_index(&self) -> u32 {
        self.next_run.fetch_add(1, Ordering::Relaxed)
    }

    /// Write one sorted run and return its metadata.
    ///
    /// Steps:
    /// 1. Encode every `(seq, record)` entry as a compressed frame
    /// 2. Prepend a SegmentHeader
    /// 3. Compute BLAKE3 checksum over header + payload
    /// 4. Write to storage and remember the segment
    pub fn write_run<'a, I>(&self, spill_id: SpillId, entries: I) -> Result<SegmentMeta>
    where
        I: IntoIterator<Item = (u64, &'a Record)>,
    {
        let mut payload = Vec::new();
        let mut record_count = 0u64;
        for (seq, record) in entries {
            payload.extend_from_slice(&segment::encode_frame(self.codec, seq, record)?);
            record_count += 1;
        }
        let payload_len = payload.len() as u64;

        let header = SegmentHeader::new(self.codec, record_count, payload_len);
        let header_bytes = header.to_bytes();

        let mut hasher = blake3::Hasher::new();
        hasher.update(&header_bytes);
        hasher.update(&payload);
        let checksum: [u8; 32] = hasher.finalize().into();

        let name = SegmentName::new(spill_id, self.next_run_index());
        let path = format!("{}/{}.seg", self.session_dir, name.0);

        let mut full_segment = Vec::with_capacity(header_bytes.len() + payload.len());
        full_segment.extend_from_slice(&header_bytes);
        full_segment.extend_from_slice(&payload);

        self.storage.write(&path, &full_segment)?;

        let meta = SegmentMeta {
            name: name.clone(),
            path,
            codec: self.codec,
            record_count,
            payload_len,
            checksum,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(segment = %name.0, records = record_count, bytes = payload_len, "spilled run");

        self.segments_lock()?.insert(name, meta.clone());
        Ok(meta)
    }

    /// Open a streaming reader over a spilled run.
    pub fn open_run(&self, meta: &SegmentMeta) -> Result<RunReader> {
        let inner = self.storage.open_read(&meta.path)?;
        RunReader::open(inner, meta.clone())
    }

    /// Delete a segment from storage and forget its metadata.
    pub fn delete_segment(&self, name: &SegmentName) -> Result<()> {
        let removed = self.segments_lock()?.remove(name);
        if let Some(meta) = removed {
            self.storage.delete(&meta.path)?;
            #[cfg(feature = "tracing")]
            tracing::debug!(segment = %name.0, "released spill segment");
        }
        Ok(())
    }

    /// Names of all live segments, sorted.
    pub fn list_segments(&self) -> Vec<SegmentName> {
        let mut names: Vec<SegmentName> = match self.segments.lock() {
            Ok(map) => map.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    fn segments_lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SegmentName, SegmentMeta>>> {
        self.segments
            .lock()
            .map_err(|_| Error::Storage("segment table poisoned".into()))
    }
}

impl Drop for SpillManager {
    /// Delete whatever is still registered or left in the session directory,
    /// then the directory itself.
    fn drop(&mut self) {
        for name in self.list_segments() {
            if let Err(_e) = self.delete_segment(&name) {
                #[cfg(feature = "tracing")]
                tracing::warn!(segment = %name.0, error = %_e, "failed to delete spill segment");
            }
        }
        let leftovers = self.storage.list(&self.session_dir).unwrap_or_default();
        for path in leftovers {
            let _ = self.storage.delete(&path);
        }
        if let Err(_e) = self.storage.remove_dir(&self.session_dir) {
            #[cfg(feature = "tracing")]
            tracing::warn!(dir = %self.session_dir, error = %_e, "failed to remove spill session");
        }
    }
}
