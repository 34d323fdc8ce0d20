//! Streaming NDJSON writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rowflow_core::types::Record;

use crate::error::Result;

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
    written: u64,
}

impl JsonlWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    /// Write one record as a JSON object on its own line.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &record.to_json())?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Write every record from an iterator, stopping at the first error.
    pub fn write_all<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        for r in records {
            self.write_record(r)?;
        }
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}
