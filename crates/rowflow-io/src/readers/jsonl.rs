//! Newline-delimited JSON source.
//!
//! Each `open` reopens the file, so every consumer of the source gets its own
//! pass. Blank lines are skipped; every other line must be a JSON object.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use rowflow_core::error::BoxError;
use rowflow_core::source::{RenewableSource, SourceIter};
use rowflow_core::types::Record;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file eagerly. Handy for small inputs and tests.
    pub fn read_all(&self) -> Result<Vec<Record>> {
        JsonlLines::open(&self.path)?.collect()
    }
}

impl RenewableSource for JsonlSource {
    fn open(&self) -> std::result::Result<SourceIter, BoxError> {
        let lines = JsonlLines::open(&self.path)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %self.path.display(), "opened jsonl source");
        Ok(Box::new(lines.map(|r| r.map_err(BoxError::from))))
    }
}

struct JsonlLines {
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl JsonlLines {
    fn open(path: &Path) -> Result<Self> {
        let f = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(f).lines(),
            line_no: 0,
        })
    }
}

impl Iterator for JsonlLines {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(Error::Io(e))),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let parsed = serde_json::from_str::<serde_json::Value>(&line)
                .map_err(Error::from)
                .and_then(|v| {
                    Record::from_json(v).ok_or(Error::NotAnObject {
                        line: self.line_no,
                    })
                });
            return Some(parsed);
        }
    }
}
