use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use rowflow_mem::error::{Error as MemError, Result as MemResult};
use rowflow_mem::Storage;

/// Spill segments as plain files. Paths are used as given; the engine
/// prefixes them with its spill root.
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

fn storage_err<'a>(op: &'static str, path: &'a str) -> impl FnOnce(io::Error) -> MemError + 'a {
    move |e| MemError::Storage(format!("{op} '{path}': {e}"))
}

impl Storage for FsStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> MemResult<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent).map_err(storage_err("create parent of", path))?;
        }
        let mut file = File::create(path).map_err(storage_err("create", path))?;
        file.write_all(bytes).map_err(storage_err("write", path))?;
        file.flush().map_err(storage_err("flush", path))
    }

    fn open_read(&self, path: &str) -> MemResult<Box<dyn Read + Send>> {
        let file = File::open(path).map_err(storage_err("open", path))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn delete(&self, path: &str) -> MemResult<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(storage_err("delete", path)(e)),
            _ => Ok(()),
        }
    }

    /// Every file under `prefix` (a file or a directory), sorted.
    fn list(&self, prefix: &str) -> MemResult<Vec<String>> {
        let root = PathBuf::from(prefix);
        if root.is_file() {
            return Ok(vec![prefix.to_string()]);
        }
        let mut files = Vec::new();
        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(storage_err("list", prefix)(e)),
            };
            for entry in entries {
                let path = entry.map_err(storage_err("list", prefix))?.path();
                if path.is_dir() {
                    pending.push(path);
                } else {
                    files.push(path.to_string_lossy().into_owned());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Only removes `path` once it is empty; a missing directory is fine.
    fn remove_dir(&self, path: &str) -> MemResult<()> {
        match fs::remove_dir(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(storage_err("remove", path)(e)),
            _ => Ok(()),
        }
    }
}
