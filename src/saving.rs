use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A single slot holding the raw bytes of the last upload.
///
/// Writes replace the whole slot. There is no locking across writers: two concurrent uploads
/// leave whichever finished last.
pub trait UploadStore: Send + Sync {
    /// Contents of the slot, `None` if nothing has been stored yet
    fn read(&self) -> std::io::Result<Option<Vec<u8>>>;

    /// Replace the slot contents
    fn write(&self, bytes: &[u8]) -> std::io::Result<()>;
}

/// Slot backed by one file on local disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UploadStore for FileStore {
    fn read(&self) -> std::io::Result<Option<Vec<u8>>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(Some(buffer))
    }

    fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(&self.path)?;
        file.write_all(bytes)?;
        file.flush()?;

        log::debug!("stored {} bytes at {}", bytes.len(), self.path.display());
        Ok(())
    }
}

/// In-process slot
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UploadStore for MemoryStore {
    fn read(&self) -> std::io::Result<Option<Vec<u8>>> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| std::io::Error::new(ErrorKind::Other, e.to_string()))?;
        Ok(slot.clone())
    }

    fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| std::io::Error::new(ErrorKind::Other, e.to_string()))?;
        *slot = Some(bytes.to_vec());
        Ok(())
    }
}

/// Slot that never keeps anything, for deployments that do not persist uploads
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStore;

impl UploadStore for NoStore {
    fn read(&self) -> std::io::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn write(&self, _bytes: &[u8]) -> std::io::Result<()> {
        Ok(())
    }
}
