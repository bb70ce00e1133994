//! File-system capability used for properties files and the token cache

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{GalasaError, Result};

/// The file operations the auth layer performs
pub trait FileSystem: Send + Sync {
    fn user_home_dir(&self) -> Result<PathBuf>;
    fn exists(&self, path: &Path) -> bool;
    fn read_text_file(&self, path: &Path) -> Result<String>;
    fn read_binary_file(&self, path: &Path) -> Result<Vec<u8>>;
    /// Write a file, creating parent directories as needed
    fn write_binary_file(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn write_text_file(&self, path: &Path, contents: &str) -> Result<()> {
        self.write_binary_file(path, contents.as_bytes())
    }
    /// Delete a file; deleting a missing file is not an error
    fn delete_file(&self, path: &Path) -> Result<()>;
    /// Recursively delete a directory; deleting a missing directory is not an error
    fn delete_dir(&self, path: &Path) -> Result<()>;
}

/// The real file system
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl OsFileSystem {
    pub fn new() -> Self {
        Self
    }
}

fn ignore_not_found(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl FileSystem for OsFileSystem {
    fn user_home_dir(&self) -> Result<PathBuf> {
        dirs::home_dir().ok_or_else(|| GalasaError::config("HOME", "failed to get home directory"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_text_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| GalasaError::io(path, e))
    }

    fn read_binary_file(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| GalasaError::io(path, e))
    }

    fn write_binary_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| GalasaError::io(parent, e))?;
                log::debug!("Created directory: {:?}", parent);
            }
        }
        fs::write(path, contents).map_err(|e| GalasaError::io(path, e))
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        ignore_not_found(fs::remove_file(path)).map_err(|e| GalasaError::io(path, e))
    }

    fn delete_dir(&self, path: &Path) -> Result<()> {
        ignore_not_found(fs::remove_dir_all(path)).map_err(|e| GalasaError::io(path, e))
    }
}

/// In-memory file system for tests
#[derive(Debug)]
pub struct MockFileSystem {
    home: PathBuf,
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_home("/home/tester")
    }

    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            files: Mutex::new(HashMap::new()),
        }
    }

    fn files(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Paths of every file currently stored
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn not_found(path: &Path) -> GalasaError {
        GalasaError::io(path, io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

impl FileSystem for MockFileSystem {
    fn user_home_dir(&self) -> Result<PathBuf> {
        Ok(self.home.clone())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files();
        files.contains_key(path) || files.keys().any(|file| file.starts_with(path))
    }

    fn read_text_file(&self, path: &Path) -> Result<String> {
        let bytes = self.read_binary_file(path)?;
        String::from_utf8(bytes).map_err(|e| {
            GalasaError::io(path, io::Error::new(io::ErrorKind::InvalidData, e))
        })
    }

    fn read_binary_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.files()
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    fn write_binary_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.files().insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        self.files().remove(path);
        Ok(())
    }

    fn delete_dir(&self, path: &Path) -> Result<()> {
        self.files().retain(|file, _| !file.starts_with(path));
        Ok(())
    }
}
