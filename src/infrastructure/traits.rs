//! I/O boundary trait for testability
//!
//! Services read tree dumps and feature lists and write normalized dumps
//! through this trait, never through `std::fs` directly.

use std::io;
use std::path::Path;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn given_nested_dest_when_ensuring_parent_then_creates_directories() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("a/b/tree.dot");
        let fs = RealFileSystem;

        fs.ensure_parent(&dest).unwrap();
        fs.write(&dest, "digraph Tree {\n}\n").unwrap();

        assert!(fs.exists(&dest));
        assert_eq!(fs.read_to_string(&dest).unwrap(), "digraph Tree {\n}\n");
    }

    #[test]
    fn given_bare_file_name_when_ensuring_parent_then_noop() {
        assert!(RealFileSystem.ensure_parent(Path::new("tree.dot")).is_ok());
    }
}
