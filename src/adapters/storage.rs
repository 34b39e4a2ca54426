use crate::domain::ports::Storage;
use crate::utils::error::{ReportError, Result};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);
        tokio::fs::remove_file(full_path).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileOperation {
    Read,
    Write,
    Delete,
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileOperation::Read => "read",
            FileOperation::Write => "write",
            FileOperation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// File access restricted to the operations it was built with.
pub struct FileManager<S: Storage> {
    storage: S,
    allowed: HashSet<FileOperation>,
}

impl<S: Storage> FileManager<S> {
    pub fn new(storage: S, operations: &[FileOperation]) -> Self {
        Self {
            storage,
            allowed: operations.iter().copied().collect(),
        }
    }

    pub fn read_only(storage: S) -> Self {
        Self::new(storage, &[FileOperation::Read])
    }

    pub fn supports(&self, operation: FileOperation) -> bool {
        self.allowed.contains(&operation)
    }

    fn ensure(&self, operation: FileOperation, path: &str) -> Result<()> {
        if self.supports(operation) {
            Ok(())
        } else {
            Err(ReportError::UnsupportedOperation {
                operation: format!("{} {}", operation, path),
            })
        }
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.ensure(FileOperation::Read, path)?;
        self.storage.read_file(path).await
    }

    /// Lines of a UTF-8 text file, trailing newline characters removed.
    pub async fn read_lines(&self, path: &str) -> Result<Vec<String>> {
        let bytes = self.read(path).await?;
        let text = String::from_utf8(bytes).map_err(|e| ReportError::InvalidRecord {
            line: 0,
            reason: format!("{} is not valid UTF-8: {}", path, e),
        })?;
        Ok(text
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect())
    }

    pub async fn write(&self, path: &str, data: &str) -> Result<()> {
        self.ensure(FileOperation::Write, path)?;
        self.storage.write_file(path, data.as_bytes()).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.ensure(FileOperation::Delete, path)?;
        self.storage.delete_file(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_write_delete_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap());
        let manager = FileManager::new(
            storage,
            &[FileOperation::Read, FileOperation::Write, FileOperation::Delete],
        );

        manager.write("nested/countries.txt", "Spain\r\nItaly\n").await.unwrap();
        let lines = manager.read_lines("nested/countries.txt").await.unwrap();
        assert_eq!(lines, vec!["Spain", "Italy"]);

        manager.delete("nested/countries.txt").await.unwrap();
        assert!(manager.read_lines("nested/countries.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_unsupported_operation_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let manager = FileManager::read_only(LocalStorage::new(temp_dir.path().to_str().unwrap()));

        assert!(!manager.supports(FileOperation::Write));
        let err = manager.write("out.txt", "data").await.unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedOperation { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let manager = FileManager::read_only(LocalStorage::new(temp_dir.path().to_str().unwrap()));
        let err = manager.read_lines("missing.txt").await.unwrap_err();
        assert!(matches!(err, ReportError::IoError(_)));
    }
}
