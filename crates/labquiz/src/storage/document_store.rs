//! Document store for raw uploads and extracted text

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Trait for document blob and content storage
///
/// One implementation ships: `LocalDocumentStore` on the filesystem. The
/// trait keeps cloud backends possible without touching the service layer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store the raw uploaded blob, returns the storage URI
    async fn store_blob(&self, doc_id: &Uuid, file_type: &FileType, data: &[u8])
        -> Result<String>;

    /// Store the extracted plain text, returns the storage URI
    async fn store_content(&self, doc_id: &Uuid, content: &str) -> Result<String>;

    /// Load the raw blob
    async fn load_blob(&self, doc_id: &Uuid, file_type: &FileType) -> Result<Vec<u8>>;

    /// Load the extracted plain text
    async fn load_content(&self, doc_id: &Uuid) -> Result<String>;

    /// Delete the blob and content for a document
    async fn delete(&self, doc_id: &Uuid, file_type: &FileType) -> Result<()>;

    /// Check whether content exists for a document
    async fn content_exists(&self, doc_id: &Uuid) -> Result<bool>;

    /// Check if the store is usable
    async fn health_check(&self) -> Result<bool>;

    /// Store name for logging
    fn name(&self) -> &str;
}

/// Filesystem-backed document store
///
/// Blobs live under `<dir>/blobs/<id>.<ext>`, extracted text under
/// `<dir>/content/<id>.txt`.
pub struct LocalDocumentStore {
    storage_dir: PathBuf,
}

impl LocalDocumentStore {
    /// Create the store, creating its directories if needed
    pub fn new(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(storage_dir.join("blobs"))?;
        std::fs::create_dir_all(storage_dir.join("content"))?;
        Ok(Self { storage_dir })
    }

    fn blob_path(&self, doc_id: &Uuid, file_type: &FileType) -> PathBuf {
        self.storage_dir
            .join("blobs")
            .join(format!("{}.{}", doc_id, file_type.extension()))
    }

    fn content_path(&self, doc_id: &Uuid) -> PathBuf {
        self.storage_dir
            .join("content")
            .join(format!("{}.txt", doc_id))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn store_blob(
        &self,
        doc_id: &Uuid,
        file_type: &FileType,
        data: &[u8],
    ) -> Result<String> {
        let path = self.blob_path(doc_id, file_type);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write blob {}: {}", doc_id, e)))?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn store_content(&self, doc_id: &Uuid, content: &str) -> Result<String> {
        let path = self.content_path(doc_id);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write content {}: {}", doc_id, e)))?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn load_blob(&self, doc_id: &Uuid, file_type: &FileType) -> Result<Vec<u8>> {
        let path = self.blob_path(doc_id, file_type);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(format!(
                "No stored file for document {}",
                doc_id
            ))),
            Err(e) => Err(Error::Storage(format!(
                "Failed to read blob {}: {}",
                doc_id, e
            ))),
        }
    }

    async fn load_content(&self, doc_id: &Uuid) -> Result<String> {
        let path = self.content_path(doc_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(format!(
                "No extracted content for document {}",
                doc_id
            ))),
            Err(e) => Err(Error::Storage(format!(
                "Failed to read content {}: {}",
                doc_id, e
            ))),
        }
    }

    async fn delete(&self, doc_id: &Uuid, file_type: &FileType) -> Result<()> {
        for path in [self.blob_path(doc_id, file_type), self.content_path(doc_id)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::Storage(format!(
                        "Failed to delete {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
        Ok(())
    }

    async fn content_exists(&self, doc_id: &Uuid) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.content_path(doc_id))
            .await
            .unwrap_or(false))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.storage_dir.is_dir())
    }

    fn name(&self) -> &str {
        "local-fs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blob_and_content_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path().to_path_buf()).unwrap();
        let id = Uuid::new_v4();

        store
            .store_blob(&id, &FileType::Txt, b"raw bytes")
            .await
            .unwrap();
        store.store_content(&id, "extracted text").await.unwrap();

        assert_eq!(
            store.load_blob(&id, &FileType::Txt).await.unwrap(),
            b"raw bytes"
        );
        assert_eq!(store.load_content(&id).await.unwrap(), "extracted text");
        assert!(store.content_exists(&id).await.unwrap());

        store.delete(&id, &FileType::Txt).await.unwrap();
        assert!(!store.content_exists(&id).await.unwrap());
    }

    #[tokio::test]
    async fn missing_content_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path().to_path_buf()).unwrap();

        let err = store.load_content(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
