use super::{StorageBackend, StorageItem};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

/// ローカルファイルシステム用のストレージバックエンド
#[derive(Clone, Debug)]
pub struct LocalStorageBackend;

impl Default for LocalStorageBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStorageBackend {
    pub fn new() -> Self {
        Self
    }

    /// ディレクトリエントリをStorageItemに変換（拡張子はファイルのみ）
    async fn entry_to_item(entry: &tokio::fs::DirEntry) -> Result<StorageItem> {
        let path = entry.path();
        let metadata = entry
            .metadata()
            .await
            .with_context(|| format!("Failed to stat entry: {}", path.display()))?;

        let extension = metadata
            .is_file()
            .then(|| path.extension().map(|e| e.to_string_lossy().into_owned()))
            .flatten();

        Ok(StorageItem {
            id: path.to_string_lossy().into_owned(),
            name: entry.file_name().to_string_lossy().into_owned(),
            is_directory: metadata.is_dir(),
            extension,
        })
    }
}

#[async_trait]
impl StorageBackend for LocalStorageBackend {
    async fn list_items(&self, directory: &str) -> Result<Vec<StorageItem>> {
        let mut reader = tokio::fs::read_dir(directory)
            .await
            .with_context(|| format!("Failed to read directory: {directory}"))?;

        let mut items = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .with_context(|| format!("Failed to read entry in: {directory}"))?
        {
            // 列挙中に消えたファイルは無視する
            if let Ok(item) = Self::entry_to_item(&entry).await {
                items.push(item);
            }
        }

        Ok(items)
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        tokio::fs::try_exists(id)
            .await
            .with_context(|| format!("Failed to check existence: {id}"))
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        let path = Path::new(id);
        if path.is_dir() {
            anyhow::bail!("Cannot delete directory using delete_item: {id}");
        }
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to delete file: {id}"))?;
        Ok(())
    }
}
