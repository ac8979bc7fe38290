use crate::core::config::TEMP_ARTIFACT_PREFIX;
use crate::core::types::ImageKind;
use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

pub mod local;

/// ストレージ内のアイテムを表す構造体
#[derive(Debug, Clone)]
pub struct StorageItem {
    /// アイテムの識別子（ローカルならパス）
    pub id: String,
    /// アイテム名（ファイル名）
    pub name: String,
    /// アイテムがディレクトリかどうか
    pub is_directory: bool,
    /// 拡張子（あれば）
    pub extension: Option<String>,
}

impl StorageItem {
    /// 変換処理が残した一時ファイルかどうか
    pub fn is_temp_artifact(&self) -> bool {
        !self.is_directory && self.name.starts_with(TEMP_ARTIFACT_PREFIX)
    }
}

/// ストレージバックエンドのトレイト
#[automock]
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// ディレクトリ直下のアイテムをリストする（順序はバックエンド依存）
    async fn list_items(&self, prefix: &str) -> Result<Vec<StorageItem>>;

    /// アイテムが存在するかチェック
    async fn exists(&self, id: &str) -> Result<bool>;

    /// アイテムを削除する
    async fn delete_item(&self, id: &str) -> Result<()>;

    /// 比較対象の画像ファイルかどうかを判定（jpg, jpeg, png, gif）
    fn is_image_file(&self, item: &StorageItem) -> bool {
        if item.is_directory {
            return false;
        }

        item.extension
            .as_deref()
            .and_then(ImageKind::from_extension)
            .is_some()
    }
}
