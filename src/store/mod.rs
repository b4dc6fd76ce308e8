pub mod database;
pub mod scroll;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use crate::models::ProgressRecord;

pub use database::{PlayDatabase, BUNDLED_PLAY, BUNDLED_PLAY_NAME};
pub use scroll::{Screen, ScrollPositions};

/// 存储错误；查不到记录不算错误，返回 `Ok(None)`
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 剧本原文存储，以剧本名为键
#[async_trait]
pub trait PlayStore: Send + Sync {
    async fn get_play(&self, name: &str) -> StoreResult<Option<String>>;

    /// 同名剧本会被覆盖
    async fn put_play(&self, name: &str, content: &str) -> StoreResult<()>;

    /// 同时删除该剧本的进度
    async fn delete_play(&self, name: &str) -> StoreResult<()>;

    /// 按名字升序
    async fn list_play_names(&self) -> StoreResult<Vec<String>>;

    /// 订阅剧本名列表，每次增删后收到新的完整列表
    fn subscribe_play_names(&self) -> watch::Receiver<Vec<String>>;
}

/// 排练进度存储，以剧本名为键
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get_progress(&self, play_name: &str) -> StoreResult<Option<ProgressRecord>>;

    async fn put_progress(&self, record: &ProgressRecord) -> StoreResult<()>;

    async fn delete_progress(&self, play_name: &str) -> StoreResult<()>;

    /// 上次打开的剧本
    async fn current_play(&self) -> StoreResult<Option<String>>;

    async fn set_current_play(&self, name: Option<&str>) -> StoreResult<()>;
}
