//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 生产者线程创建失败
    #[error("failed to spawn producer thread for source {source_id}: {source}")]
    Spawn {
        /// 相机 ID
        source_id: String,
        #[source]
        source: std::io::Error,
    },

    /// 生产者线程 panic，驱动无法回收
    #[error("producer thread for source {source_id} panicked")]
    Panicked {
        /// 相机 ID
        source_id: String,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
