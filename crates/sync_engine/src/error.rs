//! Sync Engine 错误类型

use thiserror::Error;

/// Sync Engine 错误
#[derive(Debug, Error)]
pub enum SyncError {
    /// 没有任何相机队列
    #[error("synchronizer needs at least one source queue")]
    NoSources,

    /// 队列数量与配置不符
    #[error("expected {expected} source queues, got {actual}")]
    SourceCountMismatch { expected: usize, actual: usize },

    /// 同步线程创建失败
    #[error("failed to spawn synchronizer thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// 同步线程 panic
    #[error("synchronizer thread panicked")]
    Panicked,
}
