//! Lifecycle 错误类型

use camera_factory::CameraFactoryError;
use ingestion::IngestionError;
use sync_engine::SyncError;
use thiserror::Error;

/// Lifecycle 错误
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// 运行配置不一致
    #[error("invalid run configuration: {message}")]
    Config { message: String },

    /// 相机准备失败 (已回滚)
    #[error("camera setup failed: {0}")]
    Setup(#[from] CameraFactoryError),

    /// 生产者线程创建失败
    #[error("producer failed: {0}")]
    Producer(#[from] IngestionError),

    /// 同步线程创建失败或 panic
    #[error("synchronizer failed: {0}")]
    Sync(#[from] SyncError),
}

impl LifecycleError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
