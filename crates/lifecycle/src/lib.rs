//! # Lifecycle
//!
//! 采集运行的生命周期控制。
//!
//! 负责：
//! - 创建队列与停止标志
//! - 按顺序准备相机 (失败时逆序回滚，不启动任何线程)
//! - 启动生产者线程与同步线程
//! - 先 join 同步线程，再置位停止标志并 join 生产者
//! - 所有线程退出后释放相机
//!
//! ## 使用示例
//!
//! ```ignore
//! use camera_factory::{ImageNormalizer, MockCameraClient, RigFactory};
//! use lifecycle::{Lifecycle, LifecycleConfig};
//!
//! let lifecycle = Lifecycle::new(LifecycleConfig::from_blueprint(&blueprint));
//! let stop = lifecycle.stop_flag();
//! let report = lifecycle.run(&RigFactory::new(MockCameraClient::new()), ImageNormalizer, sink)?;
//! ```

mod controller;
mod error;
mod report;

pub use controller::{Lifecycle, LifecycleConfig};
pub use error::LifecycleError;
pub use report::{ProducerSummary, RunReport};
