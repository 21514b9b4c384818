//! # Sync Engine
//!
//! Consumer side of the multi-camera synchronizer.
//!
//! 负责：
//! - 每轮从每个相机队列收集一帧 (lockstep 或时间窗口匹配)
//! - 计算相对 source 0 的时间偏移诊断
//! - 组合为近似正方形网格并交给渲染 sink
//! - 停止标志被置位后退出
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::SynchronizerLoop;
//!
//! let sync = SynchronizerLoop::new(queues, sink, stop.clone(), blueprint.to_sync_engine_config())?
//!     .with_source_ids(blueprint.source_ids());
//! let handle = sync.spawn()?;
//!
//! let report = handle.join()?;
//! println!("{}", report.summary);
//! ```

mod buffer;
mod collector;
mod engine;
mod error;
mod grid;

pub use buffer::WindowBuffer;
pub use collector::{collect_lockstep, Collection, Collector, WindowCollector};
pub use contracts::{SyncEngineConfig, SyncPolicy, WindowConfig};
pub use engine::{CycleOutcome, SyncReport, SynchronizerHandle, SynchronizerLoop};
pub use error::SyncError;
pub use grid::compose;
