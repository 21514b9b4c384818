//! # Render
//!
//! 合成帧渲染模块。
//!
//! 负责：
//! - 将 `Composite<ImageFrame>` 拼接为网格图像
//! - Fan-out 到多个 sinks，单个 sink 失败不影响其他 sink
//! - 退出键监听 (`q`)

pub mod compositor;
pub mod error;
pub mod metrics;
pub mod quit;
pub mod set;
pub mod sinks;

pub use compositor::{compose_grid, frame_to_rgb};
pub use contracts::{Composite, ImageFrame, RenderSink};
pub use error::RenderError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use quit::{spawn_quit_listener, QuitSignal};
pub use set::{create_sink_set, SinkSet};
pub use sinks::{LogSink, PreviewHandle, PreviewSink};
