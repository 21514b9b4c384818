//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Each camera stamps items with its own monotonic nanosecond clock (`u64`)
//! - Timestamps from different cameras are not comparable without an offset model
//! - `source_index` (0..N-1) identifies the producing camera

mod blueprint;
mod capture;
mod composite;
mod error;
mod frame;
mod item;
mod sink;
mod source_id;
mod stop;
mod sync_engine_config;

pub use blueprint::*;
pub use capture::{CaptureDriver, CaptureOutcome, FormatNormalizer};
pub use composite::*;
pub use error::*;
pub use frame::*;
pub use item::TimedItem;
pub use sink::RenderSink;
pub use source_id::SourceId;
pub use stop::StopFlag;
pub use sync_engine_config::*;
