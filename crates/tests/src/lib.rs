//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 同步性质测试 (exactly-once、放弃即丢弃、队列增长、网格布局、关闭、时间偏移、不完整帧)
//! - 模拟 e2e 测试 (mock 相机 → 归一化 → 同步 → 渲染，无需硬件)

#[cfg(test)]
mod support;

#[cfg(test)]
mod properties;

#[cfg(test)]
mod e2e_tests;
