//! RigBlueprint - Config Loader 输出
//!
//! 描述完整的采集配置：显示格式、相机列表、同步策略、渲染输出。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::{
    DisplayFormat, ProducerConfig, SourceId, SyncEngineConfig, SyncPolicy, WindowConfig,
};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的采集配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RigBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 全局设置
    #[serde(default)]
    pub rig: RigConfig,

    /// 相机列表 (顺序即 source index)
    #[validate(length(min = 1, message = "at least one source is required"))]
    #[validate(nested)]
    pub sources: Vec<SourceConfig>,

    /// 同步策略配置
    #[serde(default)]
    #[validate(nested)]
    pub sync: SyncConfig,

    /// 渲染输出配置
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

/// 全局设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigConfig {
    /// 名称 (日志/指标)
    #[serde(default = "default_rig_name")]
    pub name: String,

    /// 所有相机归一化到的统一显示格式
    #[serde(default)]
    pub display: DisplayFormat,
}

fn default_rig_name() -> String {
    "camsync".to_string()
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            name: default_rig_name(),
            display: DisplayFormat::default(),
        }
    }
}

/// 相机配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    /// 唯一标识符
    pub id: SourceId,

    /// 采集频率 (Hz)，mock 驱动使用，必须 > 0
    #[serde(default = "default_frequency_hz")]
    #[validate(range(exclusive_min = 0.0, message = "frequency_hz must be > 0"))]
    pub frequency_hz: f64,

    /// 单次等待采集结果的超时 (毫秒)
    #[serde(default = "default_capture_timeout_ms")]
    #[validate(range(min = 1, message = "capture_timeout_ms must be > 0"))]
    pub capture_timeout_ms: u64,

    /// 时钟修正量 (纳秒)：加到该相机时间戳上即得到参考时钟时间
    #[serde(default)]
    pub clock_offset_ns: i64,

    /// 触发配置
    #[serde(default)]
    pub trigger: TriggerConfig,

    /// 驱动特定属性
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

fn default_frequency_hz() -> f64 {
    30.0
}

fn default_capture_timeout_ms() -> u64 {
    1000
}

impl SourceConfig {
    /// 使用默认参数创建相机配置
    pub fn new(id: impl Into<SourceId>) -> Self {
        Self {
            id: id.into(),
            frequency_hz: default_frequency_hz(),
            capture_timeout_ms: default_capture_timeout_ms(),
            clock_offset_ns: 0,
            trigger: TriggerConfig::default(),
            attributes: HashMap::new(),
        }
    }
}

/// 触发配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// 触发模式
    #[serde(default)]
    pub mode: TriggerMode,

    /// 是否启用硬件时间戳
    #[serde(default = "default_timestamp_enabled")]
    pub timestamp_enabled: bool,

    /// 采集模式
    #[serde(default)]
    pub acquisition: AcquisitionMode,
}

fn default_timestamp_enabled() -> bool {
    true
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            mode: TriggerMode::default(),
            timestamp_enabled: true,
            acquisition: AcquisitionMode::default(),
        }
    }
}

/// 触发模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// 软件触发 (每次迭代执行一次 trigger)
    #[default]
    Software,
    /// 自由运行 (trigger 调用为空操作)
    FreeRun,
}

/// 采集模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    #[default]
    Continuous,
    SingleFrame,
}

/// 同步策略配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SyncConfig {
    /// 帧集收集策略
    #[serde(default)]
    pub policy: SyncPolicy,

    /// 放弃本轮后的休眠间隔 (毫秒)
    #[serde(default = "default_poll_interval_ms")]
    #[validate(range(min = 1, message = "poll_interval_ms must be > 0"))]
    pub poll_interval_ms: u64,

    /// 队列深度告警阈值
    #[serde(default = "default_depth_warning")]
    #[validate(range(min = 1, message = "depth_warning must be > 0"))]
    pub depth_warning: usize,

    /// 时间窗口匹配参数
    #[serde(default)]
    #[validate(nested)]
    pub window: WindowConfig,

    /// 输出指定数量的合成帧后停止 (None = 不限)
    #[serde(default)]
    pub max_composites: Option<u64>,
}

fn default_poll_interval_ms() -> u64 {
    1
}

fn default_depth_warning() -> usize {
    64
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            policy: SyncPolicy::default(),
            poll_interval_ms: default_poll_interval_ms(),
            depth_warning: default_depth_warning(),
            window: WindowConfig::default(),
            max_composites: None,
        }
    }
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink 名称
    #[validate(length(min = 1, message = "sink name cannot be empty"))]
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// 内存预览 (最新合成图)
    Preview,
}

impl RigBlueprint {
    /// 仅包含 N 个默认相机的蓝图
    pub fn with_sources(count: usize) -> Self {
        Self {
            version: ConfigVersion::V1,
            rig: RigConfig::default(),
            sources: (0..count)
                .map(|index| SourceConfig::new(SourceId::for_index(index)))
                .collect(),
            sync: SyncConfig::default(),
            sinks: vec![SinkConfig {
                name: "log".to_string(),
                sink_type: SinkType::Log,
                params: HashMap::new(),
            }],
        }
    }

    /// 相机数量 (N)
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// 按 source index 排列的相机 ID
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|source| source.id.clone()).collect()
    }

    /// 构建同步引擎配置
    pub fn to_sync_engine_config(&self) -> SyncEngineConfig {
        SyncEngineConfig {
            source_count: self.sources.len(),
            policy: self.sync.policy,
            poll_interval_ms: self.sync.poll_interval_ms,
            depth_warning: self.sync.depth_warning,
            window: self.sync.window.clone(),
            clock_offsets_ns: self
                .sources
                .iter()
                .map(|source| source.clock_offset_ns)
                .collect(),
            max_composites: self.sync.max_composites,
        }
    }

    /// 构建第 `index` 个相机的生产者配置
    pub fn to_producer_config(&self, index: usize) -> ProducerConfig {
        let capture_timeout_ms = self
            .sources
            .get(index)
            .map(|source| source.capture_timeout_ms)
            .unwrap_or_else(default_capture_timeout_ms);

        ProducerConfig {
            capture_timeout_ms,
            display: self.rig.display,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_blueprint() -> RigBlueprint {
        let mut blueprint = RigBlueprint::with_sources(3);
        blueprint.sources[1].clock_offset_ns = -50;
        blueprint.sources[2].capture_timeout_ms = 250;
        blueprint.sync.policy = SyncPolicy::TimeWindow;
        blueprint.sync.max_composites = Some(10);
        blueprint
    }

    #[test]
    fn sync_engine_config_from_blueprint() {
        let config = sample_blueprint().to_sync_engine_config();
        assert_eq!(config.source_count, 3);
        assert_eq!(config.policy, SyncPolicy::TimeWindow);
        assert_eq!(config.clock_offsets_ns, vec![0, -50, 0]);
        assert_eq!(config.max_composites, Some(10));
        assert_eq!(config.window.tolerance_ns, 1_000_000);
    }

    #[test]
    fn producer_config_per_source() {
        let blueprint = sample_blueprint();
        assert_eq!(blueprint.to_producer_config(0).capture_timeout_ms, 1000);
        assert_eq!(blueprint.to_producer_config(2).capture_timeout_ms, 250);
        assert_eq!(blueprint.to_producer_config(2).display.width, 640);
    }

    #[test]
    fn default_ids_follow_index() {
        let blueprint = RigBlueprint::with_sources(2);
        assert_eq!(blueprint.source_ids(), vec![SourceId::from("cam0"), "cam1".into()]);
    }

    #[test]
    fn validate_rejects_empty_sources() {
        let blueprint = RigBlueprint::with_sources(0);
        assert!(blueprint.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_frequency() {
        let mut blueprint = RigBlueprint::with_sources(1);
        blueprint.sources[0].frequency_hz = 0.0;
        assert!(blueprint.validate().is_err());
    }
}
