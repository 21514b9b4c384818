//! 采集/同步指标收集模块
//!
//! 所有 `camsync_*` 指标名集中定义于此，各 crate 通过这里的函数记录。

use std::collections::BTreeMap;

use contracts::{SourceId, SyncDiagnostics};
use metrics::{counter, gauge, histogram};

/// 记录一个成功入队的帧
pub fn record_item_enqueued(source: &str) {
    counter!("camsync_items_enqueued_total", "source" => source.to_string()).increment(1);
}

/// 记录一次被丢弃的采集 (timeout / incomplete / trigger_error / capture_error / convert_error)
pub fn record_capture_dropped(source: &str, reason: &'static str) {
    counter!(
        "camsync_capture_dropped_total",
        "source" => source.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// 记录队列深度
pub fn record_queue_depth(source: &str, depth: usize) {
    gauge!("camsync_queue_depth", "source" => source.to_string()).set(depth as f64);
}

/// 记录一次合成帧输出
///
/// `sources` 按 source index 排列，用作时间偏移的标签。
pub fn record_composite(diagnostics: &SyncDiagnostics, sources: &[SourceId]) {
    counter!("camsync_composites_total").increment(1);

    for (source, offset) in sources.iter().zip(&diagnostics.offsets_ns) {
        gauge!("camsync_timestamp_offset_ns", "source" => source.to_string())
            .set(*offset as f64);
    }

    histogram!("camsync_max_offset_ns").record(diagnostics.max_abs_offset_ns() as f64);
}

/// 记录一次放弃的同步轮次
pub fn record_cycle_abandoned(discarded: usize) {
    counter!("camsync_cycles_abandoned_total").increment(1);
    if discarded > 0 {
        counter!("camsync_items_discarded_total").increment(discarded as u64);
    }
}

/// 记录时间窗口匹配中被跳过的过期帧
pub fn record_items_discarded(count: usize) {
    if count > 0 {
        counter!("camsync_items_discarded_total").increment(count as u64);
    }
}

/// 记录 sink 渲染结果
pub fn record_render(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "camsync_render_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 运行期聚合器
///
/// 在内存中聚合每轮同步结果，运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RunAggregator {
    /// 合成帧总数
    pub composites: u64,

    /// 放弃的轮次
    pub cycles_abandoned: u64,

    /// 因放弃轮次而丢弃的帧
    pub items_discarded: u64,

    /// 渲染失败次数
    pub render_failures: u64,

    /// 每个合成帧的最大时间偏移 (毫秒)
    pub max_offset_stats: RunningStats,

    /// 各相机相对 source 0 的时间偏移 (毫秒, 绝对值)
    pub offset_stats: BTreeMap<usize, RunningStats>,
}

impl RunAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个合成帧
    pub fn record_composite(&mut self, diagnostics: &SyncDiagnostics) {
        self.composites += 1;
        self.max_offset_stats
            .push(ns_to_ms(diagnostics.max_abs_offset_ns()));

        for (index, offset) in diagnostics.offsets_ns.iter().enumerate().skip(1) {
            self.offset_stats
                .entry(index)
                .or_default()
                .push(ns_to_ms(offset.unsigned_abs()));
        }
    }

    /// 记录一次放弃的轮次
    pub fn record_abandoned(&mut self, discarded: usize) {
        self.cycles_abandoned += 1;
        self.items_discarded += discarded as u64;
    }

    /// 记录成功轮次中被跳过的帧
    pub fn record_discarded(&mut self, discarded: usize) {
        self.items_discarded += discarded as u64;
    }

    /// 记录一次渲染失败
    pub fn record_render_failure(&mut self) {
        self.render_failures += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> RunSummary {
        let attempts = self.composites + self.cycles_abandoned;
        RunSummary {
            composites: self.composites,
            cycles_abandoned: self.cycles_abandoned,
            items_discarded: self.items_discarded,
            render_failures: self.render_failures,
            abandon_rate: if attempts > 0 {
                self.cycles_abandoned as f64 / attempts as f64 * 100.0
            } else {
                0.0
            },
            max_offset_ms: StatsSummary::from(&self.max_offset_stats),
            source_offsets_ms: self
                .offset_stats
                .iter()
                .map(|(index, stats)| (*index, StatsSummary::from(stats)))
                .collect(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn ns_to_ms(ns: u64) -> f64 {
    ns as f64 / 1_000_000.0
}

/// 运行摘要
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub composites: u64,
    pub cycles_abandoned: u64,
    pub items_discarded: u64,
    pub render_failures: u64,
    pub abandon_rate: f64,
    pub max_offset_ms: StatsSummary,
    pub source_offsets_ms: BTreeMap<usize, StatsSummary>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Sync Run Summary ===")?;
        writeln!(f, "Composites: {}", self.composites)?;
        writeln!(
            f,
            "Abandoned cycles: {} ({:.2}%)",
            self.cycles_abandoned, self.abandon_rate
        )?;
        writeln!(f, "Discarded items: {}", self.items_discarded)?;
        writeln!(f, "Render failures: {}", self.render_failures)?;
        writeln!(f, "Max offset per composite (ms): {}", self.max_offset_ms)?;

        if !self.source_offsets_ms.is_empty() {
            writeln!(f, "Offset vs source 0 (ms):")?;
            for (index, stats) in &self.source_offsets_ms {
                writeln!(f, "  source {}: {}", index, stats)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
