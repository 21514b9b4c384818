//! Mock e2e 测试
//!
//! mock 相机 → ImageNormalizer → 同步 → 渲染，覆盖完整生命周期。

use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use camera_factory::{DeviceEvent, ImageNormalizer, MockCameraClient, MockClientConfig, RigFactory};
use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{DisplayFormat, PixelFormat, RigBlueprint, SinkType, StopFlag, SyncPolicy};
use lifecycle::{Lifecycle, LifecycleConfig};
use render::{create_sink_set, spawn_quit_listener, PreviewSink, QuitSignal, SinkSet};

use crate::support::RecordingSink;

fn blueprint(sources: usize, frequency_hz: f64) -> RigBlueprint {
    let mut blueprint = RigBlueprint::with_sources(sources);
    blueprint.rig.display = DisplayFormat {
        width: 8,
        height: 6,
        format: PixelFormat::Rgb8,
    };
    for source in &mut blueprint.sources {
        source.frequency_hz = frequency_hz;
        source.capture_timeout_ms = 50;
    }
    blueprint
}

fn factory(config: MockClientConfig) -> RigFactory<MockCameraClient> {
    RigFactory::new(MockCameraClient::with_config(MockClientConfig {
        width: 16,
        height: 12,
        ..config
    }))
}

/// Raise `stop` after `after` unless the run already finished
fn watchdog(stop: StopFlag, after: Duration) {
    thread::spawn(move || {
        thread::sleep(after);
        stop.raise();
    });
}

fn assert_all_released(factory: &RigFactory<MockCameraClient>, sources: usize) {
    let events = factory.client().events();
    for index in 0..sources {
        assert!(events.contains(&DeviceEvent::Ended(index)), "cam{index} not ended");
        assert!(events.contains(&DeviceEvent::Deinit(index)), "cam{index} not released");
    }
}

#[test]
fn test_quit_key_ends_run_and_releases_cameras() {
    let factory = factory(MockClientConfig::default());
    let quit = QuitSignal::new();

    let mut sinks = SinkSet::new(quit.clone());
    let preview = PreviewSink::new("preview");
    let handle = preview.handle();
    sinks.push(preview);

    let lifecycle = Lifecycle::new(LifecycleConfig::from_blueprint(&blueprint(4, 200.0)));
    watchdog(lifecycle.stop_flag(), Duration::from_secs(10));

    let listener = spawn_quit_listener(Cursor::new("q\n"), quit.clone()).unwrap();
    listener.join().unwrap();
    assert!(quit.is_raised());

    let report = lifecycle.run(&factory, ImageNormalizer, sinks).unwrap();

    assert!(report.sync.composites() >= 1);
    assert!(report.is_clean());
    assert_eq!(report.producers.len(), 4);
    assert_all_released(&factory, 4);

    // 4 路 → 2x2 网格，每格 8x6
    let latest = handle.latest().unwrap();
    assert_eq!(latest.dimensions(), (16, 12));
    assert!(handle.frame_count() >= 1);
}

#[test]
fn test_configured_sinks_run_to_composite_limit() {
    let factory = factory(MockClientConfig::default());
    let mut blueprint = blueprint(3, 200.0);
    blueprint.sync.max_composites = Some(8);
    assert!(blueprint.sinks.iter().all(|sink| sink.sink_type == SinkType::Log));

    let sinks = create_sink_set(&blueprint.sinks, QuitSignal::new()).unwrap();
    let lifecycle = Lifecycle::new(LifecycleConfig::from_blueprint(&blueprint));
    watchdog(lifecycle.stop_flag(), Duration::from_secs(10));

    let report = lifecycle.run(&factory, ImageNormalizer, sinks).unwrap();

    assert_eq!(report.sync.composites(), 8);
    assert_eq!(report.sync.render_failures(), 0);
    let metrics = report.sync.sink.metrics();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].1.write_count, 8);
    assert!(report.is_clean());
    assert_all_released(&factory, 3);
}

#[test]
fn test_incomplete_frames_do_not_stall_run() {
    let factory = factory(MockClientConfig {
        incomplete_every: Some(3),
        ..Default::default()
    });
    let mut blueprint = blueprint(2, 200.0);
    blueprint.sync.max_composites = Some(6);

    let lifecycle = Lifecycle::new(LifecycleConfig::from_blueprint(&blueprint));
    watchdog(lifecycle.stop_flag(), Duration::from_secs(10));

    let report = lifecycle
        .run(&factory, ImageNormalizer, RecordingSink::default())
        .unwrap();

    assert_eq!(report.sync.composites(), 6);
    let incomplete: u64 = report
        .producers
        .iter()
        .map(|producer| producer.captures.incomplete)
        .sum();
    assert!(incomplete > 0);
    assert!(report.is_clean());
}

#[test]
fn test_time_window_corrects_clock_offsets() {
    const OFFSET_NS: i64 = 20_000_000;

    let factory = factory(MockClientConfig::default());
    let mut blueprint = blueprint(2, 100.0);
    blueprint.sources[1].clock_offset_ns = -OFFSET_NS;
    blueprint.sync.policy = SyncPolicy::TimeWindow;
    // 两路相位任意，半个周期的容差保证总能配对
    blueprint.sync.window.tolerance_ns = 5_000_000;
    blueprint.sync.max_composites = Some(5);

    let lifecycle = Lifecycle::new(LifecycleConfig::from_blueprint(&blueprint));
    watchdog(lifecycle.stop_flag(), Duration::from_secs(10));

    let report = lifecycle
        .run(&factory, ImageNormalizer, RecordingSink::default())
        .unwrap();

    assert_eq!(report.sync.composites(), 5);
    for offsets in &report.sync.sink.offsets {
        let raw = offsets[1];
        assert!(
            (OFFSET_NS - 5_000_000..=OFFSET_NS + 5_000_000).contains(&raw),
            "raw offset {raw} outside corrected window"
        );
    }
    assert!(report.is_clean());
    assert_all_released(&factory, 2);
}

#[test]
fn test_external_stop_with_lagging_camera() {
    let factory = Arc::new(factory(MockClientConfig::default()));
    let mut blueprint = blueprint(3, 200.0);
    blueprint.sources[2].frequency_hz = 5.0;

    let lifecycle = Lifecycle::new(LifecycleConfig::from_blueprint(&blueprint));
    let stop = lifecycle.stop_flag();

    let runner = {
        let factory = Arc::clone(&factory);
        thread::spawn(move || lifecycle.run(&*factory, ImageNormalizer, RecordingSink::default()))
    };

    thread::sleep(Duration::from_millis(300));
    stop.raise();

    let report = runner.join().unwrap().unwrap();
    assert!(report.is_clean());
    assert!(report.sync.sink.closed);
    assert!(report.sync.cycles_abandoned() > 0);
    assert_all_released(&factory, 3);
}

const BENCH_TOML: &str = r#"
[rig]
name = "bench"

[rig.display]
width = 8
height = 6
format = "rgb8"

[[sources]]
id = "left"
frequency_hz = 200.0
capture_timeout_ms = 50

[[sources]]
id = "right"
frequency_hz = 200.0
capture_timeout_ms = 50

[sync]
max_composites = 4

[[sinks]]
name = "log"
sink_type = "log"

[[sinks]]
name = "preview"
sink_type = "preview"
"#;

#[test]
fn test_blueprint_from_toml_drives_run() {
    let blueprint = ConfigLoader::load_from_str(BENCH_TOML, ConfigFormat::Toml).unwrap();
    assert_eq!(blueprint.source_count(), 2);

    let factory = factory(MockClientConfig::default());
    let sinks = create_sink_set(&blueprint.sinks, QuitSignal::new()).unwrap();
    assert_eq!(sinks.len(), 2);

    let lifecycle = Lifecycle::new(LifecycleConfig::from_blueprint(&blueprint));
    watchdog(lifecycle.stop_flag(), Duration::from_secs(10));

    let report = lifecycle.run(&factory, ImageNormalizer, sinks).unwrap();

    assert_eq!(report.sync.composites(), 4);
    let ids: Vec<&str> = report.producers.iter().map(|p| p.source_id.as_str()).collect();
    assert_eq!(ids, vec!["left", "right"]);
    for (_, metrics) in report.sync.sink.metrics() {
        assert_eq!(metrics.write_count, 4);
    }
    assert_all_released(&factory, 2);
}
