//! 同步性质测试
//!
//! 每个测试覆盖一条运行时保证，只使用 scripted 驱动和手动填充的队列。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    GridLayout, ImageFrame, PixelFormat, ProducerConfig, StopFlag, SyncEngineConfig, TimedItem,
};
use ingestion::{
    CaptureMetrics, FrameTag, ItemQueue, ProducerLoop, ScriptStep, ScriptedDriver, SourceQueue,
    StepOutcome, TagNormalizer,
};
use render::compose_grid;
use sync_engine::{compose, CycleOutcome, SynchronizerLoop};

use crate::support::{push_frame, queues, tiny_frame, wait_until, RecordingSink};

const WAIT: Duration = Duration::from_secs(5);

fn drain<P>(queue: &ItemQueue<P>) -> Vec<u64> {
    std::iter::from_fn(|| queue.try_pop())
        .map(|item| item.timestamp())
        .collect()
}

#[test]
fn test_each_item_consumed_at_most_once() {
    const SOURCES: usize = 3;
    const FRAMES: usize = 200;

    let queues = queues::<FrameTag>(SOURCES);
    let producer_stop = StopFlag::new();
    let sync_stop = StopFlag::new();
    let normalizer = Arc::new(TagNormalizer);

    let mut metrics = Vec::new();
    let mut producers = Vec::new();
    for (index, queue) in queues.iter().enumerate() {
        let source_id = format!("cam{index}");
        let driver = ScriptedDriver::periodic(&source_id, 0, 10, FRAMES);
        let captures = Arc::new(CaptureMetrics::new(source_id));
        let producer = ProducerLoop::new(
            index,
            driver,
            Arc::clone(&normalizer),
            Arc::clone(queue),
            producer_stop.clone(),
            ProducerConfig::default(),
        )
        .with_metrics(Arc::clone(&captures));
        metrics.push(captures);
        producers.push(producer.spawn().unwrap());
    }

    let sync = SynchronizerLoop::new(
        queues.clone(),
        RecordingSink::default(),
        sync_stop.clone(),
        SyncEngineConfig::lockstep(SOURCES),
    )
    .unwrap()
    .spawn()
    .unwrap();

    assert!(wait_until(WAIT, || metrics
        .iter()
        .all(|m| m.snapshot().enqueued == FRAMES as u64)));
    producer_stop.raise();
    for producer in producers {
        producer.join().unwrap();
    }

    // 生产者已停止，同步线程继续消费直到队列中不再有完整帧集
    assert!(wait_until(WAIT, || queues.iter().any(|q| q.is_empty())));
    std::thread::sleep(Duration::from_millis(20));
    sync_stop.raise();
    let report = sync.join().unwrap();

    let rendered: Vec<(usize, u64)> = report.sink.composites.iter().flatten().copied().collect();
    let unique: HashSet<_> = rendered.iter().copied().collect();
    assert_eq!(unique.len(), rendered.len(), "an item was rendered twice");

    for composite in &report.sink.composites {
        let sources: Vec<usize> = composite.iter().map(|(source, _)| *source).collect();
        assert_eq!(sources, vec![0, 1, 2]);
    }

    let remaining: usize = queues.iter().map(|q| q.len()).sum();
    assert_eq!(
        rendered.len() + report.items_discarded() as usize + remaining,
        SOURCES * FRAMES
    );
    assert!(report.sink.closed);
}

#[test]
fn test_abandoned_cycle_discards_popped_items() {
    let queues = queues::<ImageFrame>(3);
    push_frame(&queues[0], 10, 1, 0);
    push_frame(&queues[2], 30, 3, 2);

    let mut sync = SynchronizerLoop::new(
        queues.clone(),
        RecordingSink::default(),
        StopFlag::new(),
        SyncEngineConfig::lockstep(3),
    )
    .unwrap();

    assert_eq!(
        sync.run_cycle(),
        CycleOutcome::Abandoned {
            missing_source: 1,
            discarded: 1
        }
    );
    assert!(queues[0].is_empty());
    assert_eq!(queues[2].len(), 1, "sources after the gap are untouched");

    push_frame(&queues[0], 11, 101, 0);
    push_frame(&queues[1], 21, 102, 1);
    assert_eq!(sync.run_cycle(), CycleOutcome::Rendered { cycle_id: 1 });

    assert_eq!(sync.sink().composites, vec![vec![(0, 101), (1, 102), (2, 3)]]);
    assert_eq!(sync.aggregator().items_discarded, 1);
    assert_eq!(sync.aggregator().cycles_abandoned, 1);
}

#[test]
fn test_queue_grows_without_consumer() {
    const FRAMES: usize = 100;

    let queue: ItemQueue<FrameTag> = Arc::new(SourceQueue::new());
    let stop = StopFlag::new();
    let driver = ScriptedDriver::periodic("cam0", 0, 1, FRAMES);
    let captures = Arc::new(CaptureMetrics::new("cam0"));

    let handle = ProducerLoop::new(
        0,
        driver,
        Arc::new(TagNormalizer),
        Arc::clone(&queue),
        stop.clone(),
        ProducerConfig::default(),
    )
    .with_metrics(Arc::clone(&captures))
    .spawn()
    .unwrap();

    let mut depths = Vec::new();
    assert!(wait_until(WAIT, || {
        depths.push(queue.len());
        captures.snapshot().enqueued == FRAMES as u64
    }));
    stop.raise();
    handle.join().unwrap();

    assert!(depths.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(queue.len(), FRAMES);
    assert!(queue.len() > 64);
}

#[test]
fn test_grid_layout_shapes() {
    let shapes: Vec<(usize, usize)> = [1, 2, 3, 4, 5, 9, 10, 16]
        .into_iter()
        .map(|n| {
            let layout = GridLayout::for_sources(n);
            (layout.rows, layout.cols)
        })
        .collect();
    assert_eq!(
        shapes,
        vec![(1, 1), (1, 2), (2, 2), (2, 2), (2, 3), (3, 3), (3, 4), (4, 4)]
    );
}

#[test]
fn test_three_sources_leave_bottom_right_blank() {
    let white = |source| {
        TimedItem::new(
            ImageFrame {
                width: 2,
                height: 2,
                format: PixelFormat::Rgb8,
                data: vec![255; 12].into(),
            },
            100,
            source,
        )
    };

    let composite = compose(1, vec![white(0), white(1), white(2)]).unwrap();
    assert_eq!(composite.layout, GridLayout { rows: 2, cols: 2 });
    assert_eq!(composite.blank_count(), 1);

    let image = compose_grid(&composite).unwrap();
    assert_eq!(image.dimensions(), (4, 4));
    assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255]);
    assert_eq!(image.get_pixel(3, 0).0, [255, 255, 255]);
    assert_eq!(image.get_pixel(0, 3).0, [255, 255, 255]);
    assert_eq!(image.get_pixel(2, 2).0, [0, 0, 0]);
    assert_eq!(image.get_pixel(3, 3).0, [0, 0, 0]);
}

#[test]
fn test_offsets_relative_to_first_source() {
    let queues = queues::<ImageFrame>(2);
    for (a, b) in [(100, 150), (200, 250), (300, 350)] {
        push_frame(&queues[0], 0, a, 0);
        push_frame(&queues[1], 0, b, 1);
    }

    let mut sync = SynchronizerLoop::new(
        queues,
        RecordingSink::default(),
        StopFlag::new(),
        SyncEngineConfig::lockstep(2),
    )
    .unwrap();

    for cycle_id in 1..=3 {
        assert_eq!(sync.run_cycle(), CycleOutcome::Rendered { cycle_id });
    }
    assert_eq!(sync.sink().offsets, vec![vec![0, 50]; 3]);
    assert_eq!(sync.aggregator().summary().max_offset_ms.count, 3);
}

#[test]
fn test_incomplete_capture_is_skipped() {
    let driver = ScriptedDriver::new(
        "cam2",
        vec![
            ScriptStep::Frame { timestamp: 100 },
            ScriptStep::Incomplete,
            ScriptStep::Frame { timestamp: 300 },
        ],
    );
    let triggers = driver.trigger_counter();
    let queue: ItemQueue<FrameTag> = Arc::new(SourceQueue::new());

    let mut producer = ProducerLoop::new(
        2,
        driver,
        Arc::new(TagNormalizer),
        Arc::clone(&queue),
        StopFlag::new(),
        ProducerConfig::default(),
    );

    let outcomes: Vec<_> = (0..3).map(|_| producer.step()).collect();
    assert_eq!(
        outcomes,
        vec![
            StepOutcome::Enqueued,
            StepOutcome::Incomplete,
            StepOutcome::Enqueued
        ]
    );
    assert_eq!(triggers.get(), 3);
    assert_eq!(drain(&queue), vec![100, 300]);

    let captures = producer.metrics().snapshot();
    assert_eq!(captures.enqueued, 2);
    assert_eq!(captures.incomplete, 1);
}

#[test]
fn test_blank_cells_match_first_frame() {
    let items = vec![
        TimedItem::new(tiny_frame(7), 1, 0),
        TimedItem::new(tiny_frame(8), 2, 1),
        TimedItem::new(tiny_frame(9), 3, 2),
        TimedItem::new(tiny_frame(6), 4, 3),
        TimedItem::new(tiny_frame(5), 5, 4),
    ];

    let composite = compose(1, items).unwrap();
    assert_eq!(composite.layout, GridLayout { rows: 2, cols: 3 });
    assert_eq!(composite.blank_count(), 1);
    let blank = composite.cells[5].payload();
    assert_eq!((blank.width, blank.height, blank.format), (1, 1, PixelFormat::Mono8));
    assert_eq!(&blank.data[..], &[0]);
}
