//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{RigBlueprint, SourceId};
use std::time::Duration;
use tracing::info;

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let blueprint = load_blueprint(args)?;

    info!(
        rig = %blueprint.rig.name,
        sources = blueprint.source_count(),
        policy = ?blueprint.sync.policy,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
        quit_key: args.quit_key,
        incomplete_every: args.incomplete_every,
    };

    info!("Starting cameras...");
    let report = Pipeline::new(pipeline_config)
        .run()
        .await
        .context("Synchronizer run failed")?;

    println!("\n{report}");

    info!("camsync finished");
    Ok(())
}

/// Load the configuration file and apply CLI overrides
///
/// A missing file is accepted only when `--sources` is given; defaults are
/// used in that case.
pub(crate) fn load_blueprint(args: &RunArgs) -> Result<RigBlueprint> {
    let mut blueprint = if args.config.exists() {
        info!(config = %args.config.display(), "Loading configuration");
        config_loader::ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
    } else if let Some(count) = args.sources {
        info!(
            config = %args.config.display(),
            sources = count,
            "Configuration file not found, using defaults"
        );
        RigBlueprint::with_sources(count)
    } else {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    };

    if let Some(count) = args.sources {
        if count != blueprint.source_count() {
            info!(
                from = blueprint.source_count(),
                to = count,
                "Overriding camera count from CLI"
            );
            resize_sources(&mut blueprint, count);
        }
    }

    if args.max_frames > 0 {
        info!(max_frames = args.max_frames, "Overriding max composites from CLI");
        blueprint.sync.max_composites = Some(args.max_frames);
    }

    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after CLI overrides")?;

    Ok(blueprint)
}

/// Truncate or extend the camera list; new cameras copy the first camera's
/// settings with a fresh id and no clock offset
fn resize_sources(blueprint: &mut RigBlueprint, count: usize) {
    let template = blueprint.sources.first().cloned();
    blueprint.sources.truncate(count);

    while blueprint.sources.len() < count {
        let id = SourceId::for_index(blueprint.sources.len());
        let source = match &template {
            Some(template) => {
                let mut source = template.clone();
                source.id = id;
                source.clock_offset_ns = 0;
                source
            }
            None => contracts::SourceConfig::new(id),
        };
        blueprint.sources.push(source);
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RigBlueprint) {
    let display = &blueprint.rig.display;

    println!("\n=== Configuration Summary ===\n");
    println!("Rig: {}", blueprint.rig.name);
    println!(
        "  Display: {}x{} {:?}",
        display.width, display.height, display.format
    );

    println!("\nCameras ({}):", blueprint.source_count());
    for source in &blueprint.sources {
        println!(
            "  - {} ({} Hz, timeout {} ms, offset {} ns, {:?} trigger)",
            source.id,
            source.frequency_hz,
            source.capture_timeout_ms,
            source.clock_offset_ns,
            source.trigger.mode
        );
    }

    let sync = &blueprint.sync;
    println!("\nSync Settings:");
    println!("  Policy: {:?}", sync.policy);
    println!("  Poll interval: {} ms", sync.poll_interval_ms);
    println!("  Depth warning: {}", sync.depth_warning);
    if let Some(max) = sync.max_composites {
        println!("  Max composites: {max}");
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
