//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{RigBlueprint, SyncPolicy};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    rig: RigInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sources: Vec<SourceInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    sync_settings: SyncInfo,
}

#[derive(Serialize)]
struct RigInfo {
    name: String,
    display: String,
    source_count: usize,
    grid: String,
}

#[derive(Serialize)]
struct SourceInfo {
    id: String,
    frequency_hz: f64,
    capture_timeout_ms: u64,
    clock_offset_ns: i64,
    trigger_mode: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    attributes: std::collections::HashMap<String, String>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
}

#[derive(Serialize)]
struct SyncInfo {
    policy: SyncPolicy,
    poll_interval_ms: u64,
    depth_warning: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    tolerance_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_composites: Option<u64>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn grid_description(blueprint: &RigBlueprint) -> String {
    let layout = contracts::GridLayout::for_sources(blueprint.source_count());
    format!("{}x{}", layout.rows, layout.cols)
}

fn build_config_info(blueprint: &RigBlueprint, args: &InfoArgs) -> ConfigInfo {
    let display = &blueprint.rig.display;

    let sources = if args.sources {
        blueprint
            .sources
            .iter()
            .map(|s| SourceInfo {
                id: s.id.to_string(),
                frequency_hz: s.frequency_hz,
                capture_timeout_ms: s.capture_timeout_ms,
                clock_offset_ns: s.clock_offset_ns,
                trigger_mode: format!("{:?}", s.trigger.mode),
                attributes: s.attributes.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
            })
            .collect()
    } else {
        Vec::new()
    };

    let sync = &blueprint.sync;
    let sync_settings = SyncInfo {
        policy: sync.policy,
        poll_interval_ms: sync.poll_interval_ms,
        depth_warning: sync.depth_warning,
        tolerance_ns: (sync.policy == SyncPolicy::TimeWindow).then_some(sync.window.tolerance_ns),
        max_composites: sync.max_composites,
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        rig: RigInfo {
            name: blueprint.rig.name.clone(),
            display: format!("{}x{} {:?}", display.width, display.height, display.format),
            source_count: blueprint.source_count(),
            grid: grid_description(blueprint),
        },
        sources,
        sinks,
        sync_settings,
    }
}

fn print_config_info(blueprint: &RigBlueprint, args: &InfoArgs) {
    let display = &blueprint.rig.display;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  camsync Configuration                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🎥 Rig");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Name: {}", blueprint.rig.name);
    println!(
        "   ├─ Display: {}x{} {:?}",
        display.width, display.height, display.format
    );
    println!("   └─ Grid: {}", grid_description(blueprint));

    println!("\n📷 Cameras ({})", blueprint.source_count());
    for (i, source) in blueprint.sources.iter().enumerate() {
        let is_last = i == blueprint.sources.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };

        if args.sources {
            println!(
                "   {} [{}] {} ({} Hz, timeout {} ms, offset {} ns, {:?})",
                prefix,
                i,
                source.id,
                source.frequency_hz,
                source.capture_timeout_ms,
                source.clock_offset_ns,
                source.trigger.mode
            );
        } else {
            println!("   {} [{}] {}", prefix, i, source.id);
        }
    }

    let sync = &blueprint.sync;
    println!("\n⚙️  Sync Settings");
    println!("   ├─ Policy: {:?}", sync.policy);
    if sync.policy == SyncPolicy::TimeWindow {
        println!(
            "   ├─ Window: tolerance {} ns, depth {}",
            sync.window.tolerance_ns, sync.window.depth
        );
    }
    println!("   ├─ Poll Interval: {} ms", sync.poll_interval_ms);
    match sync.max_composites {
        Some(max) => println!("   └─ Max Composites: {}", max),
        None => println!("   └─ Max Composites: unlimited"),
    }

    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_includes_requested_sections() {
        let blueprint = RigBlueprint::with_sources(3);
        let args = InfoArgs {
            config: "unused.toml".into(),
            json: true,
            sources: true,
            sinks: false,
        };

        let info = build_config_info(&blueprint, &args);
        assert_eq!(info.sources.len(), 3);
        assert!(info.sinks.is_empty());
        assert_eq!(info.rig.grid, "2x2");
        assert_eq!(info.sync_settings.tolerance_ns, None);
    }
}
