//! spatialdata-view - inspect how a SpatialData scene links into
//! coordinate systems.
//!
//! Loads a scene manifest, activates one coordinate system (or each one in
//! turn) and prints the resulting layer table.

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spatialdata_view::{
    config::{Config, OutputFormat},
    controller::{CoordinateSystemController, SharedController},
    layer::{LayerSummary, LinkReport, MemorySink},
    model::SceneManifest,
};

/// Layers of one activated coordinate system.
#[derive(Debug, Serialize)]
struct SystemReport {
    system: String,
    layers: Vec<LayerSummary>,
    issues: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let manifest = match SceneManifest::from_path(&config.manifest) {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let controller = SharedController::new(CoordinateSystemController::with_policy(
        MemorySink::new(),
        config.policy(),
    ));

    for object in manifest.objects {
        let report = controller.load_object(object).await;
        log_issues(&report);
    }

    hide_layers(&controller, &config.hide).await;

    let systems: Vec<String> = match config.coordinate_system {
        Some(ref system) => vec![system.clone()],
        None => controller
            .list_systems()
            .await
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };
    if systems.is_empty() {
        warn!("No coordinate system declared by the loaded objects");
    }

    let mut reports = Vec::with_capacity(systems.len());
    for system in systems {
        let report = match controller.switch_to(&system).await {
            Ok(report) => report,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        };
        log_issues(&report);

        reports.push(SystemReport {
            system,
            layers: controller.summaries().await,
            issues: report
                .issues
                .iter()
                .map(|issue| format!("{}: {}", issue.key, issue.error))
                .collect(),
        });
    }

    match config.format {
        OutputFormat::Table => print_tables(&reports),
        OutputFormat::Json => match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "spatialdata_view=debug"
    } else {
        "spatialdata_view=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn log_issues(report: &LinkReport) {
    for issue in &report.issues {
        warn!(element = %issue.key, "{}", issue.error);
    }
}

async fn hide_layers(controller: &SharedController<MemorySink>, names: &[String]) {
    for name in names {
        let hidden = controller
            .with(|c| {
                let key = c.layer_by_name(name).map(|r| r.key.clone())?;
                c.set_visibility(&key, false).ok()
            })
            .await;
        match hidden {
            Some(()) => info!(layer = %name, "Hiding layer"),
            None => warn!(layer = %name, "No layer with this name"),
        }
    }
}

fn print_tables(reports: &[SystemReport]) {
    for report in reports {
        println!("Coordinate system: {}", report.system);
        println!(
            "  {:<24} {:<8} {:<9} {:<7} {:<5} {:<10} REASON",
            "LAYER", "KIND", "DISPLAYED", "VISIBLE", "LEVEL", "SUBSAMPLED"
        );
        for layer in &report.layers {
            let level = layer
                .level
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<24} {:<8} {:<9} {:<7} {:<5} {:<10} {}",
                layer.layer,
                layer.kind.to_string(),
                layer.displayed,
                layer.visible,
                level,
                layer.subsampled,
                layer.reason.as_deref().unwrap_or("")
            );
        }
        for issue in &report.issues {
            println!("  ! {}", issue);
        }
        println!();
    }
}
