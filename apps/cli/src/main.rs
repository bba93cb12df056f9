// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bake-Lite CLI - dry-run a bake without a host application.
//!
//! Reads a scene file (definitions, instances, geometry, materials and
//! collection paths as JSON), bakes it into an in-memory host document and
//! prints the per-item report as JSON on stdout. Logs go to stderr.
//!
//! ```text
//! bake-lite scene.json --group-base Import --pretty
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use bake_lite_core::{Scene, SceneFile};
use bake_lite_engine::{BakeConfig, BakeOperation, MemoryDocument};
use bake_lite_geometry::ShapeConverter;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bake-lite", version, about)]
struct Args {
    /// Scene file (JSON)
    scene: PathBuf,

    /// Root group name for all collection groups (overrides BAKE_LITE_GROUP_BASE)
    #[arg(long)]
    group_base: Option<String>,

    /// Pretty-print the report
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Write the report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bake_lite_engine=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    let raw = std::fs::read_to_string(&args.scene)
        .with_context(|| format!("failed to read {}", args.scene.display()))?;
    let file: SceneFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", args.scene.display()))?;
    let scene = Scene::try_from(file).context("scene references do not resolve")?;

    let mut config = BakeConfig::from_env();
    if let Some(base) = args.group_base {
        config = config.with_group_base(base);
    }
    tracing::info!(
        scene = %args.scene.display(),
        template_category = %config.template_category,
        group_base = ?config.group_base_name,
        "Loaded scene"
    );

    let mut host = MemoryDocument::new();
    let mut converter = ShapeConverter::new();
    let report = BakeOperation::new(&mut host, &mut converter, config)
        .run(&scene, |label, fraction| {
            tracing::debug!(item = label, progress = fraction, "Baked");
        })
        .context("bake aborted")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }

    let calls = host.calls();
    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        templates = calls.publish_template,
        placements = calls.place,
        groups = calls.create_group,
        "Done"
    );
    Ok(())
}
