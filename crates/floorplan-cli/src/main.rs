// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorplan CLI - extract floor plans from an IFC file
//!
//! ```text
//! floorplan <file.ifc> [--config cfg.json] [--json out.json] [--svg DIR] [--floor ID]
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use floorplan::canvas::{FloorPlanCanvas, SvgPainter};
use floorplan::{FloorGeometryMap, FloorPlanConfig, GeometryExtractor};
use floorplan_step::StepModel;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const USAGE: &str =
    "usage: floorplan <file.ifc> [--config cfg.json] [--json out.json] [--svg DIR] [--floor ID]";

/// SVG canvas size in pixels
const SVG_WIDTH: f64 = 1200.0;
const SVG_HEIGHT: f64 = 900.0;

#[derive(Debug, Default, PartialEq)]
struct Args {
    input: PathBuf,
    config: Option<PathBuf>,
    json: Option<PathBuf>,
    svg_dir: Option<PathBuf>,
    floor: Option<String>,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Args::default();
        let mut input = None;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .with_context(|| format!("{flag} needs a value\n{USAGE}"))
            };
            match arg.as_str() {
                "--config" => parsed.config = Some(value("--config")?.into()),
                "--json" => parsed.json = Some(value("--json")?.into()),
                "--svg" => parsed.svg_dir = Some(value("--svg")?.into()),
                "--floor" => parsed.floor = Some(value("--floor")?),
                "-h" | "--help" => bail!("{USAGE}"),
                flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
                _ if input.is_some() => bail!("more than one input file\n{USAGE}"),
                _ => input = Some(PathBuf::from(&arg)),
            }
        }
        parsed.input = input.with_context(|| format!("missing input file\n{USAGE}"))?;
        Ok(parsed)
    }
}

/// File-system safe name for a floor id
fn file_stem(floor_id: &str) -> String {
    floor_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn print_summary(floors: &FloorGeometryMap) {
    let mut sorted: Vec<_> = floors.values().collect();
    sorted.sort_by(|a, b| a.level.elevation.total_cmp(&b.level.elevation));
    for floor in sorted {
        println!(
            "{:<24} {:>8.2} m  {:>4} rooms  {:>10.1} m²",
            floor.level.name,
            floor.level.elevation,
            floor.get_room_count(),
            floor.get_total_area()
        );
    }
}

fn write_svgs(
    floors: Arc<FloorGeometryMap>,
    config: &FloorPlanConfig,
    dir: &Path,
    only: Option<&str>,
) -> Result<usize> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut canvas = FloorPlanCanvas::new(config.canvas.clone());
    canvas.resize(SVG_WIDTH, SVG_HEIGHT);
    canvas.set_floor_geometries(Arc::clone(&floors));

    let mut written = 0;
    for id in floors.keys() {
        if only.is_some_and(|only| only != id) {
            continue;
        }
        if !canvas.set_current_floor(id) {
            continue;
        }
        let mut svg = SvgPainter::new();
        canvas.paint(&mut svg);
        let path = dir.join(format!("{}.svg", file_stem(id)));
        std::fs::write(&path, svg.finish())
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote {}", path.display());
        written += 1;
    }
    Ok(written)
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => FloorPlanConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FloorPlanConfig::default(),
    };

    let model = StepModel::open(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?
        .with_max_placement_depth(config.extraction.max_placement_depth);

    let mut extractor = GeometryExtractor::new(&model, config.extraction.clone());
    let mut last_percent = None;
    let mut progress = |message: &str, percent: u8| {
        if last_percent != Some(percent) {
            log::info!("[{percent:>3}%] {message}");
            last_percent = Some(percent);
        }
    };
    let mut floors = extractor.extract_floor_geometry(Some(&mut progress))?;

    if let Some(only) = &args.floor {
        if !floors.contains_key(only) {
            let known: Vec<&str> = floors.keys().map(String::as_str).collect();
            bail!("no floor with id {only} (known: {})", known.join(", "));
        }
        floors.retain(|id, _| id == only);
    }

    print_summary(&floors);
    let report = extractor.report();
    if !report.spaces_without_geometry.is_empty() {
        log::warn!(
            "{} spaces without usable geometry",
            report.spaces_without_geometry.len()
        );
    }
    log::debug!("Strategy successes: {:?}", report.tier_successes);

    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&floors)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote {}", path.display());
    }

    if let Some(dir) = &args.svg_dir {
        let count = write_svgs(Arc::new(floors), &config, dir, args.floor.as_deref())?;
        println!("{count} SVG files written to {}", dir.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Args::parse(std::env::args().skip(1))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["house.ifc", "--svg", "out", "--floor", "st-1"]).unwrap();
        assert_eq!(parsed.input, PathBuf::from("house.ifc"));
        assert_eq!(parsed.svg_dir, Some(PathBuf::from("out")));
        assert_eq!(parsed.floor.as_deref(), Some("st-1"));
        assert_eq!(parsed.json, None);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&[]).is_err());
        assert!(args(&["a.ifc", "--json"]).is_err());
        assert!(args(&["a.ifc", "--bogus"]).is_err());
        assert!(args(&["a.ifc", "b.ifc"]).is_err());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("2O2Fr$t4X7Zf8NOew3FLOH"), "2O2Fr_t4X7Zf8NOew3FLOH");
        assert_eq!(file_stem("level-0"), "level-0");
    }
}
