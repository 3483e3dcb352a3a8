use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use polypath_core::{
    EarClipping, FunnelSnapshot, PlannerOptions, Point, PolygonInput, ShortestPathPlanner, StepOutcome,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "polypath", version, about = "Shortest path between two points inside a simple polygon")]
pub struct Args {
    /// JSON file with `{"vertices": [[x, y], ...]}`
    #[arg(long = "polygon", value_name = "PATH")]
    pub polygon: PathBuf,

    #[arg(long = "start", value_name = "X,Y", value_parser = parse_point)]
    pub start: Point,

    #[arg(long = "target", value_name = "X,Y", value_parser = parse_point)]
    pub target: Point,

    /// Write the result here instead of stdout
    #[arg(long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Emit one JSON line per funnel step before the result
    #[arg(long = "steps", default_value_t = false)]
    pub steps: bool,

    #[arg(long = "max-vertices", value_name = "N")]
    pub max_vertices: Option<usize>,

    /// Run the grid separation check on integer polygons
    #[arg(long = "validate", default_value_t = false)]
    pub validate: bool,
}

impl Args {
    pub fn planner_options(&self) -> PlannerOptions {
        let mut options = PlannerOptions::default();
        if let Some(n) = self.max_vertices {
            options.max_vertices = n;
        }
        options.validate_polygon = self.validate;
        options
    }
}

/// Parses `X,Y`.
pub fn parse_point(s: &str) -> Result<Point> {
    let (x, y) = s.split_once(',').ok_or_else(|| anyhow!("expected X,Y, got {s:?}"))?;
    let x: f64 = x.trim().parse().with_context(|| format!("bad x coordinate in {s:?}"))?;
    let y: f64 = y.trim().parse().with_context(|| format!("bad y coordinate in {s:?}"))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(anyhow!("coordinates must be finite, got {s:?}"));
    }
    Ok(Point::new(x, y))
}

pub fn load_polygon(path: &Path) -> Result<PolygonInput> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse polygon JSON in {}", path.display()))
}

#[derive(Serialize)]
struct StepLine<'a> {
    step: usize,
    outcome: &'a StepOutcome,
    funnel: &'a FunnelSnapshot,
}

/// Computes the path described by `args` and writes it to `out`.
pub fn run(args: &Args, out: &mut dyn Write) -> Result<()> {
    let input = load_polygon(&args.polygon)?;
    info!(vertices = input.vertices.len(), start = ?args.start, target = ?args.target, "polygon loaded");

    let planner = ShortestPathPlanner::new(&input.vertices, &EarClipping, args.planner_options())
        .with_context(|| format!("polygon in {} was not accepted", args.polygon.display()))?;
    let mut session = planner.session(args.start, args.target).context("failed to set up the funnel")?;

    let mut step = 0;
    loop {
        let outcome = session.step().with_context(|| format!("funnel step {step} failed"))?;
        if outcome == StepOutcome::Finished {
            break;
        }
        if args.steps {
            let snapshot = session.snapshot();
            let line = StepLine { step, outcome: &outcome, funnel: &snapshot };
            serde_json::to_writer(&mut *out, &line)?;
            writeln!(out)?;
        }
        step += 1;
    }

    let result = session.result()?;
    info!(points = result.path.len(), length = result.length, "path computed");
    if args.steps {
        serde_json::to_writer(&mut *out, &result)?;
        writeln!(out)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, &result)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_argument_parsing() {
        assert_eq!(parse_point("1.5, -2").unwrap(), Point::new(1.5, -2.0));
        assert!(parse_point("3").is_err());
        assert!(parse_point("a,1").is_err());
        assert!(parse_point("inf,1").is_err());
    }

    #[test]
    fn flags_map_to_options() {
        let args = Args::parse_from([
            "polypath", "--polygon", "p.json", "--start", "1,1", "--target", "2,2", "--max-vertices", "12", "--validate",
        ]);
        let options = args.planner_options();
        assert_eq!(options.max_vertices, 12);
        assert!(options.validate_polygon);
        assert!(args.out.is_none());

        let plain = Args::parse_from(["polypath", "--polygon", "p.json", "--start", "1,1", "--target", "2,2"]);
        assert!(!plain.planner_options().validate_polygon);
    }
}
