use std::io::Write;

use clap::Parser;
use polypath_cli::{load_polygon, run, Args};
use serde_json::Value;
use tempfile::NamedTempFile;

fn polygon_file(json: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(json.as_bytes()).unwrap();
    f
}

fn args(path: &std::path::Path, extra: &[&str]) -> Args {
    let mut argv = vec!["polypath", "--polygon", path.to_str().unwrap(), "--start", "5,1", "--target", "1,5"];
    argv.extend_from_slice(extra);
    Args::parse_from(argv)
}

const L_SHAPE: &str = r#"{"vertices": [[0,0],[6,0],[6,2],[2,2],[2,6],[0,6]]}"#;

#[test]
fn writes_the_path_result() {
    let f = polygon_file(L_SHAPE);
    let mut out = Vec::new();
    run(&args(f.path(), &[]), &mut out).unwrap();
    let v: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["path"][1], serde_json::json!([2.0, 2.0]));
    assert_eq!(v["triangle_count"], 4);
}

#[test]
fn steps_are_json_lines() {
    let f = polygon_file(L_SHAPE);
    let mut out = Vec::new();
    run(&args(f.path(), &["--steps"]), &mut out).unwrap();
    let lines: Vec<Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let (result, steps) = lines.split_last().unwrap();
    let diagonals = result["diagonals_crossed"].as_array().unwrap().len();
    assert_eq!(steps.len(), diagonals + 1);
    assert_eq!(steps[0]["step"], 0);
    assert_eq!(steps.last().unwrap()["outcome"]["kind"], "target");
    assert_eq!(steps.last().unwrap()["funnel"]["finalized"], true);
}

#[test]
fn bad_inputs_are_reported() {
    let f = polygon_file("{\"vertices\": 3}");
    assert!(load_polygon(f.path()).is_err());

    let f = polygon_file(L_SHAPE);
    let outside = Args::parse_from([
        "polypath", "--polygon", f.path().to_str().unwrap(), "--start", "5,1", "--target", "4,4",
    ]);
    let err = run(&outside, &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("not inside"));
}
