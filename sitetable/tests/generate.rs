use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use pretty_assertions::assert_eq;
use sitetable::{
    config::{Config, DuplicatePolicy},
    ser::WriteTable,
    Error, Site,
};

const MAP: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!-- Created with Inkscape (http://www.inkscape.org/) -->
<svg
   width="2048"
   height="1536"
   version="1.1"
   xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"
   xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd"
   xmlns:xlink="http://www.w3.org/1999/xlink"
   xmlns="http://www.w3.org/2000/svg"
   xmlns:svg="http://www.w3.org/2000/svg">
  <sodipodi:namedview id="namedview1" inkscape:zoom="0.5" />
  <image id="background" x="0" y="0" width="2048" height="1536" xlink:href="mira.png" />
  <g inkscape:groupmode="layer" id="nodeslayer" inkscape:label="Nodes">
    <image id="image12" inkscape:label="FN2" x="40" y="60" width="16" height="16" xlink:href="node.png" />
    <image id="image13" inkscape:label="NodeDecor" x="0" y="0" width="16" height="16" xlink:href="node.png" />
    <svg:image id="image14" inkscape:label="FN1" x="10" y="20" width="4" height="6" xlink:href="node.png" />
    <image id="image15" inkscape:label="FN101" x="1000" y="700" width="33" height="33" xlink:href="node.png" />
  </g>
</svg>
"#;

const TABLE: &str = "/* To update this file, run sitetable <path to map svg> <path to this cpp file> */

#include \"fnsite_ui.h\"

extern const std::unordered_map<FnSite::id_t, std::pair<int, int>> site_positions{
  {1, {12, 23}},
  {2, {48, 68}},
  {101, {1016, 716}},
};
";

/// Scratch directory unique to one test.
struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("sitetable-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.0.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn generate(drawing: &Path, output: &Path, config: &Config) -> Result<usize, Error> {
    sitetable::generate(drawing, config, WriteTable::create(output, config.table.clone()))
}

#[test]
fn writes_sorted_table() {
    let scratch = Scratch::new("sorted");
    let drawing = scratch.write("map.svg", MAP);
    let output = scratch.path("fnsite_ui.cpp");

    let written = generate(&drawing, &output, &Config::default()).unwrap();

    assert_eq!(written, 3);
    assert_eq!(fs::read_to_string(&output).unwrap(), TABLE);
}

#[test]
fn rerun_is_byte_identical() {
    let scratch = Scratch::new("rerun");
    let drawing = scratch.write("map.svg", MAP);
    let output = scratch.path("fnsite_ui.cpp");

    generate(&drawing, &output, &Config::default()).unwrap();
    let first = fs::read(&output).unwrap();
    generate(&drawing, &output, &Config::default()).unwrap();
    assert_eq!(fs::read(&output).unwrap(), first);
}

#[test]
fn overwrites_previous_output() {
    let scratch = Scratch::new("overwrite");
    let drawing = scratch.write("map.svg", MAP);
    let output = scratch.write("fnsite_ui.cpp", &"stale\n".repeat(1000));

    generate(&drawing, &output, &Config::default()).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), TABLE);
}

#[test]
fn read_sites_in_id_order() {
    let scratch = Scratch::new("read");
    let drawing = scratch.write("map.svg", MAP);

    let sites = sitetable::read_sites(&drawing, &Config::default()).unwrap();
    assert_eq!(
        sites,
        vec![
            Site { id: 1, x: 12, y: 23 },
            Site { id: 2, x: 48, y: 68 },
            Site { id: 101, x: 1016, y: 716 },
        ]
    );
}

#[test]
fn missing_layer_leaves_no_output() {
    let scratch = Scratch::new("missing-layer");
    let drawing = scratch.write("map.svg", &MAP.replace("nodeslayer", "decorations"));
    let output = scratch.path("fnsite_ui.cpp");

    let err = generate(&drawing, &output, &Config::default()).unwrap_err();
    assert!(matches!(err, Error::Structure { .. }), "{err:?}");
    assert!(!output.exists());
}

#[test]
fn malformed_drawing_leaves_no_output() {
    let scratch = Scratch::new("malformed");
    let drawing = scratch.write("map.svg", &MAP.replace("</g>", ""));
    let output = scratch.path("fnsite_ui.cpp");

    let err = generate(&drawing, &output, &Config::default()).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err:?}");
    assert!(!output.exists());
}

#[test]
fn missing_drawing_is_a_parse_error() {
    let scratch = Scratch::new("no-drawing");
    let err = generate(
        &scratch.path("absent.svg"),
        &scratch.path("fnsite_ui.cpp"),
        &Config::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err:?}");
}

#[test]
fn unwritable_output_is_an_io_error() {
    let scratch = Scratch::new("unwritable");
    let drawing = scratch.write("map.svg", MAP);
    let output = scratch.path("missing-dir/fnsite_ui.cpp");

    let err = generate(&drawing, &output, &Config::default()).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err:?}");
}

#[test]
fn bad_coordinate_reports_the_marker() {
    let scratch = Scratch::new("bad-coordinate");
    let drawing = scratch.write("map.svg", &MAP.replace(r#"x="40""#, r#"x="forty""#));
    let output = scratch.path("fnsite_ui.cpp");

    let err = generate(&drawing, &output, &Config::default()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("FN2"), "{message}");
    assert!(message.contains("`x`"), "{message}");
    assert!(!output.exists());
}

#[test]
fn duplicate_ids_follow_the_policy() {
    let scratch = Scratch::new("duplicates");
    let drawing = scratch.write("map.svg", &MAP.replace("FN101", "FN2"));

    let kept = sitetable::read_sites(&drawing, &Config::default()).unwrap();
    let ids: Vec<_> = kept.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 2]);
    assert_eq!(kept[1], Site { id: 2, x: 48, y: 68 });

    let config = Config {
        duplicates: DuplicatePolicy::Reject,
        ..Config::default()
    };
    let output = scratch.path("fnsite_ui.cpp");
    let err = generate(&drawing, &output, &config).unwrap_err();
    assert!(matches!(err, Error::DuplicateSite { id: 2 }), "{err:?}");
    assert!(!output.exists());
}

#[test]
fn config_changes_layer_and_layout() {
    let scratch = Scratch::new("config");
    let drawing = scratch.write(
        "map.svg",
        &MAP.replace("nodeslayer", "markers").replace("FN", "Site"),
    );
    let config = Config::from_file(scratch.write(
        "sitetable.toml",
        r#"
        [layer]
        id = "markers"
        label_prefix = "Site"

        [table]
        comment = "generated"
        includes = ["positions.h"]
        declaration = "const Position positions[]"
        entry = "  [$id] = {$x, $y},"
        "#,
    ))
    .unwrap();
    let output = scratch.path("positions.c");

    generate(&drawing, &output, &config).unwrap();
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "/* generated */

#include \"positions.h\"

const Position positions[]{
  [1] = {12, 23},
  [2] = {48, 68},
  [101] = {1016, 716},
};
"
    );
}

#[test]
fn cli_wrong_argument_count_prints_usage() {
    let out = Command::new(env!("CARGO_BIN_EXE_sitetable"))
        .arg("map.svg")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Usage"), "{stdout}");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("required"), "{stderr}");
}

#[test]
fn cli_generates_table() {
    let scratch = Scratch::new("cli");
    let drawing = scratch.write("map.svg", MAP);
    let output = scratch.path("fnsite_ui.cpp");

    let status = Command::new(env!("CARGO_BIN_EXE_sitetable"))
        .arg(&drawing)
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(fs::read_to_string(&output).unwrap(), TABLE);
}

#[test]
fn cli_failure_is_reported_on_stderr() {
    let scratch = Scratch::new("cli-failure");
    let drawing = scratch.write("map.svg", &MAP.replace("nodeslayer", "other"));
    let output = scratch.path("fnsite_ui.cpp");

    let out = Command::new(env!("CARGO_BIN_EXE_sitetable"))
        .arg(&drawing)
        .arg(&output)
        .env("RUST_LOG", "off")
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("nodeslayer"), "{stderr}");
    assert!(!output.exists());
}
