use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const SCAN_SCENE: &str = r##"
version = 1

[canvas]
width = 48
height = 32
clear_color = "#444444"

[camera]
position = [0.0, 0.0, 100.0]

[[meshes]]
name = "scan"
geometry = { kind = "plane", width = 100.0, height = 50.0 }
fragment = { kind = "band_highlight" }

[meshes.uniforms]
y = -25.0
band_width = 10.0
highlight = "#ffff00"

[meshes.animate]
uniform = "y"
rate = 30.0
lower = -25.0
upper = 50.0
initial = -25.0
"##;

fn shadeplay(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shadeplay"))
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run shadeplay")
}

fn write_scene(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("scene.toml");
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn mesh_line<'a>(stdout: &'a str, mesh: &str) -> &'a str {
    let prefix = format!("{mesh}: ");
    stdout
        .lines()
        .find(|line| line.starts_with(&prefix))
        .unwrap_or_else(|| panic!("no line for {mesh} in {stdout}"))
}

fn png_size(path: &Path) -> (u32, u32) {
    let bytes = fs::read(path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    let width = u32::from_be_bytes(bytes[16..20].try_into().unwrap());
    let height = u32::from_be_bytes(bytes[20..24].try_into().unwrap());
    (width, height)
}

#[test]
fn band_wraps_after_two_and_a_half_seconds() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, SCAN_SCENE);

    // frame 0 sits at t = 0, the next five each advance 0.5s
    let output = shadeplay(&[&scene, "--fps", "2", "--frames", "6"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("rendered 6 frames (2.500s simulated)"), "{stdout}");
    let scan = mesh_line(&stdout, "scan");
    assert!(scan.split_whitespace().any(|field| field == "y=-25"), "{scan}");

    let output = shadeplay(&[&scene, "--fps", "2", "--frames", "5"]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    let scan = mesh_line(&stdout, "scan");
    assert!(scan.split_whitespace().any(|field| field == "y=35"), "{scan}");
}

#[test]
fn exports_last_frame_at_requested_size() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("frame.png");
    let output = shadeplay(&[
        "--frames",
        "2",
        "--size",
        "40x24",
        "--export",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(png_size(&out), (40, 24));
}

#[test]
fn still_time_steps_animation_like_playback() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, SCAN_SCENE);
    let output = shadeplay(&[&scene, "--fps", "2", "--still-time", "1"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("rendered 1 frames (1.000s simulated)"), "{stdout}");
    let scan = mesh_line(&stdout, "scan");
    assert!(scan.split_whitespace().any(|field| field == "y=5"), "{scan}");

    // one 3s jump would overshoot to 65 and reset; six 0.5s steps wrap once
    let output = shadeplay(&[&scene, "--fps", "2", "--still-time", "3"]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    let scan = mesh_line(&stdout, "scan");
    assert!(scan.split_whitespace().any(|field| field == "y=-10"), "{scan}");
}

#[test]
fn override_of_animated_uniform_reaches_the_frame() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, SCAN_SCENE);
    let output = shadeplay(&[&scene, "--fps", "2", "--frames", "2", "--set", "scan.y=20"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let scan = mesh_line(&stdout, "scan");
    assert!(scan.split_whitespace().any(|field| field == "y=35"), "{scan}");
}

#[test]
fn overrides_apply_before_first_frame() {
    let output = shadeplay(&[
        "--frames",
        "1",
        "--size",
        "16x16",
        "--set",
        "rim-dome.u_pow=2.5",
        "--set",
        "band_width=4",
    ]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let dome = mesh_line(&stdout, "rim-dome");
    assert!(dome.contains("u_pow=2.5"), "{dome}");
    let wall = mesh_line(&stdout, "scan-wall");
    assert!(wall.contains("band_width=4"), "{wall}");
}

#[test]
fn rejects_unknown_uniform_override() {
    let output = shadeplay(&["--frames", "1", "--set", "glow=1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown uniform 'glow'"), "{stderr}");
}

#[test]
fn rejects_override_for_missing_mesh() {
    let output = shadeplay(&["--frames", "1", "--size", "8x8", "--set", "ghost.y=3"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown mesh 'ghost'"), "{stderr}");
}

#[test]
fn rejects_unsupported_export_format() {
    let output = shadeplay(&["--export", "frame.jpg"]);
    assert!(!output.status.success());
}

#[test]
fn check_reports_scene_as_json() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, SCAN_SCENE);
    let output = shadeplay(&["check", &scene, "--json"]);
    assert!(output.status.success(), "{output:?}");

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["width"], 48);
    let meshes = report["meshes"].as_array().unwrap();
    assert_eq!(meshes.len(), 1);
    assert_eq!(meshes[0]["name"], "scan");
    assert_eq!(meshes[0]["vertex"], "world_position");
    assert_eq!(meshes[0]["fragment"], "band_highlight");
    assert_eq!(meshes[0]["animations"][0]["uniform"], "y");
}

#[test]
fn check_rejects_unknown_keys() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, &SCAN_SCENE.replace("band_width = 10.0", "bandWidth = 10.0"));
    let output = shadeplay(&["check", &scene]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("bandWidth"), "{stderr}");
}

#[test]
fn check_rejects_missing_required_uniform() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, &SCAN_SCENE.replace("band_width = 10.0\n", ""));
    let output = shadeplay(&["check", &scene]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("band_width"), "{stderr}");
}

#[test]
fn uniforms_lists_every_name() {
    let output = shadeplay(&["uniforms", "--json"]);
    assert!(output.status.success(), "{output:?}");
    let table: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = table
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["opacity", "color", "y", "band_width", "highlight", "u_pow"]
    );
}
