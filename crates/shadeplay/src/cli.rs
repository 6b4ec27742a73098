use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use shading::{ControlCommand, ExportFormat};

#[derive(Parser, Debug)]
#[command(
    name = "shadeplay",
    author,
    version,
    about = "Drive shading scenes frame by frame",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scene TOML file; the built-in scan wall and dome scene when omitted.
    #[arg(value_name = "SCENE")]
    pub scene: Option<PathBuf>,

    /// Number of frames to render.
    #[arg(long, value_name = "N", conflicts_with = "duration")]
    pub frames: Option<u64>,

    /// Frame rate for fixed stepping and realtime pacing.
    #[arg(long, value_name = "FPS", default_value_t = 60.0, value_parser = parse_fps)]
    pub fps: f32,

    /// Run length (`2.5s`, `500ms`, or plain seconds) instead of a frame count.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Take frame deltas from the system clock and pace frames to `--fps`.
    #[arg(long)]
    pub realtime: bool,

    /// Override the canvas size (e.g. `640x480`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Write the last rendered frame to the given PNG path.
    #[arg(long, value_name = "PATH", value_parser = parse_export_path)]
    pub export: Option<PathBuf>,

    /// Render a single still frame with every animation stepped to SECONDS at `--fps`.
    #[arg(
        long,
        value_name = "SECONDS",
        value_parser = parse_still_time,
        conflicts_with_all = ["frames", "duration", "realtime"]
    )]
    pub still_time: Option<f32>,

    /// Override a uniform before the first frame (`[mesh.]uniform=value`, repeatable).
    #[arg(long = "set", value_name = "[MESH.]UNIFORM=VALUE", value_parser = parse_override)]
    pub overrides: Vec<ControlCommand>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a scene file and describe the shading units it builds.
    Check(CheckArgs),
    /// List the uniforms shading units recognise.
    Uniforms(UniformsArgs),
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    #[arg(value_name = "SCENE")]
    pub scene: PathBuf,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct UniformsArgs {
    /// Emit the table as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_fps(value: &str) -> Result<f32, String> {
    let fps: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid frame rate '{value}'"))?;
    if !(fps.is_finite() && fps > 0.0) {
        return Err(format!("frame rate must be positive, got {fps}"));
    }
    Ok(fps)
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("duration must not be empty".to_string());
    }
    if let Ok(seconds) = trimmed.parse::<f64>() {
        if !(seconds.is_finite() && seconds >= 0.0) {
            return Err(format!("duration must be non-negative, got {seconds}"));
        }
        return Ok(Duration::from_secs_f64(seconds));
    }
    humantime::parse_duration(trimmed).map_err(|err| format!("invalid duration '{trimmed}': {err}"))
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width in surface size".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height in surface size".to_string())?;
    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_export_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    ExportFormat::from_path(&path)?;
    Ok(path)
}

pub fn parse_still_time(value: &str) -> Result<f32, String> {
    let seconds: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid still time '{value}'; expected seconds"))?;
    if !(seconds.is_finite() && seconds >= 0.0) {
        return Err(format!("still time must be non-negative, got {seconds}"));
    }
    Ok(seconds)
}

pub fn parse_override(value: &str) -> Result<ControlCommand, String> {
    value.parse::<ControlCommand>().map_err(|err| err.to_string())
}
