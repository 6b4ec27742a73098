use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use sceneconfig::SceneConfig;
use shading::{FrameClock, FrameStats, Framebuffer, RenderPolicy, Renderer};
use tracing_subscriber::EnvFilter;

use crate::bindings::Stage;
use crate::cli::RunArgs;

/// Run length used when neither the command line nor the scene gives one.
const DEFAULT_RUN: Duration = Duration::from_secs(1);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let scene = match &args.scene {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => {
            tracing::info!("no scene given; using the built-in scene");
            SceneConfig::builtin()
        }
    };

    let mut stage = Stage::build(&scene, args.size)?;
    stage.apply_overrides(&args.overrides)?;

    let policy = render_policy(&args);
    let frames = frame_count(&args, &scene, &policy);
    tracing::info!(
        meshes = stage.meshes.len(),
        width = stage.width,
        height = stage.height,
        frames,
        ?policy,
        "starting frame loop"
    );

    let mut target =
        Framebuffer::new(stage.width, stage.height).with_clear_color(stage.clear_color);
    let mut renderer = Renderer::new();
    let mut totals = FrameStats::default();
    let mut simulated = 0.0_f64;
    let started = Instant::now();

    if let RenderPolicy::Still { time } = policy {
        simulated = advance_to(&mut stage, time, args.fps);
        totals += renderer.render(&mut target, &stage.camera, &stage.meshes);
    } else {
        let mut clock = FrameClock::for_policy(&policy);
        for frame in 0..frames {
            let tick = clock.tick();
            simulated += f64::from(tick.delta);
            for mesh in &mut stage.meshes {
                mesh.unit_mut().on_tick(tick.delta);
            }
            totals += renderer.render(&mut target, &stage.camera, &stage.meshes);

            if args.realtime {
                pace(started, frame + 1, args.fps);
            }
        }
    }

    tracing::info!(
        frames = renderer.frames_rendered(),
        triangles = totals.triangles,
        culled = totals.culled,
        fragments = totals.fragments,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "frame loop finished"
    );

    if let Some(path) = &args.export {
        target
            .save_png(path)
            .with_context(|| format!("failed to export frame to {}", path.display()))?;
        tracing::info!(path = %path.display(), "exported last frame");
    }

    println!(
        "rendered {} frames ({:.3}s simulated)",
        renderer.frames_rendered(),
        simulated
    );
    for mesh in &stage.meshes {
        let uniforms = mesh
            .unit()
            .uniforms()
            .iter()
            .map(|(uniform, value)| format!("{uniform}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}: {uniforms}", mesh.name());
    }
    Ok(())
}

fn render_policy(args: &RunArgs) -> RenderPolicy {
    match args.still_time {
        Some(time) => RenderPolicy::Still { time },
        None => RenderPolicy::Animate {
            fps: args.fps,
            realtime: args.realtime,
        },
    }
}

/// Still frames render once; otherwise `--frames`, then `--duration`, then
/// the scene's own duration decide, converted at the requested frame rate.
/// The first frame of a fixed-step run sits at t = 0, so covering a duration
/// takes one frame more than `duration * fps`.
fn frame_count(args: &RunArgs, scene: &SceneConfig, policy: &RenderPolicy) -> u64 {
    if matches!(policy, RenderPolicy::Still { .. }) {
        return 1;
    }
    if let Some(frames) = args.frames {
        return frames;
    }
    let duration = args.duration.or(scene.duration).unwrap_or(DEFAULT_RUN);
    (duration.as_secs_f64() * f64::from(args.fps)).ceil() as u64 + 1
}

/// Ticks every unit up to `time` in `1 / fps` steps, the way playback would
/// reach it, and returns the simulated seconds.
fn advance_to(stage: &mut Stage, time: f32, fps: f32) -> f64 {
    let end = f64::from(time.max(0.0));
    let fps = f64::from(fps);
    let mut reached = 0.0_f64;
    let mut frame = 0_u64;
    while reached < end {
        frame += 1;
        let next = (frame as f64 / fps).min(end);
        let delta = (next - reached) as f32;
        for mesh in &mut stage.meshes {
            mesh.unit_mut().on_tick(delta);
        }
        reached = next;
    }
    reached
}

fn pace(started: Instant, rendered: u64, fps: f32) {
    let due = started + Duration::from_secs_f64(rendered as f64 / f64::from(fps));
    let now = Instant::now();
    if due > now {
        std::thread::sleep(due - now);
    }
}
