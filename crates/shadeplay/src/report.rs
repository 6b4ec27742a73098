use anyhow::{Context, Result};
use sceneconfig::SceneConfig;
use serde::Serialize;
use shading::{Mesh, Uniform, UniformKind};

use crate::bindings::Stage;
use crate::cli::{CheckArgs, UniformsArgs};

#[derive(Debug, Serialize)]
struct SceneReport {
    width: u32,
    height: u32,
    meshes: Vec<MeshReport>,
}

#[derive(Debug, Serialize)]
struct MeshReport {
    name: String,
    vertex: &'static str,
    fragment: &'static str,
    triangles: usize,
    side: String,
    uniforms: Vec<(String, String)>,
    animations: Vec<AnimationReport>,
}

#[derive(Debug, Serialize)]
struct AnimationReport {
    uniform: String,
    rate: f32,
    lower: f32,
    upper: f32,
    start: f32,
    wrap: String,
}

#[derive(Debug, Serialize)]
struct UniformReport {
    name: &'static str,
    kind: String,
    range: Option<(f32, f32)>,
}

impl MeshReport {
    fn from_mesh(mesh: &Mesh) -> Self {
        let unit = mesh.unit();
        Self {
            name: mesh.name().to_string(),
            vertex: unit.vertex_program().label(),
            fragment: unit.fragment_program().label(),
            triangles: mesh.geometry().triangle_count(),
            side: format!("{:?}", mesh.side()).to_ascii_lowercase(),
            uniforms: unit
                .uniforms()
                .iter()
                .map(|(uniform, value)| (uniform.to_string(), value.to_string()))
                .collect(),
            animations: unit
                .updaters()
                .iter()
                .map(|updater| {
                    let (lower, upper) = updater.bounds();
                    AnimationReport {
                        uniform: updater.target().to_string(),
                        rate: updater.rate(),
                        lower,
                        upper,
                        start: updater.phase(),
                        wrap: format!("{:?}", updater.wrap_mode()).to_ascii_lowercase(),
                    }
                })
                .collect(),
        }
    }
}

pub fn check(args: CheckArgs) -> Result<()> {
    let scene = SceneConfig::load(&args.scene)
        .with_context(|| format!("scene {} is invalid", args.scene.display()))?;
    let stage = Stage::build(&scene, None)?;
    let report = SceneReport {
        width: stage.width,
        height: stage.height,
        meshes: stage.meshes.iter().map(MeshReport::from_mesh).collect(),
    };
    tracing::debug!(scene = %args.scene.display(), meshes = report.meshes.len(), "scene checked");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{}: ok ({}x{}, {} meshes)",
        args.scene.display(),
        report.width,
        report.height,
        report.meshes.len()
    );
    for mesh in &report.meshes {
        println!(
            "  {:<16} {} -> {} triangles={} side={}",
            mesh.name, mesh.vertex, mesh.fragment, mesh.triangles, mesh.side
        );
        for (name, value) in &mesh.uniforms {
            println!("    {name:<10} = {value}");
        }
        for animation in &mesh.animations {
            println!(
                "    animate {} at {}/s over [{}, {}) from {} ({})",
                animation.uniform,
                animation.rate,
                animation.lower,
                animation.upper,
                animation.start,
                animation.wrap
            );
        }
    }
    Ok(())
}

pub fn uniforms(args: UniformsArgs) -> Result<()> {
    let table: Vec<UniformReport> = Uniform::ALL
        .into_iter()
        .map(|uniform| UniformReport {
            name: uniform.name(),
            kind: uniform.kind().to_string(),
            range: uniform.documented_range(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!("Recognised uniforms:");
    for entry in &table {
        let range = match entry.range {
            Some((min, max)) => format!("{min} .. {max}"),
            None if entry.kind == UniformKind::Color.to_string() => "#rrggbb | r,g,b".to_string(),
            None => "-".to_string(),
        };
        println!("  {:<12} {:<6} {range}", entry.name, entry.kind);
    }
    Ok(())
}
