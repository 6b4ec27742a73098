//! Turns scene descriptions into shading units, meshes and a camera.
use anyhow::{bail, Context, Result};
use glam::Vec3;
use sceneconfig::{
    CameraConfig, FragmentConfig, GeometryConfig, MeshConfig, Rgb, SceneConfig, UniformsConfig,
    VertexKind, WrapSetting,
};
use shading::{
    BandHighlight, Camera, ControlCommand, FragmentProgram, Geometry, Mesh, PhaseUpdater,
    ShadingUnit, Side, SphereParams, Uniform, UniformSet, VertexProgram, ViewFalloff, WrapMode,
};

/// Everything the frame loop needs from a scene.
pub struct Stage {
    pub width: u32,
    pub height: u32,
    pub clear_color: Vec3,
    pub camera: Camera,
    pub meshes: Vec<Mesh>,
}

impl Stage {
    pub fn build(scene: &SceneConfig, size: Option<(u32, u32)>) -> Result<Self> {
        let (width, height) = size.unwrap_or((scene.canvas.width, scene.canvas.height));
        let meshes = scene
            .meshes
            .iter()
            .map(build_mesh)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            width,
            height,
            clear_color: rgb(&scene.canvas.clear_color),
            camera: build_camera(&scene.camera, width, height),
            meshes,
        })
    }

    /// Applies control overrides; a command naming a mesh that does not exist
    /// is an error, a broadcast that reaches no mesh only warns.
    pub fn apply_overrides(&mut self, overrides: &[ControlCommand]) -> Result<()> {
        for command in overrides {
            let mut applied = 0usize;
            let mut matched = false;
            for mesh in &mut self.meshes {
                if !command.targets(mesh.name()) {
                    continue;
                }
                matched = true;
                let name = mesh.name().to_string();
                if command
                    .apply(mesh.unit_mut())
                    .with_context(|| format!("failed to apply '{command}' to mesh '{name}'"))?
                {
                    applied += 1;
                }
            }
            if let Some(mesh) = &command.mesh {
                if !matched {
                    bail!("override '{command}' names unknown mesh '{mesh}'");
                }
            }
            if applied == 0 {
                tracing::warn!(%command, "override did not match any mesh uniform");
            } else {
                tracing::info!(%command, meshes = applied, "applied uniform override");
            }
        }
        Ok(())
    }
}

pub fn rgb(value: &Rgb) -> Vec3 {
    Vec3::from_array(value.0)
}

pub fn build_camera(config: &CameraConfig, width: u32, height: u32) -> Camera {
    let mut camera = Camera {
        fov_degrees: config.fov,
        near: config.near,
        far: config.far,
        position: Vec3::from_array(config.position),
        target: Vec3::from_array(config.target),
        up: Vec3::from_array(config.up),
        ..Camera::default()
    };
    camera.set_viewport(width, height);
    camera
}

pub fn vertex_program(kind: VertexKind) -> VertexProgram {
    match kind {
        VertexKind::WorldPosition => VertexProgram::WorldPosition,
        VertexKind::ViewNormal => VertexProgram::ViewNormal,
    }
}

pub fn fragment_program(config: &FragmentConfig) -> FragmentProgram {
    match config {
        FragmentConfig::BandHighlight(band) => BandHighlight {
            gradient_offset: band.gradient_offset,
            gradient_extent: band.gradient_extent,
        }
        .into(),
        FragmentConfig::ViewFalloff(falloff) => ViewFalloff {
            view_axis: Vec3::from_array(falloff.view_axis),
        }
        .into(),
    }
}

pub fn build_geometry(config: &GeometryConfig) -> Result<Geometry> {
    let geometry = match config {
        GeometryConfig::Plane(plane) => Geometry::plane(
            plane.width,
            plane.height,
            plane.width_segments,
            plane.height_segments,
        )?,
        GeometryConfig::Sphere(sphere) => Geometry::sphere(SphereParams {
            radius: sphere.radius,
            width_segments: sphere.width_segments,
            height_segments: sphere.height_segments,
            phi_start: sphere.phi_start.to_radians(),
            phi_length: sphere.phi_length.to_radians(),
            theta_start: sphere.theta_start.to_radians(),
            theta_length: sphere.theta_length.to_radians(),
        })?,
    };
    Ok(geometry)
}

pub fn uniform_set(config: &UniformsConfig) -> Result<UniformSet> {
    let mut set = UniformSet::new();
    let floats = [
        (Uniform::Opacity, config.opacity),
        (Uniform::BandY, config.y),
        (Uniform::BandWidth, config.band_width),
        (Uniform::FalloffPower, config.u_pow),
    ];
    for (uniform, value) in floats {
        if let Some(value) = value {
            set.set(uniform, value.into())?;
        }
    }
    let colors = [
        (Uniform::Color, config.color.as_ref()),
        (Uniform::Highlight, config.highlight.as_ref()),
    ];
    for (uniform, value) in colors {
        if let Some(value) = value {
            set.set(uniform, rgb(value).into())?;
        }
    }
    Ok(set)
}

pub fn build_unit(config: &MeshConfig) -> Result<ShadingUnit> {
    let unit = ShadingUnit::create(
        vertex_program(config.vertex_kind()),
        fragment_program(&config.fragment),
        uniform_set(&config.uniforms)?,
    )?;
    let Some(animate) = &config.animate else {
        return Ok(unit);
    };

    let uniform = Uniform::from_name(&animate.uniform)?;
    let mut updater = PhaseUpdater::new(uniform, animate.rate, animate.lower, animate.upper)?
        .with_wrap(match animate.wrap {
            WrapSetting::Reset => WrapMode::Reset,
            WrapSetting::Modulo => WrapMode::Modulo,
        });
    if let Some(initial) = animate.initial {
        updater = updater.with_initial(initial)?;
    }
    Ok(unit.with_updater(updater)?)
}

pub fn build_mesh(config: &MeshConfig) -> Result<Mesh> {
    let build = || -> Result<Mesh> {
        let geometry = build_geometry(&config.geometry)?;
        let unit = build_unit(config)?;
        let rotation = Vec3::from_array(config.rotation.map(f32::to_radians));
        let mesh = Mesh::new(config.name.clone(), geometry, unit)?
            .with_placement(Vec3::from_array(config.position), rotation)
            .with_side(if config.double_sided {
                Side::Double
            } else {
                Side::Front
            });
        Ok(mesh)
    };
    let mesh = build().with_context(|| format!("failed to build mesh '{}'", config.name))?;
    tracing::debug!(
        mesh = mesh.name(),
        triangles = mesh.geometry().triangle_count(),
        vertex = mesh.unit().vertex_program().label(),
        fragment = mesh.unit().fragment_program().label(),
        "built mesh"
    );
    Ok(mesh)
}
