use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use shading::{Uniform, UniformKind};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid scene: {0}")]
    Invalid(String),
    #[error("failed to read scene {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    pub version: u32,
    /// Default run length when the command line gives neither frames nor a
    /// duration.
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub meshes: Vec<MeshConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CanvasConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_clear_color")]
    pub clear_color: Rgb,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            clear_color: default_clear_color(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub target: [f32; 3],
    #[serde(default = "default_up")]
    pub up: [f32; 3],
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: default_fov(),
            position: default_camera_position(),
            target: [0.0; 3],
            up: default_up(),
            near: default_near(),
            far: default_far(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexKind {
    WorldPosition,
    ViewNormal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MeshConfig {
    pub name: String,
    #[serde(default)]
    pub position: [f32; 3],
    /// XYZ euler angles in degrees.
    #[serde(default)]
    pub rotation: [f32; 3],
    /// Inferred from the fragment program when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex: Option<VertexKind>,
    #[serde(default = "default_double_sided")]
    pub double_sided: bool,
    pub geometry: GeometryConfig,
    pub fragment: FragmentConfig,
    #[serde(default)]
    pub uniforms: UniformsConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animate: Option<AnimateConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometryConfig {
    Plane(PlaneConfig),
    Sphere(SphereConfig),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlaneConfig {
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_plane_segments")]
    pub width_segments: u32,
    #[serde(default = "default_plane_segments")]
    pub height_segments: u32,
}

/// Angles are in degrees; `theta` runs down from the +Y pole.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SphereConfig {
    pub radius: f32,
    #[serde(default = "default_sphere_width_segments")]
    pub width_segments: u32,
    #[serde(default = "default_sphere_height_segments")]
    pub height_segments: u32,
    #[serde(default)]
    pub phi_start: f32,
    #[serde(default = "default_full_turn")]
    pub phi_length: f32,
    #[serde(default)]
    pub theta_start: f32,
    #[serde(default = "default_half_turn")]
    pub theta_length: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FragmentConfig {
    BandHighlight(BandConfig),
    ViewFalloff(FalloffConfig),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BandConfig {
    #[serde(default = "default_gradient_offset")]
    pub gradient_offset: f32,
    #[serde(default = "default_gradient_extent")]
    pub gradient_extent: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FalloffConfig {
    #[serde(default = "default_view_axis")]
    pub view_axis: [f32; 3],
}

/// Initial uniform values. Only recognised names are accepted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UniformsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub u_pow: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapSetting {
    #[default]
    Reset,
    Modulo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnimateConfig {
    pub uniform: String,
    pub rate: f32,
    pub lower: f32,
    pub upper: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<f32>,
    #[serde(default)]
    pub wrap: WrapSetting,
}

/// Linear RGB triple, written as `"#rrggbb"`, `"0xrrggbb"`, a packed
/// integer or an `[r, g, b]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub fn from_hex(hex: u32) -> Self {
        Self(shading::color_from_hex(hex).to_array())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Str(String),
            Num(i64),
            Array([f32; 3]),
        }

        match Helper::deserialize(deserializer)? {
            Helper::Str(raw) => shading::parse_color(&raw)
                .map(|rgb| Rgb(rgb.to_array()))
                .map_err(de::Error::custom),
            Helper::Num(value) => {
                if !(0..=0xff_ffff).contains(&value) {
                    return Err(de::Error::custom(format!(
                        "packed color {value:#x} does not fit in 0xRRGGBB"
                    )));
                }
                Ok(Rgb::from_hex(value as u32))
            }
            Helper::Array(channels) => Ok(Rgb(channels)),
        }
    }
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_clear_color() -> Rgb {
    Rgb::from_hex(0x444444)
}

fn default_fov() -> f32 {
    90.0
}

fn default_camera_position() -> [f32; 3] {
    [200.0, 200.0, 200.0]
}

fn default_up() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

fn default_near() -> f32 {
    1.0
}

fn default_far() -> f32 {
    5000.0
}

fn default_double_sided() -> bool {
    true
}

fn default_plane_segments() -> u32 {
    1
}

fn default_sphere_width_segments() -> u32 {
    32
}

fn default_sphere_height_segments() -> u32 {
    16
}

fn default_full_turn() -> f32 {
    360.0
}

fn default_half_turn() -> f32 {
    180.0
}

fn default_gradient_offset() -> f32 {
    25.0
}

fn default_gradient_extent() -> f32 {
    50.0
}

fn default_view_axis() -> [f32; 3] {
    [0.0, 0.0, 1.0]
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be finite and non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => {
            serializer.serialize_str(&humantime::format_duration(*duration).to_string())
        }
        None => serializer.serialize_none(),
    }
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Scan wall and rim-lit dome side by side, as the stock demo shows them.
    pub fn builtin() -> Self {
        let wall = MeshConfig {
            name: "scan-wall".to_string(),
            position: [100.0, 0.0, 10.0],
            rotation: [0.0; 3],
            vertex: Some(VertexKind::WorldPosition),
            double_sided: true,
            geometry: GeometryConfig::Plane(PlaneConfig {
                width: 100.0,
                height: 50.0,
                width_segments: 1,
                height_segments: 1,
            }),
            fragment: FragmentConfig::BandHighlight(BandConfig {
                gradient_offset: default_gradient_offset(),
                gradient_extent: default_gradient_extent(),
            }),
            uniforms: UniformsConfig {
                opacity: None,
                color: Some(Rgb::from_hex(0x00ffff)),
                y: Some(0.0),
                band_width: Some(10.0),
                highlight: Some(Rgb::from_hex(0xffff00)),
                u_pow: None,
            },
            animate: Some(AnimateConfig {
                uniform: "y".to_string(),
                rate: 30.0,
                lower: -25.0,
                upper: 50.0,
                initial: Some(0.0),
                wrap: WrapSetting::Reset,
            }),
        };
        let dome = MeshConfig {
            name: "rim-dome".to_string(),
            position: [0.0; 3],
            rotation: [0.0; 3],
            vertex: Some(VertexKind::ViewNormal),
            double_sided: true,
            geometry: GeometryConfig::Sphere(SphereConfig {
                radius: 50.0,
                width_segments: 96,
                height_segments: 48,
                phi_start: 0.0,
                phi_length: 360.0,
                theta_start: 0.0,
                theta_length: 90.0,
            }),
            fragment: FragmentConfig::ViewFalloff(FalloffConfig {
                view_axis: default_view_axis(),
            }),
            uniforms: UniformsConfig {
                color: Some(Rgb::from_hex(0x00ffff)),
                u_pow: Some(1.2),
                ..UniformsConfig::default()
            },
            animate: None,
        };
        Self {
            version: 1,
            duration: None,
            canvas: CanvasConfig::default(),
            camera: CameraConfig::default(),
            meshes: vec![wall, dome],
        }
    }

    pub fn mesh(&self, name: &str) -> Option<&MeshConfig> {
        self.meshes.iter().find(|mesh| mesh.name == name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported scene version {}; expected 1",
                self.version
            )));
        }

        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas size must be non-zero, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        validate_rgb("canvas.clear_color", &self.canvas.clear_color)?;
        self.camera.validate()?;

        if self.meshes.is_empty() {
            return Err(ConfigError::Invalid(
                "scene must define at least one mesh".into(),
            ));
        }

        let mut names = BTreeSet::new();
        for mesh in &self.meshes {
            if mesh.name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "mesh name may not be empty".into(),
                ));
            }
            if !names.insert(mesh.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "mesh name '{}' is used more than once",
                    mesh.name
                )));
            }
            mesh.validate()?;
        }

        Ok(())
    }
}

impl CameraConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov must lie in (0, 180) degrees, got {}",
                self.fov
            )));
        }
        if !(self.near > 0.0 && self.far > self.near && self.far.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "camera clip range must satisfy 0 < near < far, got near {} far {}",
                self.near, self.far
            )));
        }
        let finite = |v: &[f32; 3]| v.iter().all(|c| c.is_finite());
        if !finite(&self.position) || !finite(&self.target) || !finite(&self.up) {
            return Err(ConfigError::Invalid(
                "camera vectors must be finite".into(),
            ));
        }
        if self.position == self.target {
            return Err(ConfigError::Invalid(
                "camera.position and camera.target must differ".into(),
            ));
        }
        Ok(())
    }
}

impl MeshConfig {
    /// Vertex program, falling back to the one the fragment program reads.
    pub fn vertex_kind(&self) -> VertexKind {
        self.vertex.unwrap_or(match self.fragment {
            FragmentConfig::BandHighlight(_) => VertexKind::WorldPosition,
            FragmentConfig::ViewFalloff(_) => VertexKind::ViewNormal,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.name;
        let invalid = |reason: String| ConfigError::Invalid(format!("mesh '{name}' {reason}"));

        if !self.position.iter().chain(&self.rotation).all(|c| c.is_finite()) {
            return Err(invalid("position and rotation must be finite".into()));
        }

        match &self.geometry {
            GeometryConfig::Plane(plane) => {
                if !(plane.width > 0.0 && plane.height > 0.0) {
                    return Err(invalid(format!(
                        "plane size must be positive, got {}x{}",
                        plane.width, plane.height
                    )));
                }
                if plane.width_segments == 0 || plane.height_segments == 0 {
                    return Err(invalid("plane segments must be at least 1".into()));
                }
            }
            GeometryConfig::Sphere(sphere) => {
                if !(sphere.radius > 0.0) {
                    return Err(invalid(format!(
                        "sphere radius must be positive, got {}",
                        sphere.radius
                    )));
                }
                if sphere.width_segments < 3 || sphere.height_segments < 2 {
                    return Err(invalid(format!(
                        "sphere needs at least 3x2 segments, got {}x{}",
                        sphere.width_segments, sphere.height_segments
                    )));
                }
                if !(sphere.phi_length > 0.0 && sphere.theta_length > 0.0) {
                    return Err(invalid("sphere sweep angles must be positive".into()));
                }
            }
        }

        match &self.fragment {
            FragmentConfig::BandHighlight(band) => {
                if !band.gradient_offset.is_finite()
                    || !band.gradient_extent.is_finite()
                    || band.gradient_extent == 0.0
                {
                    return Err(invalid(
                        "band gradient needs a finite offset and non-zero extent".into(),
                    ));
                }
            }
            FragmentConfig::ViewFalloff(falloff) => {
                let axis = falloff.view_axis;
                if !axis.iter().all(|c| c.is_finite()) || axis.iter().all(|c| *c == 0.0) {
                    return Err(invalid("view_axis must be a finite non-zero vector".into()));
                }
            }
        }

        for (label, color) in [
            ("color", &self.uniforms.color),
            ("highlight", &self.uniforms.highlight),
        ] {
            if let Some(rgb) = color {
                validate_rgb(&format!("mesh '{name}' uniforms.{label}"), rgb)?;
            }
        }

        if let Some(animate) = &self.animate {
            let uniform = Uniform::from_name(&animate.uniform)
                .map_err(|err| invalid(format!("animate: {err}")))?;
            if uniform.kind() != UniformKind::Float {
                return Err(invalid(format!(
                    "animate.uniform '{uniform}' is not a float uniform"
                )));
            }
            if !(animate.lower.is_finite() && animate.upper.is_finite())
                || animate.lower >= animate.upper
            {
                return Err(invalid(format!(
                    "animate bounds must satisfy lower < upper, got [{}, {})",
                    animate.lower, animate.upper
                )));
            }
            if !animate.rate.is_finite() || animate.rate < 0.0 {
                return Err(invalid(format!(
                    "animate.rate must be finite and >= 0, got {}",
                    animate.rate
                )));
            }
            if let Some(initial) = animate.initial {
                if !(initial >= animate.lower && initial < animate.upper) {
                    return Err(invalid(format!(
                        "animate.initial {initial} lies outside [{}, {})",
                        animate.lower, animate.upper
                    )));
                }
            }
        }

        Ok(())
    }
}

fn validate_rgb(label: &str, rgb: &Rgb) -> Result<(), ConfigError> {
    if rgb.0.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{label} must have finite channels")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
version = 1
duration = "2.5s"

[canvas]
width = 320
height = 200
clear_color = "#444444"

[camera]
fov = 75.0
position = [0.0, 0.0, 150.0]

[[meshes]]
name = "wall"
position = [100.0, 0.0, 10.0]
geometry = { kind = "plane", width = 100.0, height = 50.0 }
fragment = { kind = "band_highlight" }

[meshes.uniforms]
opacity = 0.3
y = 0.0
band_width = 10.0
highlight = 0xffff00

[meshes.animate]
uniform = "y"
rate = 30.0
lower = -25.0
upper = 50.0
initial = 0.0

[[meshes]]
name = "dome"
vertex = "view_normal"
double_sided = false
geometry = { kind = "sphere", radius = 50.0, theta_length = 90.0 }
fragment = { kind = "view_falloff" }

[meshes.uniforms]
color = [0.0, 1.0, 1.0]
u_pow = 1.2
"##;

    fn with_mesh(mesh: &str) -> String {
        format!("version = 1\n\n[[meshes]]\nname = \"m\"\n{mesh}")
    }

    #[test]
    fn parses_sample_scene() {
        let scene = SceneConfig::from_toml_str(SAMPLE).expect("parse scene");
        assert_eq!(scene.duration, Some(Duration::from_millis(2500)));
        assert_eq!(scene.canvas.width, 320);
        assert_eq!(scene.canvas.clear_color, Rgb::from_hex(0x444444));
        assert_eq!(scene.camera.near, 1.0);
        assert_eq!(scene.meshes.len(), 2);

        let wall = scene.mesh("wall").unwrap();
        assert_eq!(wall.vertex_kind(), VertexKind::WorldPosition);
        assert!(wall.double_sided);
        assert_eq!(wall.uniforms.highlight, Some(Rgb([1.0, 1.0, 0.0])));
        let animate = wall.animate.as_ref().unwrap();
        assert_eq!(animate.wrap, WrapSetting::Reset);
        assert_eq!(animate.initial, Some(0.0));

        let dome = scene.mesh("dome").unwrap();
        assert!(!dome.double_sided);
        match &dome.geometry {
            GeometryConfig::Sphere(sphere) => {
                assert_eq!(sphere.theta_length, 90.0);
                assert_eq!(sphere.phi_length, 360.0);
            }
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_uniform_keys() {
        let scene = with_mesh(
            r##"geometry = { kind = "plane", width = 1.0, height = 1.0 }
fragment = { kind = "view_falloff" }
[meshes.uniforms]
u_color = "#00ffff"
"##,
        );
        let err = SceneConfig::from_toml_str(&scene).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        let err = SceneConfig::from_toml_str("version = 1\nspeed = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_unsupported_version() {
        let err = SceneConfig::from_toml_str(&SAMPLE.replace("version = 1", "version = 2"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_duplicate_mesh_names() {
        let err = SceneConfig::from_toml_str(&SAMPLE.replace("\"dome\"", "\"wall\"")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(reason) if reason.contains("more than once")));
    }

    #[test]
    fn rejects_inverted_animation_bounds() {
        let err = SceneConfig::from_toml_str(&SAMPLE.replace("upper = 50.0", "upper = -30.0"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_color_animation_target() {
        let scene = SAMPLE.replace("uniform = \"y\"", "uniform = \"color\"");
        let err = SceneConfig::from_toml_str(&scene).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(reason) if reason.contains("not a float")));
    }

    #[test]
    fn rejects_degenerate_geometry() {
        let scene = with_mesh(
            r#"geometry = { kind = "sphere", radius = 0.0 }
fragment = { kind = "view_falloff" }
"#,
        );
        assert!(matches!(
            SceneConfig::from_toml_str(&scene),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn builtin_scene_validates() {
        let scene = SceneConfig::builtin();
        scene.validate().unwrap();
        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.meshes[0].uniforms.opacity, None);
        assert_eq!(scene.canvas.clear_color, Rgb::from_hex(0x444444));
    }

    #[test]
    fn builtin_scene_round_trips_through_toml() {
        let text = toml::to_string(&SceneConfig::builtin()).unwrap();
        let parsed = SceneConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.meshes[1].name, "rim-dome");
        assert_eq!(parsed.meshes[1].vertex_kind(), VertexKind::ViewNormal);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SceneConfig::load(Path::new("/nonexistent/scene.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
