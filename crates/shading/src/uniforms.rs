//! Uniform parameters owned by a shading unit.
//!
//! `UniformSet` is the mutable, typed map written by phase updaters and
//! control overrides between frames. Before a draw the set is committed into a
//! `FrameUniforms` block, an immutable std140-compatible snapshot that every
//! fragment of that draw reads. Because the draw only ever sees the snapshot,
//! a frame can never observe a half-applied update.
use std::collections::BTreeMap;
use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::ShadingError;

/// Every uniform name a shading unit recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Uniform {
    /// Material opacity multiplied into the fragment alpha at blend time.
    Opacity,
    /// Base color of the view-angle falloff.
    Color,
    /// Lower edge of the moving highlight band (`y`).
    BandY,
    /// Height of the highlight band.
    BandWidth,
    /// Color blended in at the band's lower edge.
    Highlight,
    /// Falloff exponent (`u_pow`).
    FalloffPower,
}

/// Value type carried by a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Color,
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformKind::Float => f.write_str("float"),
            UniformKind::Color => f.write_str("color"),
        }
    }
}

impl Uniform {
    pub const ALL: [Uniform; 6] = [
        Uniform::Opacity,
        Uniform::Color,
        Uniform::BandY,
        Uniform::BandWidth,
        Uniform::Highlight,
        Uniform::FalloffPower,
    ];

    /// Name used in scene files and overrides.
    pub fn name(self) -> &'static str {
        match self {
            Uniform::Opacity => "opacity",
            Uniform::Color => "color",
            Uniform::BandY => "y",
            Uniform::BandWidth => "band_width",
            Uniform::Highlight => "highlight",
            Uniform::FalloffPower => "u_pow",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ShadingError> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|uniform| uniform.name() == trimmed)
            .ok_or_else(|| ShadingError::UnknownUniform(trimmed.to_string()))
    }

    pub fn kind(self) -> UniformKind {
        match self {
            Uniform::Color | Uniform::Highlight => UniformKind::Color,
            Uniform::Opacity | Uniform::BandY | Uniform::BandWidth | Uniform::FalloffPower => {
                UniformKind::Float
            }
        }
    }

    /// Range offered by interactive controls. Values outside it are still
    /// accepted.
    pub fn documented_range(self) -> Option<(f32, f32)> {
        match self {
            Uniform::Opacity => Some((0.0, 1.0)),
            Uniform::BandY => Some((-25.0, 50.0)),
            Uniform::BandWidth => Some((1.0, 50.0)),
            Uniform::FalloffPower => Some((0.1, 5.0)),
            Uniform::Color | Uniform::Highlight => None,
        }
    }
}

impl fmt::Display for Uniform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Color(Vec3),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Color(_) => UniformKind::Color,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            UniformValue::Float(value) => Some(*value),
            UniformValue::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<Vec3> {
        match self {
            UniformValue::Color(value) => Some(*value),
            UniformValue::Float(_) => None,
        }
    }

    /// Parses a textual literal according to the type of `uniform`.
    pub fn parse_for(uniform: Uniform, raw: &str) -> Result<Self, ShadingError> {
        let trimmed = raw.trim();
        let invalid = |reason: String| ShadingError::InvalidUniform { uniform, reason };
        match uniform.kind() {
            UniformKind::Float => trimmed
                .parse::<f32>()
                .map(UniformValue::Float)
                .map_err(|_| invalid(format!("'{trimmed}' is not a number"))),
            UniformKind::Color => parse_color(trimmed).map(UniformValue::Color).map_err(invalid),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        UniformValue::Color(value)
    }
}

impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformValue::Float(value) => write!(f, "{value}"),
            UniformValue::Color(rgb) => write!(f, "({:.3}, {:.3}, {:.3})", rgb.x, rgb.y, rgb.z),
        }
    }
}

/// Converts a packed `0xRRGGBB` value into linear 0..1 channels.
pub fn color_from_hex(hex: u32) -> Vec3 {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    Vec3::new(r, g, b)
}

/// Accepts `#rrggbb`, `0xrrggbb`, or three comma separated floats.
pub fn parse_color(raw: &str) -> Result<Vec3, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("color must not be empty".to_string());
    }

    let hex = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"));
    if let Some(digits) = hex {
        if digits.len() != 6 {
            return Err(format!("expected six hex digits in '{trimmed}'"));
        }
        let packed = u32::from_str_radix(digits, 16)
            .map_err(|_| format!("invalid hex color '{trimmed}'"))?;
        return Ok(color_from_hex(packed));
    }

    let channels = trimmed
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| format!("invalid color '{trimmed}'; expected #rrggbb or r,g,b"))?;
    match channels.as_slice() {
        [r, g, b] => Ok(Vec3::new(*r, *g, *b)),
        _ => Err(format!("color '{trimmed}' must have exactly three channels")),
    }
}

/// Typed uniform storage owned by one shading unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    values: BTreeMap<Uniform, UniformValue>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`UniformSet::set`].
    pub fn with(
        mut self,
        uniform: Uniform,
        value: impl Into<UniformValue>,
    ) -> Result<Self, ShadingError> {
        self.set(uniform, value.into())?;
        Ok(self)
    }

    /// Builds a set from loosely named pairs, rejecting names that are not
    /// recognised uniforms.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, ShadingError>
    where
        I: IntoIterator<Item = (S, UniformValue)>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for (name, value) in pairs {
            let uniform = Uniform::from_name(name.as_ref())?;
            set.set(uniform, value)?;
        }
        Ok(set)
    }

    /// Stores `value`, checking that its type matches the slot.
    pub fn set(&mut self, uniform: Uniform, value: UniformValue) -> Result<(), ShadingError> {
        if value.kind() != uniform.kind() {
            return Err(ShadingError::UniformType {
                uniform,
                expected: uniform.kind(),
                found: value.kind(),
            });
        }
        if let (Some((min, max)), UniformValue::Float(raw)) = (uniform.documented_range(), value) {
            if !(min..=max).contains(&raw) {
                tracing::debug!(
                    uniform = uniform.name(),
                    value = raw,
                    min,
                    max,
                    "uniform set outside its documented range"
                );
            }
        }
        self.values.insert(uniform, value);
        Ok(())
    }

    pub fn get(&self, uniform: Uniform) -> Option<UniformValue> {
        self.values.get(&uniform).copied()
    }

    pub fn float(&self, uniform: Uniform) -> Option<f32> {
        self.get(uniform).and_then(|value| value.as_float())
    }

    pub fn color(&self, uniform: Uniform) -> Option<Vec3> {
        self.get(uniform).and_then(|value| value.as_color())
    }

    pub fn contains(&self, uniform: Uniform) -> bool {
        self.values.contains_key(&uniform)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Uniform, UniformValue)> + '_ {
        self.values.iter().map(|(uniform, value)| (*uniform, *value))
    }

    /// Fails with the first uniform in `required` that has no value.
    pub fn require(
        &self,
        program: &'static str,
        required: &[Uniform],
    ) -> Result<(), ShadingError> {
        match required.iter().find(|uniform| !self.contains(**uniform)) {
            Some(uniform) => Err(ShadingError::MissingUniform {
                program,
                uniform: *uniform,
            }),
            None => Ok(()),
        }
    }

    /// Snapshots the set into the block read by a single draw.
    pub fn commit(&self) -> FrameUniforms {
        let color = self.color(Uniform::Color).unwrap_or(Vec3::ZERO);
        let highlight = self.color(Uniform::Highlight).unwrap_or(Vec3::ZERO);
        FrameUniforms {
            color: [
                color.x,
                color.y,
                color.z,
                self.float(Uniform::Opacity).unwrap_or(1.0),
            ],
            highlight: [
                highlight.x,
                highlight.y,
                highlight.z,
                self.float(Uniform::BandY).unwrap_or(0.0),
            ],
            params: [
                self.float(Uniform::BandWidth).unwrap_or(0.0),
                self.float(Uniform::FalloffPower).unwrap_or(1.0),
                0.0,
                0.0,
            ],
        }
    }
}

/// Per-draw uniform block.
///
/// The layout matches a std140 block of three `vec4`s:
///
/// ```text
/// vec4 color;      // rgb = color,     a = opacity
/// vec4 highlight;  // rgb = highlight, a = y
/// vec4 params;     // x = band_width,  y = u_pow
/// ```
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub color: [f32; 4],
    pub highlight: [f32; 4],
    pub params: [f32; 4],
}

unsafe impl Zeroable for FrameUniforms {}
unsafe impl Pod for FrameUniforms {}

impl FrameUniforms {
    pub fn color(&self) -> Vec3 {
        Vec3::new(self.color[0], self.color[1], self.color[2])
    }

    pub fn opacity(&self) -> f32 {
        self.color[3]
    }

    pub fn highlight(&self) -> Vec3 {
        Vec3::new(self.highlight[0], self.highlight[1], self.highlight[2])
    }

    pub fn band_y(&self) -> f32 {
        self.highlight[3]
    }

    pub fn band_width(&self) -> f32 {
        self.params[0]
    }

    pub fn falloff_power(&self) -> f32 {
        self.params[1]
    }

    /// Raw bytes ready for a GPU uniform buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
