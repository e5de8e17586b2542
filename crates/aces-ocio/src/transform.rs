//! Transform descriptors and their composition.
//!
//! A color space reaches the reference space through an ordered chain of
//! primitive steps:
//! - File LUTs (sampled tables on disk)
//! - Matrices (3x3 or 4x4, optional offset)
//! - Exponents and logs
//! - Indirection through another named color space
//!
//! [`compose`] turns a step list into a [`ComposedTransform`]: nothing,
//! a single step, or a group that keeps the list order.

use std::path::PathBuf;
use std::slice;

use serde::Deserialize;

use crate::error::{OcioError, OcioResult};

/// Transform application direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformDirection {
    /// Forward transform.
    #[default]
    Forward,
    /// Inverse transform.
    Inverse,
}

impl TransformDirection {
    /// Returns the opposite direction.
    #[inline]
    pub fn inverse(self) -> Self {
        match self {
            Self::Forward => Self::Inverse,
            Self::Inverse => Self::Forward,
        }
    }

    /// Parses a direction keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "forward" => Some(Self::Forward),
            "inverse" => Some(Self::Inverse),
            _ => None,
        }
    }

    /// Returns the document keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Inverse => "inverse",
        }
    }
}

/// Interpolation method for LUT files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Linear interpolation (default for 1D).
    #[default]
    Linear,
    /// Nearest neighbor.
    Nearest,
    /// Tetrahedral interpolation (3D).
    Tetrahedral,
}

impl Interpolation {
    /// Parses an interpolation keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "nearest" => Some(Self::Nearest),
            "tetrahedral" => Some(Self::Tetrahedral),
            _ => None,
        }
    }

    /// Returns the document keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Nearest => "nearest",
            Self::Tetrahedral => "tetrahedral",
        }
    }
}

/// Matrix coefficients in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatrixCoefficients {
    /// 3x3 RGB matrix.
    M33([f64; 9]),
    /// 4x4 RGBA matrix.
    M44([f64; 16]),
}

impl MatrixCoefficients {
    /// 4x4 identity.
    pub const IDENTITY: [f64; 16] = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];

    /// Widens to 4x4, leaving alpha untouched.
    pub fn to_m44(&self) -> [f64; 16] {
        match *self {
            Self::M44(m) => m,
            Self::M33(m) => [
                m[0], m[1], m[2], 0.0, //
                m[3], m[4], m[5], 0.0, //
                m[6], m[7], m[8], 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Builds coefficients from a flat list of 9 or 16 values.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values.len() {
            9 => values.try_into().ok().map(Self::M33),
            16 => values.try_into().ok().map(Self::M44),
            _ => None,
        }
    }
}

/// Sampled lookup table read from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTransform {
    /// Table path, relative to the configuration search path.
    pub src: PathBuf,
    /// Interpolation method.
    pub interpolation: Interpolation,
    /// Direction.
    pub direction: TransformDirection,
}

/// Matrix + offset transform.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixTransform {
    /// Coefficients.
    pub matrix: MatrixCoefficients,
    /// RGBA offset.
    pub offset: Option<[f64; 4]>,
    /// Direction.
    pub direction: TransformDirection,
}

/// Per-channel exponent.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentTransform {
    /// Exponents [R, G, B, A].
    pub value: [f64; 4],
}

/// Log transform (lin-to-log or log-to-lin).
#[derive(Debug, Clone, PartialEq)]
pub struct LogTransform {
    /// Base of logarithm.
    pub base: f64,
    /// Direction.
    pub direction: TransformDirection,
}

/// Indirection through another color space's own transforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSpaceTransform {
    /// Source color space name.
    pub src: String,
    /// Destination color space name.
    pub dst: String,
    /// Direction.
    pub direction: TransformDirection,
}

impl ColorSpaceTransform {
    /// Creates a forward reference from `src` to `dst`.
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            direction: TransformDirection::Forward,
        }
    }
}

/// One primitive transform step.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformDescriptor {
    /// LUT file.
    FileLut(FileTransform),
    /// Matrix.
    Matrix(MatrixTransform),
    /// Exponent.
    Exponent(ExponentTransform),
    /// Log.
    Log(LogTransform),
    /// Reference to another color space.
    ColorSpaceRef(ColorSpaceTransform),
}

impl TransformDescriptor {
    /// LUT file step.
    pub fn file_lut(
        src: impl Into<PathBuf>,
        interpolation: Interpolation,
        direction: TransformDirection,
    ) -> Self {
        Self::FileLut(FileTransform {
            src: src.into(),
            interpolation,
            direction,
        })
    }

    /// Forward 3x3 matrix step.
    pub fn matrix33(m: [f64; 9]) -> Self {
        Self::Matrix(MatrixTransform {
            matrix: MatrixCoefficients::M33(m),
            offset: None,
            direction: TransformDirection::Forward,
        })
    }

    /// Log step.
    pub fn log(base: f64, direction: TransformDirection) -> Self {
        Self::Log(LogTransform { base, direction })
    }

    /// Color space indirection step.
    pub fn colorspace_ref(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self::ColorSpaceRef(ColorSpaceTransform::new(src, dst))
    }

    /// Kind label, as used in step records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileLut(_) => "lutFile",
            Self::Matrix(_) => "matrix",
            Self::Exponent(_) => "exponent",
            Self::Log(_) => "log",
            Self::ColorSpaceRef(_) => "colorspace",
        }
    }
}

/// Ordered chain of at least two steps.
///
/// Only [`compose`] builds groups, so the length invariant holds.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTransform {
    steps: Vec<TransformDescriptor>,
}

impl GroupTransform {
    /// Steps in execution order.
    #[inline]
    pub fn steps(&self) -> &[TransformDescriptor] {
        &self.steps
    }
}

/// A step chain attached to a color space as one unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ComposedTransform {
    /// No steps.
    #[default]
    Empty,
    /// Exactly one step.
    Single(TransformDescriptor),
    /// Two or more steps, executed in list order.
    Group(GroupTransform),
}

impl ComposedTransform {
    /// Steps in execution order.
    pub fn steps(&self) -> &[TransformDescriptor] {
        match self {
            Self::Empty => &[],
            Self::Single(step) => slice::from_ref(step),
            Self::Group(group) => group.steps(),
        }
    }

    /// Number of steps.
    #[inline]
    pub fn len(&self) -> usize {
        self.steps().len()
    }

    /// True when there are no steps.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<TransformDescriptor> for ComposedTransform {
    fn from(step: TransformDescriptor) -> Self {
        Self::Single(step)
    }
}

impl From<Vec<TransformDescriptor>> for ComposedTransform {
    fn from(steps: Vec<TransformDescriptor>) -> Self {
        compose(steps)
    }
}

/// Composes an ordered step list.
///
/// No reordering, no deduplication.
pub fn compose(mut steps: Vec<TransformDescriptor>) -> ComposedTransform {
    match steps.len() {
        0 => ComposedTransform::Empty,
        1 => match steps.pop() {
            Some(step) => ComposedTransform::Single(step),
            None => ComposedTransform::Empty,
        },
        _ => ComposedTransform::Group(GroupTransform { steps }),
    }
}

/// Validates every raw step, then composes.
///
/// Fails on the first unsupported or malformed step; nothing is composed
/// from a partially valid list.
pub fn compose_raw(steps: Vec<RawStep>) -> OcioResult<ComposedTransform> {
    let steps = steps
        .into_iter()
        .map(TransformDescriptor::try_from)
        .collect::<OcioResult<Vec<_>>>()?;
    Ok(compose(steps))
}

/// Loosely typed step record, as emitted by external generators.
///
/// ```yaml
/// - {type: lutFile, path: logc.spi1d, interpolation: linear, direction: forward}
/// - {type: matrix, matrix: [1, 0, 0, 0, 1, 0, 0, 0, 1]}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStep {
    /// Step kind label.
    #[serde(rename = "type")]
    pub kind: String,
    /// `lutFile`: table path.
    pub path: Option<PathBuf>,
    /// `lutFile`: interpolation keyword.
    pub interpolation: Option<String>,
    /// `lutFile`, `matrix`, `log`: direction keyword.
    pub direction: Option<String>,
    /// `matrix`: 9 or 16 coefficients.
    pub matrix: Option<Vec<f64>>,
    /// `matrix`: 3 or 4 offsets.
    pub offset: Option<Vec<f64>>,
    /// `exponent`: 1, 3 or 4 values.
    pub value: Option<Vec<f64>>,
    /// `log`: base.
    pub base: Option<f64>,
    /// `colorspace`: source name.
    pub src: Option<String>,
    /// `colorspace`: destination name.
    pub dst: Option<String>,
}

impl RawStep {
    fn direction(&self) -> OcioResult<TransformDirection> {
        match &self.direction {
            None => Ok(TransformDirection::Forward),
            Some(d) => TransformDirection::parse(d)
                .ok_or_else(|| OcioError::invalid(format!("{}: unknown direction '{}'", self.kind, d))),
        }
    }

    fn missing(&self, field: &str) -> OcioError {
        OcioError::invalid(format!("{}: missing '{}'", self.kind, field))
    }
}

impl TryFrom<RawStep> for TransformDescriptor {
    type Error = OcioError;

    fn try_from(raw: RawStep) -> OcioResult<Self> {
        match raw.kind.as_str() {
            "lutFile" => {
                let direction = raw.direction()?;
                let interpolation = match &raw.interpolation {
                    None => Interpolation::default(),
                    Some(i) => Interpolation::parse(i).ok_or_else(|| {
                        OcioError::invalid(format!("lutFile: unknown interpolation '{}'", i))
                    })?,
                };
                let src = raw.path.clone().ok_or_else(|| raw.missing("path"))?;
                Ok(Self::FileLut(FileTransform {
                    src,
                    interpolation,
                    direction,
                }))
            }
            "matrix" => {
                let direction = raw.direction()?;
                let values = raw.matrix.as_deref().ok_or_else(|| raw.missing("matrix"))?;
                let matrix = MatrixCoefficients::from_slice(values).ok_or_else(|| {
                    OcioError::invalid(format!(
                        "matrix: expected 9 or 16 coefficients, got {}",
                        values.len()
                    ))
                })?;
                let offset = match raw.offset.as_deref() {
                    None => None,
                    Some([r, g, b]) => Some([*r, *g, *b, 0.0]),
                    Some([r, g, b, a]) => Some([*r, *g, *b, *a]),
                    Some(other) => {
                        return Err(OcioError::invalid(format!(
                            "matrix: expected 3 or 4 offsets, got {}",
                            other.len()
                        )));
                    }
                };
                Ok(Self::Matrix(MatrixTransform {
                    matrix,
                    offset,
                    direction,
                }))
            }
            "exponent" => {
                let value = match raw.value.as_deref().ok_or_else(|| raw.missing("value"))? {
                    [v] => [*v, *v, *v, 1.0],
                    [r, g, b] => [*r, *g, *b, 1.0],
                    [r, g, b, a] => [*r, *g, *b, *a],
                    other => {
                        return Err(OcioError::invalid(format!(
                            "exponent: expected 1, 3 or 4 values, got {}",
                            other.len()
                        )));
                    }
                };
                Ok(Self::Exponent(ExponentTransform { value }))
            }
            "log" => {
                let direction = raw.direction()?;
                let base = raw.base.ok_or_else(|| raw.missing("base"))?;
                Ok(Self::Log(LogTransform { base, direction }))
            }
            "colorspace" => {
                let src = raw.src.clone().ok_or_else(|| raw.missing("src"))?;
                let dst = raw.dst.clone().ok_or_else(|| raw.missing("dst"))?;
                // Indirection always runs forward.
                Ok(Self::ColorSpaceRef(ColorSpaceTransform::new(src, dst)))
            }
            _ => Err(OcioError::UnsupportedTransformKind { kind: raw.kind }),
        }
    }
}
