//! Serde model of the persisted `.ocio` document.
//!
//! Field order in [`ConfigDocument`] is the emission order. Transforms are
//! externally tagged, so each one renders as a YAML tag (`!FileTransform`,
//! `!GroupTransform`, ...) followed by its parameters.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::colorspace::{Allocation, AllocationType, BitDepth, ColorSpace};
use crate::error::{OcioError, OcioResult};
use crate::transform::{
    ColorSpaceTransform, ComposedTransform, ExponentTransform, FileTransform, Interpolation,
    LogTransform, MatrixCoefficients, MatrixTransform, TransformDescriptor, TransformDirection,
    compose,
};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ConfigDocument {
    pub ocio_profile_version: u32,
    #[serde(default)]
    pub search_path: String,
    #[serde(default = "default_true")]
    pub strictparsing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub luma: Option<[f64; 3]>,
    #[serde(default)]
    pub description: String,
    /// Keys sort alphabetically, which matches the role order.
    #[serde(default)]
    pub roles: BTreeMap<String, String>,
    #[serde(default)]
    pub displays: BTreeMap<String, Vec<ViewEntry>>,
    #[serde(default)]
    pub active_displays: ActiveList,
    #[serde(default)]
    pub active_views: ActiveList,
    #[serde(default)]
    pub colorspaces: Vec<ColorSpaceEntry>,
}

fn default_true() -> bool {
    true
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_forward(d: &String) -> bool {
    d == TransformDirection::Forward.as_str()
}

fn forward() -> String {
    TransformDirection::Forward.as_str().to_string()
}

/// Active display or view list.
///
/// Written as one `,`-joined string; a YAML sequence is accepted on read.
/// Entries are trimmed on read, which is why the builder refuses names
/// containing the separator or surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum ActiveList {
    Joined(String),
    List(Vec<String>),
}

impl Default for ActiveList {
    fn default() -> Self {
        Self::Joined(String::new())
    }
}

impl ActiveList {
    pub const SEPARATOR: char = ',';

    pub fn join(items: &[String]) -> Self {
        Self::Joined(items.join(&Self::SEPARATOR.to_string()))
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Joined(s) => s
                .split(Self::SEPARATOR)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            Self::List(v) => v,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ViewEntry {
    pub name: String,
    pub colorspace: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ColorSpaceEntry {
    pub name: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub equalitygroup: String,
    #[serde(default = "default_bitdepth")]
    pub bitdepth: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub isdata: bool,
    #[serde(default = "default_allocation")]
    pub allocation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocationvars: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_reference: Option<TransformNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_reference: Option<TransformNode>,
}

fn default_bitdepth() -> String {
    BitDepth::default().as_str().to_string()
}

fn default_allocation() -> String {
    AllocationType::default().as_str().to_string()
}

/// One tagged transform node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum TransformNode {
    FileTransform {
        src: String,
        #[serde(default = "default_interpolation")]
        interpolation: String,
        #[serde(default = "forward", skip_serializing_if = "is_forward")]
        direction: String,
    },
    MatrixTransform {
        matrix: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<Vec<f64>>,
        #[serde(default = "forward", skip_serializing_if = "is_forward")]
        direction: String,
    },
    ExponentTransform {
        value: Vec<f64>,
    },
    LogTransform {
        base: f64,
        #[serde(default = "forward", skip_serializing_if = "is_forward")]
        direction: String,
    },
    ColorSpaceTransform {
        src: String,
        dst: String,
    },
    GroupTransform {
        children: Vec<TransformNode>,
    },
}

fn default_interpolation() -> String {
    Interpolation::default().as_str().to_string()
}

impl ColorSpaceEntry {
    pub fn from_colorspace(cs: &ColorSpace) -> Self {
        Self {
            name: cs.name().to_string(),
            family: cs.family().to_string(),
            equalitygroup: cs.equality_group().to_string(),
            bitdepth: cs.bit_depth().as_str().to_string(),
            description: cs.description().to_string(),
            isdata: cs.is_data(),
            allocation: cs.allocation().alloc_type.as_str().to_string(),
            allocationvars: cs.allocation().vars.clone(),
            to_reference: cs.to_reference().and_then(TransformNode::from_composed),
            from_reference: cs.from_reference().and_then(TransformNode::from_composed),
        }
    }

    pub fn into_colorspace(self) -> OcioResult<ColorSpace> {
        let bit_depth = BitDepth::parse(&self.bitdepth).unwrap_or_else(|| {
            warn!(colorspace = %self.name, bitdepth = %self.bitdepth, "unknown bit depth, using default");
            BitDepth::default()
        });
        let alloc_type = AllocationType::parse(&self.allocation).unwrap_or_else(|| {
            warn!(colorspace = %self.name, allocation = %self.allocation, "unknown allocation, using uniform");
            AllocationType::Uniform
        });
        let allocation = if self.allocationvars.is_empty() && alloc_type == AllocationType::Uniform {
            Allocation::default()
        } else {
            Allocation {
                alloc_type,
                vars: self.allocationvars,
            }
        };

        let mut builder = ColorSpace::builder(self.name)
            .family(self.family)
            .equality_group(self.equalitygroup)
            .bit_depth(bit_depth)
            .description(self.description)
            .is_data(self.isdata)
            .allocation(allocation);

        if let Some(node) = self.to_reference {
            builder = builder.to_reference(node.into_composed()?);
        }
        if let Some(node) = self.from_reference {
            builder = builder.from_reference(node.into_composed()?);
        }
        Ok(builder.build())
    }
}

impl TransformNode {
    /// `None` for an empty chain.
    pub fn from_composed(t: &ComposedTransform) -> Option<Self> {
        match t {
            ComposedTransform::Empty => None,
            ComposedTransform::Single(step) => Some(Self::from_step(step)),
            ComposedTransform::Group(group) => Some(Self::GroupTransform {
                children: group.steps().iter().map(Self::from_step).collect(),
            }),
        }
    }

    fn from_step(step: &TransformDescriptor) -> Self {
        match step {
            TransformDescriptor::FileLut(f) => Self::FileTransform {
                src: f.src.to_string_lossy().replace('\\', "/"),
                interpolation: f.interpolation.as_str().to_string(),
                direction: f.direction.as_str().to_string(),
            },
            TransformDescriptor::Matrix(m) => Self::MatrixTransform {
                matrix: m.matrix.to_m44().to_vec(),
                offset: m.offset.map(|o| o.to_vec()),
                direction: m.direction.as_str().to_string(),
            },
            TransformDescriptor::Exponent(e) => Self::ExponentTransform {
                value: e.value.to_vec(),
            },
            TransformDescriptor::Log(l) => Self::LogTransform {
                base: l.base,
                direction: l.direction.as_str().to_string(),
            },
            TransformDescriptor::ColorSpaceRef(c) => Self::ColorSpaceTransform {
                src: c.src.clone(),
                dst: c.dst.clone(),
            },
        }
    }

    pub fn into_composed(self) -> OcioResult<ComposedTransform> {
        match self {
            Self::GroupTransform { children } => {
                let steps = children
                    .into_iter()
                    .map(Self::into_step)
                    .collect::<OcioResult<Vec<_>>>()?;
                Ok(compose(steps))
            }
            node => Ok(ComposedTransform::Single(node.into_step()?)),
        }
    }

    fn into_step(self) -> OcioResult<TransformDescriptor> {
        let step = match self {
            Self::FileTransform {
                src,
                interpolation,
                direction,
            } => TransformDescriptor::FileLut(FileTransform {
                src: PathBuf::from(src),
                interpolation: Interpolation::parse(&interpolation).ok_or_else(|| {
                    OcioError::invalid(format!("FileTransform: unknown interpolation '{interpolation}'"))
                })?,
                direction: parse_direction(&direction)?,
            }),
            Self::MatrixTransform {
                matrix,
                offset,
                direction,
            } => {
                let coefficients = MatrixCoefficients::from_slice(&matrix).ok_or_else(|| {
                    OcioError::invalid(format!(
                        "MatrixTransform: expected 9 or 16 coefficients, got {}",
                        matrix.len()
                    ))
                })?;
                let offset = match offset.as_deref() {
                    None => None,
                    Some([r, g, b, a]) => Some([*r, *g, *b, *a]),
                    Some(other) => {
                        return Err(OcioError::invalid(format!(
                            "MatrixTransform: expected 4 offsets, got {}",
                            other.len()
                        )));
                    }
                };
                TransformDescriptor::Matrix(MatrixTransform {
                    matrix: coefficients,
                    offset,
                    direction: parse_direction(&direction)?,
                })
            }
            Self::ExponentTransform { value } => {
                let value: [f64; 4] = value.as_slice().try_into().map_err(|_| {
                    OcioError::invalid(format!(
                        "ExponentTransform: expected 4 values, got {}",
                        value.len()
                    ))
                })?;
                TransformDescriptor::Exponent(ExponentTransform { value })
            }
            Self::LogTransform { base, direction } => TransformDescriptor::Log(LogTransform {
                base,
                direction: parse_direction(&direction)?,
            }),
            Self::ColorSpaceTransform { src, dst } => {
                TransformDescriptor::ColorSpaceRef(ColorSpaceTransform::new(src, dst))
            }
            Self::GroupTransform { .. } => {
                return Err(OcioError::invalid("nested GroupTransform"));
            }
        };
        Ok(step)
    }
}

fn parse_direction(s: &str) -> OcioResult<TransformDirection> {
    TransformDirection::parse(s)
        .ok_or_else(|| OcioError::invalid(format!("unknown direction '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_list_forms() {
        let joined: ActiveList = serde_yaml::from_str("\"ACES, sRGB,,\"").unwrap();
        assert_eq!(joined.into_vec(), vec!["ACES", "sRGB"]);

        let list: ActiveList = serde_yaml::from_str("[ACES, sRGB]").unwrap();
        assert_eq!(list.into_vec(), vec!["ACES", "sRGB"]);

        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(ActiveList::join(&names), ActiveList::Joined("a,b".into()));
    }

    #[test]
    fn tagged_transform_yaml() {
        let node = TransformNode::GroupTransform {
            children: vec![
                TransformNode::FileTransform {
                    src: "logc.spi1d".into(),
                    interpolation: "linear".into(),
                    direction: "forward".into(),
                },
                TransformNode::LogTransform {
                    base: 2.0,
                    direction: "inverse".into(),
                },
            ],
        };
        let yaml = serde_yaml::to_string(&node).unwrap();
        assert!(yaml.contains("!GroupTransform"));
        assert!(yaml.contains("!FileTransform"));
        assert!(!yaml.contains("forward"));

        let back: TransformNode = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, node);
        assert_eq!(back.into_composed().unwrap().len(), 2);
    }

    #[test]
    fn matrix_widened_on_write() {
        let step = TransformDescriptor::matrix33([2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0]);
        let node = TransformNode::from_composed(&ComposedTransform::Single(step)).unwrap();
        let TransformNode::MatrixTransform { matrix, .. } = &node else {
            panic!("expected matrix");
        };
        assert_eq!(matrix.len(), 16);
        assert_eq!(matrix[15], 1.0);
        assert!(node.into_composed().is_ok());
    }

    #[test]
    fn empty_chain_is_omitted() {
        assert!(TransformNode::from_composed(&ComposedTransform::Empty).is_none());
    }
}
