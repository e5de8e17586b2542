//! Color space definition and properties.
//!
//! A color space defines:
//! - How to convert to/from the reference space
//! - UI grouping (family, equality group)
//! - Storage hints (bit depth, allocation)
//! - Alias names that forward to it
//!
//! # Example
//!
//! ```
//! use aces_ocio::{ColorSpace, BitDepth, TransformDescriptor};
//!
//! let cs = ColorSpace::builder("ACEScg")
//!     .family("ACES")
//!     .bit_depth(BitDepth::F32)
//!     .description("ACES CG working space")
//!     .alias("acescg")
//!     .to_reference(TransformDescriptor::matrix33([
//!         0.6954522414, 0.1406786965, 0.1638690622,
//!         0.0447945634, 0.8596711185, 0.0955343182,
//!         -0.0055258826, 0.0040252103, 1.0015006723,
//!     ]))
//!     .build();
//!
//! assert_eq!(cs.name(), "ACEScg");
//! assert!(cs.has_to_reference());
//! assert!(!cs.has_from_reference());
//! ```

use crate::transform::ComposedTransform;

/// Bit depth hint for the color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitDepth {
    /// 8-bit unsigned integer.
    Uint8,
    /// 10-bit unsigned integer.
    Uint10,
    /// 12-bit unsigned integer.
    Uint12,
    /// 14-bit unsigned integer.
    Uint14,
    /// 16-bit unsigned integer.
    Uint16,
    /// 32-bit unsigned integer.
    Uint32,
    /// 16-bit float.
    F16,
    /// 32-bit float.
    #[default]
    F32,
}

impl BitDepth {
    /// Parses a document keyword (`8ui`, `16f`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "8ui" => Some(Self::Uint8),
            "10ui" => Some(Self::Uint10),
            "12ui" => Some(Self::Uint12),
            "14ui" => Some(Self::Uint14),
            "16ui" => Some(Self::Uint16),
            "32ui" => Some(Self::Uint32),
            "16f" => Some(Self::F16),
            "32f" => Some(Self::F32),
            _ => None,
        }
    }

    /// Returns the document keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uint8 => "8ui",
            Self::Uint10 => "10ui",
            Self::Uint12 => "12ui",
            Self::Uint14 => "14ui",
            Self::Uint16 => "16ui",
            Self::Uint32 => "32ui",
            Self::F16 => "16f",
            Self::F32 => "32f",
        }
    }
}

/// Allocation type used for LUT addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AllocationType {
    /// Uniform distribution.
    #[default]
    Uniform,
    /// Base-2 logarithmic distribution.
    Lg2,
}

impl AllocationType {
    /// Parses a document keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "uniform" => Some(Self::Uniform),
            "lg2" => Some(Self::Lg2),
            _ => None,
        }
    }

    /// Returns the document keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Lg2 => "lg2",
        }
    }
}

/// Allocation hints.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Allocation type.
    pub alloc_type: AllocationType,
    /// Range variables (min, max and, for `lg2`, an optional offset).
    pub vars: Vec<f64>,
}

impl Default for Allocation {
    fn default() -> Self {
        Self {
            alloc_type: AllocationType::Uniform,
            vars: vec![0.0, 1.0],
        }
    }
}

impl Allocation {
    /// Logarithmic allocation over `vars`.
    pub fn lg2(vars: impl Into<Vec<f64>>) -> Self {
        Self {
            alloc_type: AllocationType::Lg2,
            vars: vars.into(),
        }
    }
}

/// Color space definition.
///
/// Represents a named color space with transforms to/from reference space.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpace {
    /// Unique name (case-significant).
    name: String,
    /// Alias names, expanded into forwarding spaces on registration.
    aliases: Vec<String>,
    /// Human-readable description.
    description: String,
    /// UI grouping.
    family: String,
    /// Equality group.
    equality_group: String,
    /// Bit depth hint.
    bit_depth: BitDepth,
    /// Whether this is for non-color data.
    is_data: bool,
    /// Allocation hints.
    allocation: Allocation,
    /// Transform from this space to reference.
    to_reference: Option<ComposedTransform>,
    /// Transform from reference to this space.
    from_reference: Option<ComposedTransform>,
}

impl ColorSpace {
    /// Creates a new color space with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            family: String::new(),
            equality_group: String::new(),
            bit_depth: BitDepth::default(),
            is_data: false,
            allocation: Allocation::default(),
            to_reference: None,
            from_reference: None,
        }
    }

    /// Creates a builder for constructing color spaces.
    #[inline]
    pub fn builder(name: impl Into<String>) -> ColorSpaceBuilder {
        ColorSpaceBuilder::new(name)
    }

    /// Returns the color space name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all aliases.
    #[inline]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Returns the description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the family.
    #[inline]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Returns the equality group.
    #[inline]
    pub fn equality_group(&self) -> &str {
        &self.equality_group
    }

    /// Returns the bit depth hint.
    #[inline]
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Checks if this is a data (non-color) space.
    #[inline]
    pub fn is_data(&self) -> bool {
        self.is_data
    }

    /// Returns allocation hints.
    #[inline]
    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    /// Returns the transform to reference space.
    #[inline]
    pub fn to_reference(&self) -> Option<&ComposedTransform> {
        self.to_reference.as_ref()
    }

    /// Returns the transform from reference space.
    #[inline]
    pub fn from_reference(&self) -> Option<&ComposedTransform> {
        self.from_reference.as_ref()
    }

    /// True when a non-empty to-reference chain is set.
    pub fn has_to_reference(&self) -> bool {
        self.to_reference.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// True when a non-empty from-reference chain is set.
    pub fn has_from_reference(&self) -> bool {
        self.from_reference.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Case-insensitive name comparison.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Builder for constructing color spaces.
#[derive(Debug)]
pub struct ColorSpaceBuilder {
    inner: ColorSpace,
}

impl ColorSpaceBuilder {
    /// Creates a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: ColorSpace::new(name),
        }
    }

    /// Adds an alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.inner.aliases.push(alias.into());
        self
    }

    /// Adds several aliases.
    pub fn aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.inner.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.inner.description = desc.into();
        self
    }

    /// Sets the family.
    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.inner.family = family.into();
        self
    }

    /// Sets the equality group.
    pub fn equality_group(mut self, group: impl Into<String>) -> Self {
        self.inner.equality_group = group.into();
        self
    }

    /// Sets the bit depth.
    pub fn bit_depth(mut self, depth: BitDepth) -> Self {
        self.inner.bit_depth = depth;
        self
    }

    /// Marks as data (non-color) space.
    pub fn is_data(mut self, is_data: bool) -> Self {
        self.inner.is_data = is_data;
        self
    }

    /// Sets allocation info.
    pub fn allocation(mut self, alloc: Allocation) -> Self {
        self.inner.allocation = alloc;
        self
    }

    /// Sets the transform to reference space.
    pub fn to_reference(mut self, transform: impl Into<ComposedTransform>) -> Self {
        self.inner.to_reference = Some(transform.into());
        self
    }

    /// Sets the transform from reference space.
    pub fn from_reference(mut self, transform: impl Into<ComposedTransform>) -> Self {
        self.inner.from_reference = Some(transform.into());
        self
    }

    /// Builds the color space.
    pub fn build(self) -> ColorSpace {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{TransformDescriptor, TransformDirection};

    #[test]
    fn build_colorspace() {
        let cs = ColorSpace::builder("ACEScc")
            .alias("acescc")
            .family("ACES")
            .equality_group("log")
            .allocation(Allocation::lg2([-8.0, 5.0, 0.00390625]))
            .description("ACEScc log working space")
            .build();

        assert_eq!(cs.name(), "ACEScc");
        assert_eq!(cs.family(), "ACES");
        assert_eq!(cs.aliases(), ["acescc".to_string()]);
        assert_eq!(cs.allocation().alloc_type, AllocationType::Lg2);
        assert!(cs.matches_name("ACESCC"));
        assert!(!cs.is_data());
    }

    #[test]
    fn empty_chain_counts_as_absent() {
        let cs = ColorSpace::builder("Raw")
            .is_data(true)
            .to_reference(Vec::<TransformDescriptor>::new())
            .from_reference(TransformDescriptor::log(2.0, TransformDirection::Forward))
            .build();

        assert!(cs.to_reference().is_some());
        assert!(!cs.has_to_reference());
        assert!(cs.has_from_reference());
    }

    #[test]
    fn keyword_parsing() {
        assert_eq!(BitDepth::parse("16F"), Some(BitDepth::F16));
        assert_eq!(BitDepth::parse("bogus"), None);
        assert_eq!(BitDepth::Uint10.as_str(), "10ui");
        assert_eq!(AllocationType::parse("lg2"), Some(AllocationType::Lg2));
    }
}
