//! Color-space generators.
//!
//! A generator contributes color spaces and display views to the config.
//! [`AcesGenerator`] produces the ACES family from the discovered CTL
//! transforms; [`ManifestGenerator`] loads vendor spaces from YAML.

mod aces;
mod manifest;

pub use aces::{AcesGenerator, LOG_DISPLAY_SPACE, REFERENCE_NAME, SHAPER_NAME};
pub use manifest::{ManifestColorSpace, ManifestGenerator, VendorManifest};

use aces_ocio::ColorSpace;

use crate::error::GenResult;
use crate::materialize::LutMaterializer;
use crate::pipeline::{FailurePolicy, ItemFailure};

/// One `(display, view) → color space` binding.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct DisplayEntry {
    /// Display name.
    pub display: String,
    /// View name.
    pub view: String,
    /// Target color space.
    pub colorspace: String,
}

impl DisplayEntry {
    /// Creates an entry.
    pub fn new(
        display: impl Into<String>,
        view: impl Into<String>,
        colorspace: impl Into<String>,
    ) -> Self {
        Self {
            display: display.into(),
            view: view.into(),
            colorspace: colorspace.into(),
        }
    }
}

/// What a generator contributes.
#[derive(Debug, Default)]
pub struct VendorOutput {
    /// The reference space, from the generator that defines it.
    pub reference: Option<ColorSpace>,
    /// Log space of the alternate consumer's `log` display.
    pub log_display_space: Option<String>,
    /// Color spaces, excluding the reference.
    pub colorspaces: Vec<ColorSpace>,
    /// Display bindings.
    pub displays: Vec<DisplayEntry>,
    /// Items skipped under [`FailurePolicy::Continue`].
    pub failures: Vec<ItemFailure>,
}

/// Shared generator inputs.
pub struct GenContext<'a> {
    /// Renders lookup tables.
    pub materializer: &'a dyn LutMaterializer,
    /// 1D table size.
    pub lut_resolution_1d: u32,
    /// 3D cube size.
    pub lut_resolution_3d: u32,
    /// What to do when an item fails.
    pub policy: FailurePolicy,
}

/// Produces color spaces for the config.
pub trait ColorSpaceGenerator: Send + Sync {
    /// Short name for logs and failure reports.
    fn name(&self) -> &str;

    /// Generates this generator's contribution.
    fn generate(&self, ctx: &GenContext<'_>) -> GenResult<VendorOutput>;
}

/// Lowercase identifier form of a name: `Rec.709 - Legal` → `rec_709_legal`.
pub fn compact(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending && !out.is_empty() {
                out.push('_');
            }
            pending = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending = true;
        }
    }
    out
}

/// Config name of the output space for an ODT user name.
pub fn output_space_name(user_name: &str) -> String {
    format!("Output - {user_name}")
}

/// Config name of the look space for an LMT user name.
pub fn look_space_name(user_name: &str) -> String {
    format!("Look - {user_name}")
}
