//! Alias expansion.
//!
//! An alias is not stored as a name list in the persisted document. Each
//! alias becomes its own color space in the [`ALIAS_FAMILY`] family whose
//! reference transforms are a single color-space indirection, so the
//! alias follows whatever the engine resolves for the named spaces.

use tracing::debug;

use crate::colorspace::ColorSpace;
use crate::transform::TransformDescriptor;

/// Family assigned to every synthesized alias.
pub const ALIAS_FAMILY: &str = "Aliases";

/// Synthesizes one forwarding color space per alias name.
///
/// Names equal to `original`'s name (ignoring case) are skipped. Output
/// order follows `alias_names`. A reference direction is only wired when
/// `original` defines a non-empty chain for it.
pub fn bind_aliases(
    original: &ColorSpace,
    alias_names: &[String],
    reference_name: &str,
) -> Vec<ColorSpace> {
    let mut out = Vec::with_capacity(alias_names.len());

    for alias in alias_names {
        if original.matches_name(alias) {
            debug!(alias = %alias, colorspace = %original.name(), "skipping self-alias");
            continue;
        }

        debug!(alias = %alias, colorspace = %original.name(), "adding alias color space");

        let mut builder = ColorSpace::builder(alias.as_str())
            .bit_depth(original.bit_depth())
            .description(original.description())
            .equality_group(original.equality_group())
            .family(ALIAS_FAMILY)
            .is_data(original.is_data())
            .allocation(original.allocation().clone());

        if original.has_to_reference() {
            builder = builder.to_reference(TransformDescriptor::colorspace_ref(
                alias.as_str(),
                reference_name,
            ));
        }
        if original.has_from_reference() {
            builder = builder.from_reference(TransformDescriptor::colorspace_ref(
                reference_name,
                alias.as_str(),
            ));
        }

        out.push(builder.build());
    }

    out
}
