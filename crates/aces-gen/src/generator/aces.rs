//! The ACES color-space family.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use aces_ocio::{
    Allocation, AllocationType, BitDepth, ColorSpace, ColorSpaceBuilder, Interpolation,
    OUTPUT_TRANSFORM_VIEW, TransformDescriptor, TransformDirection,
};

use super::{
    ColorSpaceGenerator, DisplayEntry, GenContext, VendorOutput, compact, look_space_name,
    output_space_name,
};
use crate::bake::range_variants;
use crate::discovery::{TransformCatalog, TransformRecord};
use crate::error::GenResult;
use crate::materialize::{LutDimension, LutRequest};

/// Name of the reference space.
pub const REFERENCE_NAME: &str = "ACES2065-1";
/// Space shown by the `Log` view and the alternate consumer's `log` display.
pub const LOG_DISPLAY_SPACE: &str = "ACEScc";
/// Log2 shaper the output and look tables are sampled through.
pub const SHAPER_NAME: &str = "Output Shaper";

const RAW_NAME: &str = "Raw";
const LOG_VIEW: &str = "Log";

/// AP1 → AP0.
const AP1_TO_AP0: [f64; 9] = [
    0.6954522414, 0.1406786965, 0.1638690622, //
    0.0447945634, 0.8596711185, 0.0955343182, //
    -0.0055258826, 0.0040252103, 1.0015006723,
];

const ACESCC_TO_ACES: &str = "ACEScc/ACEScsc.ACEScc_to_ACES.a1.0.0.ctl";
const ACESPROXY_TO_ACES: &str = "ACESproxy/ACEScsc.ACESproxy10i_to_ACES.a1.0.0.ctl";
const ACES_TO_ACESCG: &str = "ACEScg/ACEScsc.ACES_to_ACEScg.a1.0.0.ctl";
const SHAPER_TO_LIN: &str = "utilities/ACESlib.OCIO_shaper_log2_to_lin_param.a1.0.0.ctl";
const LIN_TO_SHAPER: &str = "utilities/ACESlib.OCIO_shaper_lin_to_log2_param.a1.0.0.ctl";
const RRT: &str = "rrt/RRT.a1.0.0.ctl";
const INV_RRT: &str = "rrt/InvRRT.a1.0.0.ctl";

/// Generates the reference, working, log, utility, output and look spaces.
#[derive(Debug, Clone, Default)]
pub struct AcesGenerator {
    odts: TransformCatalog,
    lmts: TransformCatalog,
}

impl AcesGenerator {
    /// Creates a generator over the discovered output and look transforms.
    pub fn new(odts: TransformCatalog, lmts: TransformCatalog) -> Self {
        Self { odts, lmts }
    }

    /// The reference space.
    pub fn reference() -> ColorSpace {
        ColorSpace::builder(REFERENCE_NAME)
            .family("ACES")
            .description("The Academy Color Encoding System reference color space")
            .allocation(Allocation::lg2([-8.0, 5.0, 0.00390625]))
            .aliases(["lin_ap0", "aces"])
            .build()
    }
}

fn uniform(min: f64, max: f64) -> Allocation {
    Allocation {
        alloc_type: AllocationType::Uniform,
        vars: vec![min, max],
    }
}

fn lut_step(
    path: impl Into<PathBuf>,
    interpolation: Interpolation,
    dir: TransformDirection,
) -> TransformDescriptor {
    TransformDescriptor::file_lut(path, interpolation, dir)
}

fn acescg() -> ColorSpace {
    ColorSpace::builder("ACEScg")
        .family("ACES")
        .description("The ACEScg color space\n\nACES Transform ID : ACEScsc.ACEScg_to_ACES.a1.0.0")
        .allocation(Allocation::lg2([-8.0, 5.0, 0.00390625]))
        .alias("lin_ap1")
        .to_reference(TransformDescriptor::matrix33(AP1_TO_AP0))
        .build()
}

fn raw() -> ColorSpace {
    ColorSpace::builder(RAW_NAME)
        .family("Utility")
        .description("The Raw color space")
        .is_data(true)
        .build()
}

/// Log encoding decoded by a 1D table to AP1, then converted to AP0.
fn log_encoding(
    ctx: &GenContext<'_>,
    name: &str,
    ctl: &str,
    transform_id: &str,
) -> GenResult<ColorSpaceBuilder> {
    let request = LutRequest::new(
        transform_id,
        vec![PathBuf::from(ctl), PathBuf::from(ACES_TO_ACESCG)],
        LutDimension::OneD(ctx.lut_resolution_1d),
        &format!("{name}_to_linear"),
    );
    let lut = ctx.materializer.materialize(&request)?;
    Ok(ColorSpace::builder(name)
        .family("ACES")
        .description(format!("The {name} color space\n\nACES Transform ID : {transform_id}"))
        .to_reference(vec![
            lut_step(lut, Interpolation::Linear, TransformDirection::Forward),
            TransformDescriptor::matrix33(AP1_TO_AP0),
        ]))
}

fn acescc(ctx: &GenContext<'_>) -> GenResult<ColorSpace> {
    Ok(log_encoding(ctx, "ACEScc", ACESCC_TO_ACES, "ACEScsc.ACEScc_to_ACES.a1.0.0")?
        .allocation(uniform(-0.3584, 1.468))
        .alias("acescc_ap1")
        .build())
}

fn acesproxy(ctx: &GenContext<'_>) -> GenResult<ColorSpace> {
    Ok(log_encoding(ctx, "ACESproxy", ACESPROXY_TO_ACES, "ACEScsc.ACESproxy10i_to_ACES.a1.0.0")?
        .bit_depth(BitDepth::Uint10)
        .alias("acesproxy_ap1")
        .build())
}

/// The shaper spaces and the shaper table path.
fn shaper_spaces(ctx: &GenContext<'_>) -> GenResult<(ColorSpace, ColorSpace, PathBuf)> {
    let request = LutRequest::new(
        "ACESlib.OCIO_shaper_log2_to_lin_param.a1.0.0",
        vec![PathBuf::from(SHAPER_TO_LIN)],
        LutDimension::OneD(ctx.lut_resolution_1d),
        SHAPER_NAME,
    );
    let lut = ctx.materializer.materialize(&request)?;
    let decode = lut_step(&lut, Interpolation::Linear, TransformDirection::Forward);

    let shaper = ColorSpace::builder(SHAPER_NAME)
        .family("Utility")
        .description("A log2 shaper over the ACES scene-linear range")
        .alias("crv_shaper")
        .to_reference(decode.clone())
        .build();
    let shaper_ap1 = ColorSpace::builder(format!("{SHAPER_NAME} - AP1"))
        .family("Utility")
        .description("A log2 shaper over the ACES scene-linear range, with AP1 primaries")
        .alias("crv_shaper_ap1")
        .to_reference(vec![decode, TransformDescriptor::matrix33(AP1_TO_AP0)])
        .build();
    Ok((shaper, shaper_ap1, lut))
}

/// `shaper → RRT → ODT` table, plus the inverse chain when an inverse ODT exists.
fn output_space(
    ctx: &GenContext<'_>,
    record: &TransformRecord,
    user_name: &str,
    legal: bool,
    shaper_lut: &Path,
) -> GenResult<ColorSpace> {
    let name = output_space_name(user_name);
    let mut forward = LutRequest::new(
        &record.transform_id,
        vec![PathBuf::from(SHAPER_TO_LIN), PathBuf::from(RRT), record.forward_path.clone()],
        LutDimension::ThreeD(ctx.lut_resolution_3d),
        &name,
    );
    if legal {
        forward = forward.legal();
    }
    let lut = ctx.materializer.materialize(&forward)?;

    let mut builder = ColorSpace::builder(&name)
        .family("Output")
        .description(format!(
            "{} - {user_name}\n\nACES Transform ID : {}",
            record.display_name_prefix, record.transform_id
        ))
        .alias(format!("out_{}", compact(user_name)))
        .from_reference(vec![
            lut_step(shaper_lut, Interpolation::Linear, TransformDirection::Inverse),
            lut_step(lut, Interpolation::Tetrahedral, TransformDirection::Forward),
        ]);

    if let Some(inverse) = &record.inverse_path {
        let mut request = LutRequest::new(
            &record.transform_id,
            vec![inverse.clone(), PathBuf::from(INV_RRT), PathBuf::from(LIN_TO_SHAPER)],
            LutDimension::ThreeD(ctx.lut_resolution_3d),
            &format!("InvRRT.{name}"),
        );
        if legal {
            request = request.legal();
        }
        let inv = ctx.materializer.materialize(&request)?;
        builder = builder.to_reference(vec![
            lut_step(inv, Interpolation::Tetrahedral, TransformDirection::Forward),
            lut_step(shaper_lut, Interpolation::Linear, TransformDirection::Forward),
        ]);
    }
    Ok(builder.build())
}

/// Look applied in shaper space.
fn look_space(ctx: &GenContext<'_>, record: &TransformRecord, shaper_lut: &Path) -> GenResult<ColorSpace> {
    let name = look_space_name(&record.display_name);
    let sampled = |ctl: &Path, stem: &str| {
        ctx.materializer.materialize(&LutRequest::new(
            &record.transform_id,
            vec![PathBuf::from(SHAPER_TO_LIN), ctl.to_path_buf(), PathBuf::from(LIN_TO_SHAPER)],
            LutDimension::ThreeD(ctx.lut_resolution_3d),
            stem,
        ))
    };
    let through_shaper = |lut: PathBuf| {
        vec![
            lut_step(shaper_lut, Interpolation::Linear, TransformDirection::Inverse),
            lut_step(lut, Interpolation::Tetrahedral, TransformDirection::Forward),
            lut_step(shaper_lut, Interpolation::Linear, TransformDirection::Forward),
        ]
    };

    let lut = sampled(&record.forward_path, &name)?;
    let mut builder = ColorSpace::builder(&name)
        .family("Look")
        .description(format!(
            "{} - {}\n\nACES Transform ID : {}",
            record.display_name_prefix, record.display_name, record.transform_id
        ))
        .alias(format!("look_{}", compact(&record.display_name)))
        .from_reference(through_shaper(lut));

    if let Some(inverse) = &record.inverse_path {
        let inv = sampled(inverse, &format!("Inverse.{name}"))?;
        builder = builder.to_reference(through_shaper(inv));
    }
    Ok(builder.build())
}

impl ColorSpaceGenerator for AcesGenerator {
    fn name(&self) -> &str {
        "aces"
    }

    fn generate(&self, ctx: &GenContext<'_>) -> GenResult<VendorOutput> {
        let mut out = VendorOutput {
            reference: Some(Self::reference()),
            ..VendorOutput::default()
        };
        let policy = ctx.policy;

        out.colorspaces.push(acescg());
        if let Some(cs) = policy.settle("ACEScc", acescc(ctx), &mut out.failures)? {
            out.log_display_space = Some(cs.name().to_string());
            out.colorspaces.push(cs);
        }
        if let Some(cs) = policy.settle("ACESproxy", acesproxy(ctx), &mut out.failures)? {
            out.colorspaces.push(cs);
        }
        out.colorspaces.push(raw());

        let Some((shaper, shaper_ap1, shaper_lut)) =
            policy.settle(SHAPER_NAME, shaper_spaces(ctx), &mut out.failures)?
        else {
            warn!("shaper unavailable, skipping output and look spaces");
            return Ok(out);
        };
        out.colorspaces.push(shaper);
        out.colorspaces.push(shaper_ap1);

        // Table rendering dominates, so outputs and looks render in parallel
        // and settle in catalog order.
        let variants: Vec<(&TransformRecord, String, bool)> = self
            .odts
            .iter()
            .flat_map(|(name, record)| {
                range_variants(name, &record.display_name)
                    .into_iter()
                    .map(move |(user_name, legal)| (record, user_name, legal))
            })
            .collect();
        let outputs: Vec<_> = variants
            .par_iter()
            .map(|(record, user_name, legal)| output_space(ctx, record, user_name, *legal, &shaper_lut))
            .collect();

        let log_space = out.log_display_space.clone();
        for ((_, user_name, _), result) in variants.iter().zip(outputs) {
            let Some(cs) = policy.settle(&output_space_name(user_name), result, &mut out.failures)? else {
                continue;
            };
            debug!(display = %user_name, colorspace = %cs.name(), "output space");
            out.displays.push(DisplayEntry::new(user_name, OUTPUT_TRANSFORM_VIEW, cs.name()));
            if let Some(log) = &log_space {
                out.displays.push(DisplayEntry::new(user_name, LOG_VIEW, log));
            }
            out.displays.push(DisplayEntry::new(user_name, RAW_NAME, RAW_NAME));
            out.colorspaces.push(cs);
        }

        let looks: Vec<_> = self
            .lmts
            .par_iter()
            .map(|(_, record)| (record, look_space(ctx, record, &shaper_lut)))
            .collect();
        for (record, result) in looks {
            if let Some(cs) = policy.settle(&look_space_name(&record.display_name), result, &mut out.failures)? {
                out.colorspaces.push(cs);
            }
        }

        info!(
            colorspaces = out.colorspaces.len(),
            displays = out.displays.len(),
            failures = out.failures.len(),
            "generated ACES color spaces"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenError;
    use crate::materialize::{LutMaterializer, PlannedMaterializer};
    use crate::pipeline::FailurePolicy;

    fn record(id: &str, user: &str, inverse: bool) -> TransformRecord {
        TransformRecord {
            forward_path: PathBuf::from(format!("odt/ODT.{id}.ctl")),
            inverse_path: inverse.then(|| PathBuf::from(format!("odt/InvODT.{id}.ctl"))),
            transform_id: format!("ODT.{id}"),
            display_name: user.into(),
            display_name_prefix: "ACES 1.0 Output".into(),
        }
    }

    fn ctx(materializer: &dyn LutMaterializer, policy: FailurePolicy) -> GenContext<'_> {
        GenContext {
            materializer,
            lut_resolution_1d: 1024,
            lut_resolution_3d: 33,
            policy,
        }
    }

    fn catalog(entries: &[(&str, &str, bool)]) -> TransformCatalog {
        entries
            .iter()
            .map(|(id, user, inv)| (id.to_string(), record(id, user, *inv)))
            .collect()
    }

    #[test]
    fn base_family() {
        let generator = AcesGenerator::default();
        let out = generator.generate(&ctx(&PlannedMaterializer, FailurePolicy::Continue)).unwrap();

        assert_eq!(out.reference.as_ref().map(|r| r.name()), Some(REFERENCE_NAME));
        assert_eq!(out.log_display_space.as_deref(), Some(LOG_DISPLAY_SPACE));
        let names: Vec<&str> = out.colorspaces.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            ["ACEScg", "ACEScc", "ACESproxy", "Raw", "Output Shaper", "Output Shaper - AP1"]
        );
        let proxy = &out.colorspaces[2];
        assert_eq!(proxy.bit_depth(), BitDepth::Uint10);
        assert_eq!(proxy.to_reference().map(|t| t.len()), Some(2));
        assert!(out.colorspaces[3].is_data());
        assert!(out.displays.is_empty());
    }

    #[test]
    fn output_and_look_spaces() {
        let odts = catalog(&[
            ("Academy.Rec709_100nits_dim.a1.0.0", "Rec.709", true),
            ("Academy.sRGB.a1.0.0", "sRGB", false),
        ]);
        let lmts = catalog(&[("Academy.BlueLightArtifactFix.a1.0.0", "Blue Light Artifact Fix", false)]);
        let generator = AcesGenerator::new(odts, lmts);
        let out = generator.generate(&ctx(&PlannedMaterializer, FailurePolicy::Continue)).unwrap();

        let find = |n: &str| out.colorspaces.iter().find(|c| c.name() == n);
        let legal = find("Output - Rec.709 - Legal").unwrap();
        assert!(legal.has_to_reference());
        assert_eq!(legal.from_reference().map(|t| t.len()), Some(2));
        assert!(legal.aliases().contains(&"out_rec_709_legal".to_string()));
        assert!(find("Output - Rec.709 - Full").is_some());
        assert!(find("Output - Rec.709").is_none());

        let srgb = find("Output - sRGB").unwrap();
        assert!(!srgb.has_to_reference());

        let look = find("Look - Blue Light Artifact Fix").unwrap();
        assert_eq!(look.from_reference().map(|t| t.len()), Some(3));
        assert_eq!(look.aliases(), ["look_blue_light_artifact_fix"]);

        assert!(out.displays.contains(&DisplayEntry::new("sRGB", OUTPUT_TRANSFORM_VIEW, "Output - sRGB")));
        assert!(out.displays.contains(&DisplayEntry::new("Rec.709 - Full", "Log", "ACEScc")));
        assert_eq!(out.displays.len(), 9);
    }

    struct RejectLegal;

    impl LutMaterializer for RejectLegal {
        fn materialize(&self, request: &LutRequest) -> GenResult<PathBuf> {
            if request.legal_range {
                return Err(GenError::Materialization {
                    transform_id: request.transform_id.clone(),
                    reason: "legal range unsupported".into(),
                });
            }
            PlannedMaterializer.materialize(request)
        }
    }

    #[test]
    fn materialization_failures_follow_policy() {
        let odts = catalog(&[("Academy.Rec709_100nits_dim.a1.0.0", "Rec.709", false)]);
        let generator = AcesGenerator::new(odts, TransformCatalog::new());

        let out = generator.generate(&ctx(&RejectLegal, FailurePolicy::Continue)).unwrap();
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].item, "Output - Rec.709 - Legal");
        assert!(out.colorspaces.iter().any(|c| c.name() == "Output - Rec.709 - Full"));
        assert!(out.displays.iter().all(|d| d.display != "Rec.709 - Legal"));

        let err = generator.generate(&ctx(&RejectLegal, FailurePolicy::FailFast)).unwrap_err();
        assert!(matches!(err, GenError::Materialization { .. }));
    }
}
