//! Run orchestration.
//!
//! ```text
//! discover odt/lmt ─► generators (parallel) ─► merge ─► ConfigData
//!                                                       ├─► config.ocio       (generic)
//!                                                       ├─► nuke_config.ocio  (alternate consumer)
//!                                                       └─► baked/**          (optional)
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use aces_ocio::{
    ColorSpace, Configuration, ConfigurationBuilder, DisplayMode, Engine, OcioError, Role,
    Serializer,
};

use crate::bake::{
    BakeFormat, BakeJob, BakeSettings, Baker, OcioBakeLut, plan_bake_jobs, run_bake_jobs,
};
use crate::discovery::{CtlDirectory, DescriptorSource, TransformCatalog, TransformKind};
use crate::error::{GenError, GenResult};
use crate::generator::{
    AcesGenerator, ColorSpaceGenerator, DisplayEntry, GenContext, ManifestGenerator, SHAPER_NAME,
    VendorOutput,
};
use crate::materialize::{ExternalRenderer, LutMaterializer, PlannedMaterializer};

/// Description written into both configs.
pub const CONFIG_DESCRIPTION: &str = "An ACES config generated by create-aces-config";
/// LUT directory, relative to the config directory.
pub const LUT_SEARCH_PATH: &str = "luts";
/// Generic config file name.
pub const CONFIG_FILE: &str = "config.ocio";
/// Alternate-consumer config file name.
pub const NUKE_CONFIG_FILE: &str = "nuke_config.ocio";

/// What to do when a single item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the run on the first failure.
    FailFast,
    /// Skip the item, record it in the report and go on.
    #[default]
    Continue,
}

impl FailurePolicy {
    /// Applies the policy to one item's result.
    ///
    /// `Ok(None)` means the item failed and was recorded in `failures`.
    pub fn settle<T>(
        self,
        item: &str,
        result: GenResult<T>,
        failures: &mut Vec<ItemFailure>,
    ) -> GenResult<Option<T>> {
        match (result, self) {
            (Ok(value), _) => Ok(Some(value)),
            (Err(e), Self::FailFast) => Err(e),
            (Err(e), Self::Continue) => {
                warn!(item, error = %e, "skipping failed item");
                failures.push(ItemFailure::new(item, e));
                Ok(None)
            }
        }
    }
}

/// An item skipped under [`FailurePolicy::Continue`].
#[derive(Debug)]
pub struct ItemFailure {
    /// Color space, generator or bake target that failed.
    pub item: String,
    /// Why.
    pub error: GenError,
}

impl ItemFailure {
    /// Creates a failure record.
    pub fn new(item: impl Into<String>, error: GenError) -> Self {
        Self {
            item: item.into(),
            error,
        }
    }
}

/// Merged generator output.
#[derive(Debug, Clone)]
pub struct ConfigData {
    /// Reference space.
    pub reference: ColorSpace,
    /// Every other space.
    pub colorspaces: Vec<ColorSpace>,
    /// Display bindings, in generator order.
    pub displays: Vec<DisplayEntry>,
    /// Space of the alternate consumer's `linear` display.
    pub linear_display_space: String,
    /// Space of the alternate consumer's `log` display.
    pub log_display_space: String,
}

impl ConfigData {
    /// Merges generator outputs in order.
    ///
    /// The first reference wins. A generator that failed as a whole is
    /// settled under `policy`.
    pub fn merge(
        outputs: Vec<(String, GenResult<VendorOutput>)>,
        policy: FailurePolicy,
    ) -> GenResult<(Self, Vec<ItemFailure>)> {
        let mut failures = Vec::new();
        let mut reference: Option<ColorSpace> = None;
        let mut log_space: Option<String> = None;
        let mut colorspaces = Vec::new();
        let mut displays = Vec::new();

        for (name, result) in outputs {
            let Some(out) = policy.settle(&name, result, &mut failures)? else {
                continue;
            };
            match (&reference, out.reference) {
                (None, Some(r)) => reference = Some(r),
                (Some(_), Some(r)) => warn!(generator = %name, reference = %r.name(), "ignoring second reference"),
                _ => {}
            }
            if log_space.is_none() {
                log_space = out.log_display_space;
            }
            debug!(generator = %name, colorspaces = out.colorspaces.len(), "merging");
            colorspaces.extend(out.colorspaces);
            displays.extend(out.displays);
            failures.extend(out.failures);
        }

        let reference = reference.unwrap_or_else(|| {
            warn!("no generator supplied a reference, using the ACES reference");
            AcesGenerator::reference()
        });
        let displays = wired_displays(displays, &reference, &colorspaces, policy, &mut failures)?;
        let linear_display_space = reference.name().to_string();
        let log_display_space = log_space.unwrap_or_else(|| {
            warn!("no log display space, using the reference");
            linear_display_space.clone()
        });

        Ok((
            Self {
                reference,
                colorspaces,
                displays,
                linear_display_space,
                log_display_space,
            },
            failures,
        ))
    }

    /// Display mode of the alternate-consumer config.
    pub fn alternate_mode(&self) -> DisplayMode {
        DisplayMode::AlternateConsumer {
            linear_space: self.linear_display_space.clone(),
            log_space: self.log_display_space.clone(),
        }
    }
}

/// Drops display entries whose color space is not among the merged spaces
/// or their aliases, settling each under `policy`.
fn wired_displays(
    displays: Vec<DisplayEntry>,
    reference: &ColorSpace,
    colorspaces: &[ColorSpace],
    policy: FailurePolicy,
    failures: &mut Vec<ItemFailure>,
) -> GenResult<Vec<DisplayEntry>> {
    let mut known: HashSet<&str> = HashSet::new();
    for cs in std::iter::once(reference).chain(colorspaces) {
        known.insert(cs.name());
        known.extend(
            cs.aliases()
                .iter()
                .filter(|alias| !cs.matches_name(alias))
                .map(String::as_str),
        );
    }

    let mut wired = Vec::with_capacity(displays.len());
    for entry in displays {
        if known.contains(entry.colorspace.as_str()) {
            wired.push(entry);
            continue;
        }
        let item = format!("{}/{}", entry.display, entry.view);
        let missing = OcioError::UnknownColorSpace {
            name: entry.colorspace,
        };
        policy.settle::<()>(&item, Err(missing.into()), failures)?;
    }
    Ok(wired)
}

/// Assembles and finalizes one configuration.
///
/// Color spaces are registered sorted by name, every role points at the
/// reference.
pub fn build_configuration(data: &ConfigData, mode: DisplayMode) -> GenResult<Configuration> {
    let mut builder = ConfigurationBuilder::new(data.reference.clone())
        .with_mode(mode)
        .description(CONFIG_DESCRIPTION)
        .search_path(LUT_SEARCH_PATH);
    builder.bind_reference_aliases()?;

    let mut spaces: Vec<&ColorSpace> = data.colorspaces.iter().collect();
    spaces.sort_by(|a, b| a.name().cmp(b.name()));
    for cs in spaces {
        builder.register(cs.clone())?;
    }

    for entry in &data.displays {
        builder.set_display_view(&entry.display, &entry.view, &entry.colorspace)?;
    }

    let reference = data.reference.name();
    for role in Role::ALL {
        builder.set_role(role, reference)?;
    }

    Ok(builder.finalize()?)
}

/// Settings of one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// ACES CTL root.
    pub ctl_dir: PathBuf,
    /// Output directory.
    pub config_dir: PathBuf,
    /// 1D table size, also the bake shaper size.
    pub lut_resolution_1d: u32,
    /// 3D cube size.
    pub lut_resolution_3d: u32,
    /// Bake the interchange LUTs.
    pub bake_secondary_luts: bool,
    /// Keep the renderer's intermediate images.
    pub keep_temp_images: bool,
    /// Failure policy for collaborators.
    pub policy: FailurePolicy,
    /// Vendor manifests.
    pub manifests: Vec<PathBuf>,
    /// LUT renderer; tables are only planned when absent.
    pub renderer: Option<PathBuf>,
    /// Baker executable.
    pub baker: PathBuf,
}

impl RunOptions {
    /// Defaults for the given roots.
    pub fn new(ctl_dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            ctl_dir: ctl_dir.into(),
            config_dir: config_dir.into(),
            lut_resolution_1d: 4096,
            lut_resolution_3d: 64,
            bake_secondary_luts: true,
            keep_temp_images: false,
            policy: FailurePolicy::default(),
            manifests: Vec::new(),
            renderer: None,
            baker: PathBuf::from("ociobakelut"),
        }
    }
}

/// External collaborators of a run.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Transform discovery.
    pub source: &'a dyn DescriptorSource,
    /// Table rendering.
    pub materializer: &'a dyn LutMaterializer,
    /// Interchange baking.
    pub baker: &'a dyn Baker,
}

/// Outcome of a run.
#[derive(Debug)]
pub struct RunReport {
    /// Generic config.
    pub config_path: PathBuf,
    /// Alternate-consumer config.
    pub nuke_config_path: PathBuf,
    /// Color spaces in the generic config, aliases included.
    pub colorspaces: usize,
    /// Baked files.
    pub baked: Vec<PathBuf>,
    /// Skipped items.
    pub failures: Vec<ItemFailure>,
}

/// `<config dir>/luts`
pub fn lut_directory(config_dir: &Path) -> PathBuf {
    config_dir.join(LUT_SEARCH_PATH)
}

fn create_config_dirs(config_dir: &Path, bake: bool) -> GenResult<PathBuf> {
    let lut_dir = lut_directory(config_dir);
    fs::create_dir_all(&lut_dir)?;
    if bake {
        let baked = config_dir.join("baked");
        for format in BakeFormat::ALL {
            fs::create_dir_all(baked.join(format.subdir()))?;
        }
    }
    Ok(lut_dir)
}

/// Runs discovery for one kind and settles every rejected file under
/// `policy`. A kind that cannot be scanned at all counts as one failed item.
fn discover_kind(
    source: &dyn DescriptorSource,
    kind: TransformKind,
    policy: FailurePolicy,
    failures: &mut Vec<ItemFailure>,
) -> GenResult<TransformCatalog> {
    let Some(found) = policy.settle(kind.dir_name(), source.discover(kind), failures)? else {
        return Ok(TransformCatalog::new());
    };
    for (path, error) in found.rejected {
        policy.settle::<()>(&path.display().to_string(), Err(error), failures)?;
    }
    Ok(found.catalog)
}

/// Keeps the jobs whose input, output and shaper spaces all made it into
/// `config`.
fn bakeable_jobs(config: &Configuration, mut jobs: Vec<BakeJob>) -> Vec<BakeJob> {
    jobs.retain(|job| {
        let missing = [&job.input_space, &job.output_space, &job.shaper_space]
            .into_iter()
            .find(|name| config.colorspace(name).is_none());
        if let Some(name) = missing {
            debug!(file = %job.output.display(), space = %name, "color space missing, not baked");
        }
        missing.is_none()
    });
    jobs
}

/// Generates both configs and, unless disabled, the baked LUTs.
pub fn create_aces_config(
    options: &RunOptions,
    collaborators: &Collaborators<'_>,
) -> GenResult<RunReport> {
    let lut_dir = create_config_dirs(&options.config_dir, options.bake_secondary_luts)?;
    debug!(lut_dir = %lut_dir.display(), "created config directories");

    let mut failures = Vec::new();
    let source = collaborators.source;
    let odts = discover_kind(source, TransformKind::Odt, options.policy, &mut failures)?;
    let lmts = discover_kind(source, TransformKind::Lmt, options.policy, &mut failures)?;
    info!(odts = odts.len(), lmts = lmts.len(), "discovered transforms");

    let mut generators: Vec<Box<dyn ColorSpaceGenerator>> =
        vec![Box::new(AcesGenerator::new(odts.clone(), lmts))];
    for path in &options.manifests {
        generators.push(Box::new(ManifestGenerator::new(path)));
    }

    let ctx = GenContext {
        materializer: collaborators.materializer,
        lut_resolution_1d: options.lut_resolution_1d,
        lut_resolution_3d: options.lut_resolution_3d,
        policy: options.policy,
    };
    let outputs: Vec<(String, GenResult<VendorOutput>)> = generators
        .par_iter()
        .map(|g| (g.name().to_string(), g.generate(&ctx)))
        .collect();
    let (data, merge_failures) = ConfigData::merge(outputs, options.policy)?;
    failures.extend(merge_failures);

    let engine = Engine::new();
    let serializer = Serializer::new(&engine);

    info!("creating generic config");
    let config = build_configuration(&data, DisplayMode::Generic)?;
    let config_path = options.config_dir.join(CONFIG_FILE);
    serializer.write(&config, &config_path)?;

    info!("creating alternate-consumer config");
    let nuke = build_configuration(&data, data.alternate_mode())?;
    let nuke_config_path = options.config_dir.join(NUKE_CONFIG_FILE);
    serializer.write(&nuke, &nuke_config_path)?;

    let mut baked = Vec::new();
    if options.bake_secondary_luts {
        let settings = BakeSettings {
            config_path: config_path.clone(),
            baked_dir: options.config_dir.join("baked"),
            shaper_name: SHAPER_NAME.to_string(),
            shaper_size: options.lut_resolution_1d,
            cube_size: options.lut_resolution_3d,
        };
        let jobs = bakeable_jobs(&config, plan_bake_jobs(&odts, &settings));
        let report = run_bake_jobs(collaborators.baker, &config_path, &jobs, options.policy)?;
        baked = report.baked;
        failures.extend(report.failures);
    } else {
        info!("secondary LUT baking disabled");
    }

    Ok(RunReport {
        config_path,
        nuke_config_path,
        colorspaces: config.colorspaces().len(),
        baked,
        failures,
    })
}

/// Runs with the default collaborators: the CTL tree on disk, the
/// configured renderer (or planned tables) and the configured baker.
pub fn run(options: &RunOptions) -> GenResult<RunReport> {
    let source = CtlDirectory::new(&options.ctl_dir);
    let renderer = options.renderer.as_ref().map(|program| {
        ExternalRenderer::new(program, &options.ctl_dir, lut_directory(&options.config_dir))
            .keep_temp_images(options.keep_temp_images)
    });
    let materializer: &dyn LutMaterializer = match &renderer {
        Some(r) => r,
        None => &PlannedMaterializer,
    };
    let baker = OcioBakeLut::new(&options.baker);

    create_aces_config(
        options,
        &Collaborators {
            source: &source,
            materializer,
            baker: &baker,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use aces_ocio::OUTPUT_TRANSFORM_VIEW;

    fn data() -> ConfigData {
        let mut out = VendorOutput {
            reference: Some(AcesGenerator::reference()),
            log_display_space: Some("ACEScc".into()),
            ..VendorOutput::default()
        };
        out.colorspaces.push(ColorSpace::builder("ACEScc").family("ACES").alias("acescc_ap1").build());
        out.colorspaces.push(ColorSpace::builder("Output - sRGB").family("Output").build());
        out.colorspaces.push(ColorSpace::builder("Raw").is_data(true).build());
        out.displays.push(DisplayEntry::new("sRGB", OUTPUT_TRANSFORM_VIEW, "Output - sRGB"));
        out.displays.push(DisplayEntry::new("sRGB", "Log", "ACEScc"));
        out.displays.push(DisplayEntry::new("sRGB", "Raw", "Raw"));

        let (data, failures) =
            ConfigData::merge(vec![("aces".into(), Ok(out))], FailurePolicy::Continue).unwrap();
        assert!(failures.is_empty());
        data
    }

    #[test]
    fn policy_settle() {
        let mut failures = Vec::new();
        let err = || -> GenResult<u32> {
            Err(GenError::Bake {
                target: "x".into(),
                reason: "y".into(),
            })
        };
        assert_eq!(FailurePolicy::Continue.settle("a", Ok(1), &mut failures).unwrap(), Some(1));
        assert_eq!(FailurePolicy::Continue.settle("b", err(), &mut failures).unwrap(), None);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].item, "b");
        assert!(FailurePolicy::FailFast.settle("c", err(), &mut failures).is_err());
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn merge_records_failed_generators() {
        let failed = GenError::Manifest {
            path: PathBuf::from("v.yaml"),
            reason: "bad".into(),
        };
        let outputs = vec![
            ("aces".to_string(), Ok(VendorOutput::default())),
            ("vendor".to_string(), Err(failed)),
        ];
        let (data, failures) = ConfigData::merge(outputs, FailurePolicy::Continue).unwrap();
        assert_eq!(data.reference.name(), "ACES2065-1");
        assert_eq!(data.log_display_space, "ACES2065-1");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].item, "vendor");
    }

    #[test]
    fn merge_drops_displays_without_a_space() {
        let outputs = || {
            let mut out = VendorOutput::default();
            out.colorspaces.push(ColorSpace::builder("ACEScc").alias("acescc_ap1").build());
            out.displays.push(DisplayEntry::new("ACES", "Log", "acescc_ap1"));
            out.displays.push(DisplayEntry::new("ACES", "Raw", "aces"));
            out.displays.push(DisplayEntry::new("Vendor", "Film", "Vendor - Film"));
            vec![("aces".to_string(), Ok(out))]
        };

        let (data, failures) = ConfigData::merge(outputs(), FailurePolicy::Continue).unwrap();
        let views: Vec<&str> = data.displays.iter().map(|d| d.view.as_str()).collect();
        assert_eq!(views, ["Log", "Raw"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].item, "Vendor/Film");
        assert!(build_configuration(&data, DisplayMode::Generic).is_ok());

        let err = ConfigData::merge(outputs(), FailurePolicy::FailFast).unwrap_err();
        assert!(matches!(
            err,
            GenError::Core(OcioError::UnknownColorSpace { name }) if name == "Vendor - Film"
        ));
    }

    #[test]
    fn generic_configuration() {
        let config = build_configuration(&data(), DisplayMode::Generic).unwrap();
        assert_eq!(config.reference_name(), "ACES2065-1");
        assert_eq!(config.description(), CONFIG_DESCRIPTION);
        assert_eq!(config.search_path(), "luts");
        for role in Role::ALL {
            assert_eq!(config.roles().get(role), Some("ACES2065-1"));
        }
        assert!(config.colorspace("aces").is_some());
        assert!(config.colorspace("acescc_ap1").is_some());
        assert_eq!(config.active_displays(), ["sRGB".to_string()]);
    }

    #[test]
    fn alternate_configuration() {
        let data = data();
        let config = build_configuration(&data, data.alternate_mode()).unwrap();
        assert_eq!(
            config.active_displays(),
            ["linear", "log", "sRGB"].map(String::from)
        );
        let srgb = config.displays().display("sRGB").unwrap();
        assert_eq!(srgb.views().len(), 1);
        assert_eq!(srgb.views()[0].colorspace(), "Output - sRGB");
    }

    fn job(input: &str, output: &str, shaper: &str) -> BakeJob {
        BakeJob {
            format: BakeFormat::Icc,
            input_space: input.into(),
            output_space: output.into(),
            shaper_space: shaper.into(),
            shaper_size: 64,
            cube_size: 17,
            description: String::new(),
            output: PathBuf::from(format!("baked/{output} for {input}.icc")),
        }
    }

    #[test]
    fn jobs_with_missing_spaces_are_not_baked() {
        let config = build_configuration(&data(), DisplayMode::Generic).unwrap();
        let jobs = vec![
            job("ACEScc", "Output - sRGB", "ACEScc"),
            job("ACESproxy", "Output - sRGB", "ACESproxy"),
            job("ACEScc", "Output - Rec.709", "ACEScc"),
            job("ACES2065-1", "Output - sRGB", SHAPER_NAME),
        ];

        let kept = bakeable_jobs(&config, jobs);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].input_space, "ACEScc");
        assert_eq!(kept[0].output_space, "Output - sRGB");
    }
}
