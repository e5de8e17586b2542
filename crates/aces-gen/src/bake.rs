//! Secondary LUT baking.
//!
//! After `config.ocio` is written, every output transform is baked into
//! the interchange formats of common applications by an external baker
//! reading that config.
//!
//! ```text
//! baked/photoshop/<odt> for ACEScc.icc
//! baked/flame/<odt> for ACEScc Flame.3dl
//! baked/lustre/<odt> for ACESproxy Lustre.3dl
//! baked/maya/<odt> for ACEScg Maya.csp
//! baked/houdini/<odt> for ACES2065-1 Houdini.lut
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::discovery::TransformCatalog;
use crate::error::{GenError, GenResult};
use crate::generator::output_space_name;
use crate::pipeline::{FailurePolicy, ItemFailure};

/// Output transforms that are baked twice, once per signal range.
pub const RANGE_SPLIT_TRANSFORMS: [&str; 3] = [
    "Academy.Rec2020_100nits_dim.a1.0.0",
    "Academy.Rec709_100nits_dim.a1.0.0",
    "Academy.Rec709_D60sim_100nits_dim.a1.0.0",
];

/// User names an output transform is generated under, with the legal
/// range flag: `X - Legal` and `X - Full` for the range-split transforms,
/// `X` otherwise.
pub fn range_variants(dotted_name: &str, user_name: &str) -> Vec<(String, bool)> {
    if RANGE_SPLIT_TRANSFORMS.contains(&dotted_name) {
        vec![
            (format!("{user_name} - Legal"), true),
            (format!("{user_name} - Full"), false),
        ]
    } else {
        vec![(user_name.to_string(), false)]
    }
}

/// Interchange format written by the baker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BakeFormat {
    /// ICC profile for Photoshop.
    Icc,
    /// Autodesk Flame 3dl.
    Flame,
    /// Autodesk Lustre 3dl.
    Lustre,
    /// Cinespace, read by Maya.
    Cinespace,
    /// Houdini LUT.
    Houdini,
}

impl BakeFormat {
    /// All formats, in baking order.
    pub const ALL: [BakeFormat; 5] = [
        Self::Icc,
        Self::Flame,
        Self::Lustre,
        Self::Cinespace,
        Self::Houdini,
    ];

    /// Format name passed to the baker.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Icc => "icc",
            Self::Flame => "flame",
            Self::Lustre => "lustre",
            Self::Cinespace => "cinespace",
            Self::Houdini => "houdini",
        }
    }

    /// File extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Icc => "icc",
            Self::Flame | Self::Lustre => "3dl",
            Self::Cinespace => "csp",
            Self::Houdini => "lut",
        }
    }

    /// Sub-directory under `baked/`.
    pub fn subdir(self) -> &'static str {
        match self {
            Self::Icc => "photoshop",
            Self::Flame => "flame",
            Self::Lustre => "lustre",
            Self::Cinespace => "maya",
            Self::Houdini => "houdini",
        }
    }

    fn file_suffix(self) -> &'static str {
        match self {
            Self::Icc => "",
            Self::Flame => " Flame",
            Self::Lustre => " Lustre",
            Self::Cinespace => " Maya",
            Self::Houdini => " Houdini",
        }
    }

    /// Input spaces this format is baked for.
    pub fn input_spaces(self) -> [&'static str; 2] {
        match self {
            Self::Icc | Self::Flame | Self::Lustre => ["ACEScc", "ACESproxy"],
            Self::Cinespace | Self::Houdini => ["ACEScg", "ACES2065-1"],
        }
    }

    /// `<odt> for <input><suffix>.<ext>`
    pub fn file_name(self, odt_name: &str, input_space: &str) -> String {
        format!(
            "{odt_name} for {input_space}{}.{}",
            self.file_suffix(),
            self.extension()
        )
    }
}

/// One baker invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BakeJob {
    /// Output format.
    pub format: BakeFormat,
    /// Color space the LUT takes as input.
    pub input_space: String,
    /// Output color space in the config.
    pub output_space: String,
    /// Shaper color space.
    pub shaper_space: String,
    /// Shaper table size.
    pub shaper_size: u32,
    /// Cube edge length.
    pub cube_size: u32,
    /// Description embedded in the file.
    pub description: String,
    /// Target file.
    pub output: PathBuf,
}

/// Inputs shared by every job.
#[derive(Debug, Clone)]
pub struct BakeSettings {
    /// The config the baker reads.
    pub config_path: PathBuf,
    /// `baked/` directory.
    pub baked_dir: PathBuf,
    /// Shaper space name; ACEScg jobs use its `- AP1` variant.
    pub shaper_name: String,
    /// Shaper table size.
    pub shaper_size: u32,
    /// Cube edge length.
    pub cube_size: u32,
}

/// Expands the output transforms into the full list of bake jobs.
pub fn plan_bake_jobs(odts: &TransformCatalog, settings: &BakeSettings) -> Vec<BakeJob> {
    let mut jobs = Vec::new();
    for (name, record) in odts {
        for (user_name, _) in range_variants(name, &record.display_name) {
            for format in BakeFormat::ALL {
                for input in format.input_spaces() {
                    let shaper_space = if input == "ACEScg" {
                        format!("{} - AP1", settings.shaper_name)
                    } else {
                        settings.shaper_name.clone()
                    };
                    jobs.push(BakeJob {
                        format,
                        input_space: input.to_string(),
                        output_space: output_space_name(&user_name),
                        shaper_space,
                        shaper_size: settings.shaper_size,
                        cube_size: settings.cube_size,
                        description: format!(
                            "{} - {} for {} data",
                            record.display_name_prefix, user_name, input
                        ),
                        output: settings
                            .baked_dir
                            .join(format.subdir())
                            .join(format.file_name(&user_name, input)),
                    });
                }
            }
        }
    }
    debug!(jobs = jobs.len(), "planned bake jobs");
    jobs
}

/// Bakes one job.
pub trait Baker: Send + Sync {
    /// Writes `job.output` from the config at `config`.
    fn bake(&self, config: &Path, job: &BakeJob) -> GenResult<()>;
}

/// Bakes with the `ociobakelut` command line tool.
#[derive(Debug, Clone)]
pub struct OcioBakeLut {
    program: PathBuf,
}

impl OcioBakeLut {
    /// Uses `program` as the baker executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(config: &Path, job: &BakeJob) -> Vec<String> {
        vec![
            "--iconfig".into(),
            config.to_string_lossy().into_owned(),
            "-v".into(),
            "--inputspace".into(),
            job.input_space.clone(),
            "--outputspace".into(),
            job.output_space.clone(),
            "--description".into(),
            job.description.clone(),
            "--shaperspace".into(),
            job.shaper_space.clone(),
            "--shapersize".into(),
            job.shaper_size.to_string(),
            "--cubesize".into(),
            job.cube_size.to_string(),
            "--format".into(),
            job.format.tag().into(),
            job.output.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for OcioBakeLut {
    fn default() -> Self {
        Self::new("ociobakelut")
    }
}

impl Baker for OcioBakeLut {
    fn bake(&self, config: &Path, job: &BakeJob) -> GenResult<()> {
        let failure = |reason: String| GenError::Bake {
            target: job.output.display().to_string(),
            reason,
        };
        let output = Command::new(&self.program)
            .args(Self::args(config, job))
            .output()
            .map_err(|e| failure(format!("cannot run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure(format!("{}: {}", output.status, stderr.trim())));
        }
        Ok(())
    }
}

/// Outcome of a bake run.
#[derive(Debug, Default)]
pub struct BakeReport {
    /// Files written.
    pub baked: Vec<PathBuf>,
    /// Jobs that failed.
    pub failures: Vec<ItemFailure>,
}

/// Runs every job in parallel.
///
/// Under [`FailurePolicy::FailFast`] the first failure is returned as the
/// error; under [`FailurePolicy::Continue`] failures are collected in the
/// report.
pub fn run_bake_jobs(
    baker: &dyn Baker,
    config: &Path,
    jobs: &[BakeJob],
    policy: FailurePolicy,
) -> GenResult<BakeReport> {
    info!(jobs = jobs.len(), "baking secondary LUTs");

    if policy == FailurePolicy::FailFast {
        let baked = jobs
            .par_iter()
            .map(|job| baker.bake(config, job).map(|()| job.output.clone()))
            .collect::<GenResult<Vec<_>>>()?;
        return Ok(BakeReport {
            baked,
            failures: Vec::new(),
        });
    }

    let results: Vec<(&BakeJob, GenResult<()>)> = jobs
        .par_iter()
        .map(|job| (job, baker.bake(config, job)))
        .collect();

    let mut report = BakeReport::default();
    for (job, result) in results {
        match result {
            Ok(()) => report.baked.push(job.output.clone()),
            Err(e) => {
                warn!(target = %job.output.display(), error = %e, "bake failed");
                report.failures.push(ItemFailure::new(job.output.display().to_string(), e));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::TransformRecord;
    use std::sync::Mutex;

    fn record(name: &str) -> TransformRecord {
        TransformRecord {
            forward_path: PathBuf::from(format!("odt/ODT.{name}.ctl")),
            inverse_path: None,
            transform_id: format!("ODT.{name}"),
            display_name: name.split('.').nth(1).unwrap_or(name).to_string(),
            display_name_prefix: "ACES 1.0 Output".into(),
        }
    }

    fn settings() -> BakeSettings {
        BakeSettings {
            config_path: PathBuf::from("/cfg/config.ocio"),
            baked_dir: PathBuf::from("/cfg/baked"),
            shaper_name: "Output Shaper".into(),
            shaper_size: 4096,
            cube_size: 64,
        }
    }

    #[test]
    fn format_file_names() {
        assert_eq!(BakeFormat::Icc.file_name("sRGB", "ACEScc"), "sRGB for ACEScc.icc");
        assert_eq!(
            BakeFormat::Cinespace.file_name("sRGB", "ACEScg"),
            "sRGB for ACEScg Maya.csp"
        );
        assert_eq!(
            BakeFormat::Lustre.file_name("P3-D60", "ACESproxy"),
            "P3-D60 for ACESproxy Lustre.3dl"
        );
    }

    #[test]
    fn plain_transform_gets_ten_jobs() {
        let mut odts = TransformCatalog::new();
        odts.insert("Academy.sRGB.a1.0.0".into(), record("Academy.sRGB.a1.0.0"));
        let jobs = plan_bake_jobs(&odts, &settings());
        assert_eq!(jobs.len(), 10);

        let maya_cg = jobs
            .iter()
            .find(|j| j.format == BakeFormat::Cinespace && j.input_space == "ACEScg")
            .unwrap();
        assert_eq!(maya_cg.shaper_space, "Output Shaper - AP1");
        assert_eq!(maya_cg.output_space, "Output - sRGB");
        assert_eq!(
            maya_cg.output,
            PathBuf::from("/cfg/baked/maya/sRGB for ACEScg Maya.csp")
        );
        assert_eq!(maya_cg.description, "ACES 1.0 Output - sRGB for ACEScg data");

        let icc = jobs.iter().find(|j| j.format == BakeFormat::Icc).unwrap();
        assert_eq!(icc.shaper_space, "Output Shaper");
    }

    #[test]
    fn range_split_transforms() {
        let mut odts = TransformCatalog::new();
        let name = "Academy.Rec709_100nits_dim.a1.0.0";
        let mut rec = record(name);
        rec.display_name = "Rec.709".into();
        odts.insert(name.into(), rec);

        let jobs = plan_bake_jobs(&odts, &settings());
        assert_eq!(jobs.len(), 20);
        assert!(jobs.iter().any(|j| j.output_space == "Output - Rec.709 - Legal"));
        assert!(jobs.iter().any(|j| j.output_space == "Output - Rec.709 - Full"));
        assert!(!jobs.iter().any(|j| j.output_space == "Output - Rec.709"));
    }

    #[test]
    fn baker_arguments() {
        let job = BakeJob {
            format: BakeFormat::Flame,
            input_space: "ACEScc".into(),
            output_space: "Output - sRGB".into(),
            shaper_space: "Output Shaper".into(),
            shaper_size: 1024,
            cube_size: 33,
            description: "d".into(),
            output: PathBuf::from("out.3dl"),
        };
        let args = OcioBakeLut::args(Path::new("config.ocio"), &job);
        assert_eq!(&args[..3], ["--iconfig", "config.ocio", "-v"]);
        assert_eq!(&args[args.len() - 3..], ["--format", "flame", "out.3dl"]);
    }

    struct FlakyBaker {
        seen: Mutex<Vec<PathBuf>>,
    }

    impl Baker for FlakyBaker {
        fn bake(&self, _config: &Path, job: &BakeJob) -> GenResult<()> {
            self.seen.lock().unwrap().push(job.output.clone());
            if job.format == BakeFormat::Houdini {
                return Err(GenError::Bake {
                    target: job.output.display().to_string(),
                    reason: "unsupported".into(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn continue_collects_failures() {
        let mut odts = TransformCatalog::new();
        odts.insert("Academy.sRGB.a1.0.0".into(), record("Academy.sRGB.a1.0.0"));
        let jobs = plan_bake_jobs(&odts, &settings());
        let baker = FlakyBaker {
            seen: Mutex::new(Vec::new()),
        };

        let report =
            run_bake_jobs(&baker, Path::new("config.ocio"), &jobs, FailurePolicy::Continue).unwrap();
        assert_eq!(baker.seen.lock().unwrap().len(), 10);
        assert_eq!(report.baked.len(), 8);
        assert_eq!(report.failures.len(), 2);

        let err = run_bake_jobs(&baker, Path::new("config.ocio"), &jobs, FailurePolicy::FailFast)
            .unwrap_err();
        assert!(matches!(err, GenError::Bake { .. }));
    }
}
