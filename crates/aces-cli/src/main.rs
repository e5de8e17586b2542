//! create-aces-config - generate ACES OCIO configs from the ACES CTL tree

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use aces_gen::{FailurePolicy, RunOptions};

mod logging;

const CTL_DIR_ENV: &str = "ACES_OCIO_CTL_DIRECTORY";
const CONFIG_DIR_ENV: &str = "ACES_OCIO_CONFIGURATION_DIRECTORY";

#[derive(Parser, Debug)]
#[command(name = "create-aces-config")]
#[command(author, version, about = "An OCIO config generation tool for ACES")]
#[command(long_about = "
Generates an OCIO configuration from the ACES CTL transforms.

Writes config.ocio and nuke_config.ocio into the config directory, the
lookup tables they reference into luts/, and, unless disabled, baked
interchange LUTs into baked/.

Examples:
  create-aces-config -a aces-dev/transforms/ctl -c aces_1.0.0
  create-aces-config -a ctl -c out --renderer ctl-lut-render --dont-bake-secondary-luts
  create-aces-config -a ctl -c out --manifest arri.yaml --manifest sony.yaml
")]
struct Cli {
    /// ACES CTL transforms directory
    #[arg(short = 'a', long, env = "ACES_OCIO_CTL_DIRECTORY")]
    aces_ctl_dir: Option<PathBuf>,

    /// Output configuration directory
    #[arg(short = 'c', long, env = "ACES_OCIO_CONFIGURATION_DIRECTORY")]
    config_dir: Option<PathBuf>,

    /// 1D LUT resolution
    #[arg(long = "lut-resolution-1d", default_value = "4096")]
    lut_resolution_1d: u32,

    /// 3D LUT resolution
    #[arg(long = "lut-resolution-3d", default_value = "64")]
    lut_resolution_3d: u32,

    /// Skip baking the secondary interchange LUTs
    #[arg(long)]
    dont_bake_secondary_luts: bool,

    /// Keep the renderer's intermediate images
    #[arg(long)]
    keep_temp_images: bool,

    /// Abort on the first failed color space or bake instead of skipping it
    #[arg(long)]
    fail_fast: bool,

    /// Vendor color-space manifest (repeatable)
    #[arg(long = "manifest", value_name = "FILE")]
    manifests: Vec<PathBuf>,

    /// LUT rendering program; tables are only planned when absent
    #[arg(long, value_name = "PROGRAM")]
    renderer: Option<PathBuf>,

    /// LUT baking program
    #[arg(long, value_name = "PROGRAM", default_value = "ociobakelut")]
    baker: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn run_options(&self) -> Result<RunOptions> {
        let Some(ctl_dir) = &self.aces_ctl_dir else {
            bail!("ACES CTL directory not set: pass --aces-ctl-dir or set {CTL_DIR_ENV}");
        };
        let Some(config_dir) = &self.config_dir else {
            bail!("config directory not set: pass --config-dir or set {CONFIG_DIR_ENV}");
        };
        if !ctl_dir.is_dir() {
            bail!("ACES CTL directory does not exist: {}", ctl_dir.display());
        }

        let mut options = RunOptions::new(ctl_dir, config_dir);
        options.lut_resolution_1d = self.lut_resolution_1d;
        options.lut_resolution_3d = self.lut_resolution_3d;
        options.bake_secondary_luts = !self.dont_bake_secondary_luts;
        options.keep_temp_images = self.keep_temp_images;
        options.policy = if self.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::Continue
        };
        options.manifests = self.manifests.clone();
        options.renderer = self.renderer.clone();
        options.baker = self.baker.clone();
        Ok(options)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(cli.verbose, cli.log_file.as_deref())?;

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let options = cli.run_options()?;
    info!(
        ctl_dir = %options.ctl_dir.display(),
        config_dir = %options.config_dir.display(),
        "creating ACES config"
    );

    let report = aces_gen::run(&options).with_context(|| {
        format!("Failed to create config in {}", options.config_dir.display())
    })?;

    for failure in &report.failures {
        warn!(item = %failure.item, error = %failure.error, "skipped");
    }

    println!("Wrote {}", report.config_path.display());
    println!("Wrote {}", report.nuke_config_path.display());
    println!("  {} color spaces", report.colorspaces);
    if options.bake_secondary_luts {
        println!("  {} baked LUTs", report.baked.len());
    }
    if !report.failures.is_empty() {
        println!("  {} items skipped (see log)", report.failures.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_to_options() {
        let dir = tempfile::tempdir().unwrap();
        let ctl = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "create-aces-config",
            "-a",
            ctl,
            "-c",
            "/tmp/out",
            "--lut-resolution-3d",
            "33",
            "--dont-bake-secondary-luts",
            "--fail-fast",
            "--manifest",
            "a.yaml",
            "--manifest",
            "b.yaml",
        ])
        .unwrap();

        let options = cli.run_options().unwrap();
        assert_eq!(options.lut_resolution_1d, 4096);
        assert_eq!(options.lut_resolution_3d, 33);
        assert!(!options.bake_secondary_luts);
        assert_eq!(options.policy, FailurePolicy::FailFast);
        assert_eq!(options.manifests.len(), 2);
        assert_eq!(options.baker, PathBuf::from("ociobakelut"));
        assert!(options.renderer.is_none());
    }

    #[test]
    fn missing_directories_name_flag_and_variable() {
        let cli = Cli {
            aces_ctl_dir: None,
            config_dir: Some(PathBuf::from("/tmp/out")),
            lut_resolution_1d: 4096,
            lut_resolution_3d: 64,
            dont_bake_secondary_luts: false,
            keep_temp_images: false,
            fail_fast: false,
            manifests: Vec::new(),
            renderer: None,
            baker: PathBuf::from("ociobakelut"),
            verbose: false,
            threads: 0,
            log_file: None,
        };
        let msg = cli.run_options().unwrap_err().to_string();
        assert!(msg.contains("--aces-ctl-dir"));
        assert!(msg.contains(CTL_DIR_ENV));

        let cli = Cli {
            aces_ctl_dir: Some(PathBuf::from("/tmp")),
            config_dir: None,
            ..cli
        };
        let msg = cli.run_options().unwrap_err().to_string();
        assert!(msg.contains("--config-dir"));
        assert!(msg.contains(CONFIG_DIR_ENV));
    }
}
