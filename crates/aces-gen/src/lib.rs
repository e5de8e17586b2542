//! ACES config generation.
//!
//! Drives [`aces_ocio`] from an ACES CTL tree:
//! - Discover output and look transforms
//! - Render the lookup tables their color spaces reference
//! - Generate the ACES family plus vendor spaces from manifests
//! - Write the generic and alternate-consumer configs
//! - Bake interchange LUTs for common applications
//!
//! # Example
//!
//! ```ignore
//! use aces_gen::{RunOptions, run};
//!
//! let mut options = RunOptions::new("/aces/transforms/ctl", "/out/config");
//! options.bake_secondary_luts = false;
//! let report = run(&options)?;
//! println!("{} color spaces", report.colorspaces);
//! ```
//!
//! Every external step sits behind a trait ([`DescriptorSource`],
//! [`LutMaterializer`], [`Baker`], [`ColorSpaceGenerator`]), so runs can be
//! driven by in-memory collaborators through [`create_aces_config`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bake;
pub mod discovery;
pub mod generator;
pub mod materialize;
mod error;
mod pipeline;

pub use bake::{BakeFormat, BakeJob, BakeReport, BakeSettings, Baker, OcioBakeLut};
pub use discovery::{
    CtlDirectory, DescriptorSource, Discovered, TransformCatalog, TransformKind, TransformRecord,
};
pub use error::{GenError, GenResult};
pub use generator::{
    AcesGenerator, ColorSpaceGenerator, DisplayEntry, GenContext, ManifestGenerator,
    VendorOutput,
};
pub use materialize::{
    ExternalRenderer, LutDimension, LutMaterializer, LutRequest, PlannedMaterializer,
};
pub use pipeline::{
    CONFIG_FILE, Collaborators, ConfigData, FailurePolicy, ItemFailure, NUKE_CONFIG_FILE,
    RunOptions, RunReport, build_configuration, create_aces_config, lut_directory, run,
};
