//! ACES color-management configuration assembly.
//!
//! This crate builds OCIO v1 configuration documents:
//! - Describe color spaces and their transform chains to the reference
//! - Expand alias names into forwarding color spaces
//! - Wire displays, views and roles
//! - Validate consistency and render the persisted document
//!
//! # Quick Start
//!
//! ```
//! use aces_ocio::{ColorSpace, ConfigurationBuilder, Engine, Role, Serializer};
//! use aces_ocio::{TransformDescriptor, TransformDirection};
//!
//! let mut builder = ConfigurationBuilder::new(ColorSpace::new("ACES2065-1"))
//!     .search_path("luts");
//!
//! builder.register(
//!     ColorSpace::builder("ACEScc")
//!         .family("ACES")
//!         .to_reference(TransformDescriptor::log(2.0, TransformDirection::Inverse))
//!         .build(),
//! )?;
//! builder.set_display_view("ACES", "Log", "ACEScc")?;
//! builder.set_role(Role::CompositingLog, "ACEScc")?;
//!
//! let config = builder.finalize()?;
//!
//! let engine = Engine::new();
//! let text = Serializer::new(&engine).render(&config)?;
//! assert!(text.contains("ACEScc"));
//! # Ok::<(), aces_ocio::OcioError>(())
//! ```
//!
//! # Reading Configs Back
//!
//! ```ignore
//! use aces_ocio::Configuration;
//!
//! let config = Configuration::from_file("config.ocio")?;
//! println!("reference: {}", config.reference_name());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod alias;
mod colorspace;
mod config;
mod config_builder;
mod display;
mod document;
mod error;
mod role;
mod serialize;
mod transform;

pub mod validate;

// Re-exports
pub use alias::{ALIAS_FAMILY, bind_aliases};
pub use colorspace::{Allocation, AllocationType, BitDepth, ColorSpace, ColorSpaceBuilder};
pub use config::Configuration;
pub use config_builder::{BuilderState, ConfigurationBuilder};
pub use display::{
    ALTERNATE_VIEW, Display, DisplayMode, DisplayViewTable, LINEAR_DISPLAY, LOG_DISPLAY,
    OUTPUT_TRANSFORM_VIEW, View,
};
pub use error::{OcioError, OcioResult, ValidationError, ValidationStep};
pub use role::{Role, RoleTable};
pub use serialize::{Engine, Serializer};
pub use transform::{
    ColorSpaceTransform, ComposedTransform, ExponentTransform, FileTransform, GroupTransform,
    Interpolation, LogTransform, MatrixCoefficients, MatrixTransform, RawStep,
    TransformDescriptor, TransformDirection, compose, compose_raw,
};
pub use validate::{Issue, IssueCategory, Severity};
