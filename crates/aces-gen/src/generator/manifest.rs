//! Vendor color spaces loaded from YAML manifests.
//!
//! ```yaml
//! vendor: ARRI
//! colorspaces:
//!   - name: Input - ARRI - V3 LogC (EI800) - Alexa Wide Gamut
//!     family: Input/ARRI
//!     aliases: [logc3ei800_alexawide]
//!     to_reference:
//!       - {type: lutFile, path: logc800.spi1d, interpolation: linear}
//!       - {type: matrix, matrix: [0.68, 0.24, 0.08, 0.09, 1.07, -0.16, 0.0, -0.06, 1.06]}
//! displays:
//!   - {display: Alexa, view: Log, colorspace: Input - ARRI - V3 LogC (EI800) - Alexa Wide Gamut}
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use aces_ocio::{Allocation, AllocationType, BitDepth, ColorSpace, RawStep, compose_raw};

use super::{ColorSpaceGenerator, DisplayEntry, GenContext, VendorOutput};
use crate::error::{GenError, GenResult};

/// Parsed manifest file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorManifest {
    /// Vendor name, for logs.
    #[serde(default)]
    pub vendor: String,
    /// Color space records.
    #[serde(default)]
    pub colorspaces: Vec<ManifestColorSpace>,
    /// Display bindings.
    #[serde(default)]
    pub displays: Vec<DisplayEntry>,
}

/// One color space record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestColorSpace {
    /// Unique name.
    pub name: String,
    /// Family.
    #[serde(default)]
    pub family: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Bit depth keyword, `32f` when absent.
    pub bit_depth: Option<String>,
    /// Data flag.
    #[serde(default)]
    pub is_data: bool,
    /// `uniform` or `lg2`.
    pub allocation: Option<String>,
    /// Allocation variables.
    pub allocation_vars: Option<Vec<f64>>,
    /// Alias names.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Steps to the reference.
    #[serde(default)]
    pub to_reference: Vec<RawStep>,
    /// Steps from the reference.
    #[serde(default)]
    pub from_reference: Vec<RawStep>,
}

impl VendorManifest {
    /// Parses manifest YAML.
    pub fn from_yaml_str(text: &str) -> GenResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Reads one manifest file.
#[derive(Debug, Clone)]
pub struct ManifestGenerator {
    path: PathBuf,
    name: String,
}

impl ManifestGenerator {
    /// Creates a generator for the manifest at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "manifest".into());
        Self { path, name }
    }

    /// Manifest path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, reason: impl Into<String>) -> GenError {
        GenError::Manifest {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn load(&self) -> GenResult<VendorManifest> {
        let text = fs::read_to_string(&self.path).map_err(|e| self.error(e.to_string()))?;
        VendorManifest::from_yaml_str(&text).map_err(|e| self.error(e.to_string()))
    }

    fn colorspace(&self, record: ManifestColorSpace) -> GenResult<ColorSpace> {
        let context = |e: aces_ocio::OcioError| self.error(format!("{}: {e}", record.name));

        let bit_depth = match record.bit_depth.as_deref() {
            None => BitDepth::default(),
            Some(s) => BitDepth::parse(s)
                .ok_or_else(|| self.error(format!("{}: unknown bit depth '{s}'", record.name)))?,
        };
        let mut allocation = Allocation::default();
        if let Some(s) = record.allocation.as_deref() {
            allocation.alloc_type = AllocationType::parse(s)
                .ok_or_else(|| self.error(format!("{}: unknown allocation '{s}'", record.name)))?;
        }
        if let Some(vars) = &record.allocation_vars {
            allocation.vars = vars.clone();
        }

        let to_reference = compose_raw(record.to_reference).map_err(context)?;
        let from_reference = compose_raw(record.from_reference).map_err(context)?;

        let mut builder = ColorSpace::builder(&record.name)
            .family(&record.family)
            .description(&record.description)
            .bit_depth(bit_depth)
            .is_data(record.is_data)
            .allocation(allocation)
            .aliases(record.aliases);
        if !to_reference.is_empty() {
            builder = builder.to_reference(to_reference);
        }
        if !from_reference.is_empty() {
            builder = builder.from_reference(from_reference);
        }
        Ok(builder.build())
    }
}

impl ColorSpaceGenerator for ManifestGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, ctx: &GenContext<'_>) -> GenResult<VendorOutput> {
        let manifest = self.load()?;
        debug!(path = %self.path.display(), vendor = %manifest.vendor, "loaded manifest");

        let mut out = VendorOutput::default();
        let mut skipped: HashSet<String> = HashSet::new();
        for record in manifest.colorspaces {
            let item = record.name.clone();
            let names: Vec<String> = std::iter::once(item.clone())
                .chain(record.aliases.iter().cloned())
                .collect();
            match ctx.policy.settle(&item, self.colorspace(record), &mut out.failures)? {
                Some(cs) => out.colorspaces.push(cs),
                None => skipped.extend(names),
            }
        }

        for entry in manifest.displays {
            if !skipped.contains(&entry.colorspace) {
                out.displays.push(entry);
                continue;
            }
            let item = format!("{}/{}", entry.display, entry.view);
            let err = self.error(format!("{item}: color space '{}' was skipped", entry.colorspace));
            ctx.policy.settle::<()>(&item, Err(err), &mut out.failures)?;
        }

        info!(
            vendor = %manifest.vendor,
            colorspaces = out.colorspaces.len(),
            "loaded vendor color spaces"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::PlannedMaterializer;
    use crate::pipeline::FailurePolicy;

    const MANIFEST: &str = r#"
vendor: ARRI
colorspaces:
  - name: Input - ARRI - LogC
    family: Input/ARRI
    aliases: [logc3_alexawide]
    allocation: lg2
    allocation_vars: [-8, 5]
    to_reference:
      - {type: lutFile, path: logc.spi1d, interpolation: linear, direction: forward}
      - {type: matrix, matrix: [1, 0, 0, 0, 1, 0, 0, 0, 1]}
  - name: Broken
    to_reference:
      - {type: cdl}
displays:
  - {display: Alexa, view: Log, colorspace: Input - ARRI - LogC}
"#;

    fn write_manifest(dir: &Path) -> PathBuf {
        let path = dir.join("arri.yaml");
        fs::write(&path, MANIFEST).unwrap();
        path
    }

    fn ctx(policy: FailurePolicy) -> GenContext<'static> {
        GenContext {
            materializer: &PlannedMaterializer,
            lut_resolution_1d: 4096,
            lut_resolution_3d: 64,
            policy,
        }
    }

    #[test]
    fn loads_colorspaces_and_displays() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ManifestGenerator::new(write_manifest(dir.path()));
        assert_eq!(generator.name(), "arri");

        let out = generator.generate(&ctx(FailurePolicy::Continue)).unwrap();
        assert_eq!(out.colorspaces.len(), 1);
        let logc = &out.colorspaces[0];
        assert_eq!(logc.family(), "Input/ARRI");
        assert_eq!(logc.allocation().alloc_type, AllocationType::Lg2);
        assert_eq!(logc.to_reference().map(|t| t.len()), Some(2));
        assert!(logc.from_reference().is_none());
        assert_eq!(out.displays, [DisplayEntry::new("Alexa", "Log", "Input - ARRI - LogC")]);

        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].item, "Broken");
    }

    #[test]
    fn displays_of_skipped_records_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vendor.yaml");
        fs::write(
            &path,
            r#"
vendor: Test
colorspaces:
  - name: Good
    to_reference:
      - {type: colorspace, src: Good, dst: ACEScg}
  - name: Broken
    aliases: [broken_alias]
    to_reference:
      - {type: cdl}
displays:
  - {display: D, view: Good, colorspace: Good}
  - {display: D, view: Broken, colorspace: Broken}
  - {display: D, view: Alias, colorspace: broken_alias}
  - {display: D, view: Log, colorspace: ACEScc}
"#,
        )
        .unwrap();
        let generator = ManifestGenerator::new(&path);

        let out = generator.generate(&ctx(FailurePolicy::Continue)).unwrap();
        assert_eq!(
            out.displays,
            [
                DisplayEntry::new("D", "Good", "Good"),
                DisplayEntry::new("D", "Log", "ACEScc"),
            ]
        );
        let items: Vec<&str> = out.failures.iter().map(|f| f.item.as_str()).collect();
        assert_eq!(items, ["Broken", "D/Broken", "D/Alias"]);
    }

    #[test]
    fn invalid_step_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ManifestGenerator::new(write_manifest(dir.path()));
        let err = generator.generate(&ctx(FailurePolicy::FailFast)).unwrap_err();
        match err {
            GenError::Manifest { reason, .. } => assert!(reason.starts_with("Broken:")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreadable_manifest() {
        let generator = ManifestGenerator::new("/nonexistent/vendor.yaml");
        assert!(matches!(
            generator.generate(&ctx(FailurePolicy::Continue)),
            Err(GenError::Manifest { .. })
        ));
    }
}
