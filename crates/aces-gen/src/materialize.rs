//! LUT materialization.
//!
//! Color spaces built from CTL transforms reference sampled tables. A
//! [`LutMaterializer`] turns a [`LutRequest`] into a file in the LUT
//! directory and returns its path relative to that directory, which is
//! what ends up inside a `FileTransform`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::error::{GenError, GenResult};

/// Table shape and sample count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutDimension {
    /// 1D table with this many entries.
    OneD(u32),
    /// 3D cube with this edge length.
    ThreeD(u32),
}

impl LutDimension {
    /// Sample count.
    pub fn size(self) -> u32 {
        match self {
            Self::OneD(n) | Self::ThreeD(n) => n,
        }
    }

    /// Table file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::OneD(_) => "spi1d",
            Self::ThreeD(_) => "spi3d",
        }
    }
}

/// One table to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LutRequest {
    /// Transform the table samples, for reporting.
    pub transform_id: String,
    /// CTL files applied in order, relative to the CTL root.
    pub sources: Vec<PathBuf>,
    /// Table shape.
    pub dimension: LutDimension,
    /// Output file name inside the LUT directory.
    pub file_name: String,
    /// Render for legal (video) range output.
    pub legal_range: bool,
}

impl LutRequest {
    /// Creates a full-range request; the file name gets the dimension's
    /// extension appended.
    pub fn new(
        transform_id: impl Into<String>,
        sources: Vec<PathBuf>,
        dimension: LutDimension,
        stem: &str,
    ) -> Self {
        Self {
            transform_id: transform_id.into(),
            sources,
            dimension,
            file_name: format!("{}.{}", sanitize_file_name(stem), dimension.extension()),
            legal_range: false,
        }
    }

    /// Marks the request as legal range.
    pub fn legal(mut self) -> Self {
        self.legal_range = true;
        self
    }
}

/// Renders lookup tables.
pub trait LutMaterializer: Send + Sync {
    /// Produces the table and returns its path relative to the LUT directory.
    fn materialize(&self, request: &LutRequest) -> GenResult<PathBuf>;
}

/// Runs an external program once per table.
///
/// The program is invoked as
///
/// ```text
/// <program> --ctl-root <root> [--ctl <file>]... --dimension 1d|3d --size <n>
///           [--legal-range] [--keep-temp-images] --output <lut dir>/<file name>
/// ```
///
/// and must exit with status 0 after writing the output file.
#[derive(Debug, Clone)]
pub struct ExternalRenderer {
    program: PathBuf,
    ctl_root: PathBuf,
    lut_dir: PathBuf,
    keep_temp_images: bool,
}

impl ExternalRenderer {
    /// Creates a renderer writing into `lut_dir`.
    pub fn new(
        program: impl Into<PathBuf>,
        ctl_root: impl Into<PathBuf>,
        lut_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            ctl_root: ctl_root.into(),
            lut_dir: lut_dir.into(),
            keep_temp_images: false,
        }
    }

    /// Keeps the renderer's intermediate images.
    pub fn keep_temp_images(mut self, keep: bool) -> Self {
        self.keep_temp_images = keep;
        self
    }

    fn args(&self, request: &LutRequest, output: &Path) -> Vec<String> {
        let mut args = vec![
            "--ctl-root".to_string(),
            self.ctl_root.to_string_lossy().into_owned(),
        ];
        for src in &request.sources {
            args.push("--ctl".into());
            args.push(src.to_string_lossy().into_owned());
        }
        let dim = match request.dimension {
            LutDimension::OneD(_) => "1d",
            LutDimension::ThreeD(_) => "3d",
        };
        args.extend(["--dimension".into(), dim.into()]);
        args.extend(["--size".into(), request.dimension.size().to_string()]);
        if request.legal_range {
            args.push("--legal-range".into());
        }
        if self.keep_temp_images {
            args.push("--keep-temp-images".into());
        }
        args.extend(["--output".into(), output.to_string_lossy().into_owned()]);
        args
    }
}

impl LutMaterializer for ExternalRenderer {
    fn materialize(&self, request: &LutRequest) -> GenResult<PathBuf> {
        let output = self.lut_dir.join(&request.file_name);
        let args = self.args(request, &output);
        debug!(program = %self.program.display(), ?args, "rendering LUT");

        let failure = |reason: String| GenError::Materialization {
            transform_id: request.transform_id.clone(),
            reason,
        };

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| failure(format!("cannot run {}: {e}", self.program.display())))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(failure(format!("{}: {}", result.status, stderr.trim())));
        }
        if !output.is_file() {
            return Err(failure(format!("{} was not written", output.display())));
        }

        info!(lut = %request.file_name, id = %request.transform_id, "rendered LUT");
        Ok(PathBuf::from(&request.file_name))
    }
}

/// Plans table paths without rendering anything.
///
/// Used when no renderer is configured; the written config then references
/// tables that must be produced separately.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlannedMaterializer;

impl LutMaterializer for PlannedMaterializer {
    fn materialize(&self, request: &LutRequest) -> GenResult<PathBuf> {
        warn!(lut = %request.file_name, id = %request.transform_id, "no renderer, LUT not rendered");
        Ok(PathBuf::from(&request.file_name))
    }
}

/// Replaces characters that are awkward in file names with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_file_name() {
        let req = LutRequest::new(
            "ODT.Academy.Rec709_100nits_dim.a1.0.0",
            vec![PathBuf::from("odt/rec709/ODT.Academy.Rec709_100nits_dim.a1.0.0.ctl")],
            LutDimension::ThreeD(64),
            "Rec.709 (D60 sim)",
        );
        assert_eq!(req.file_name, "Rec.709__D60_sim_.spi3d");
        assert!(!req.legal_range);
        assert!(req.legal().legal_range);
    }

    #[test]
    fn renderer_arguments() {
        let r = ExternalRenderer::new("render", "/ctl", "/out/luts").keep_temp_images(true);
        let req = LutRequest::new("id", vec![PathBuf::from("a.ctl"), PathBuf::from("b.ctl")], LutDimension::OneD(4096), "shaper")
            .legal();
        let args = r.args(&req, Path::new("/out/luts/shaper.spi1d"));
        assert_eq!(
            args,
            vec![
                "--ctl-root", "/ctl", "--ctl", "a.ctl", "--ctl", "b.ctl", "--dimension", "1d",
                "--size", "4096", "--legal-range", "--keep-temp-images", "--output",
                "/out/luts/shaper.spi1d",
            ]
        );
    }

    #[test]
    fn missing_program_is_materialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let r = ExternalRenderer::new("/nonexistent/renderer", dir.path(), dir.path());
        let req = LutRequest::new("id", Vec::new(), LutDimension::OneD(16), "x");
        assert!(matches!(
            r.materialize(&req),
            Err(GenError::Materialization { transform_id, .. }) if transform_id == "id"
        ));
    }

    #[test]
    fn planned_returns_relative_name() {
        let req = LutRequest::new("id", Vec::new(), LutDimension::ThreeD(33), "look");
        assert_eq!(PlannedMaterializer.materialize(&req).unwrap(), PathBuf::from("look.spi3d"));
    }
}
