//! Discovery of CTL transform definitions.
//!
//! An ACES CTL tree keeps output transforms under `odt/` and look
//! transforms under `lmt/`, possibly nested:
//!
//! ```text
//! <root>/odt/rec709/ODT.Academy.Rec709_100nits_dim.a1.0.0.ctl
//! <root>/odt/rec709/InvODT.Academy.Rec709_100nits_dim.a1.0.0.ctl
//! <root>/lmt/LMT.Academy.BlueLightArtifactFix.a1.0.0.ctl
//! ```
//!
//! Each forward file yields one [`TransformRecord`] keyed by its dotted
//! name (the file name minus the first and last dot segments). A missing
//! kind directory yields an empty catalog; files without the header tags
//! are reported back in [`Discovered::rejected`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, trace, warn};

use crate::error::{GenError, GenResult};

/// Which family of transforms to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// Output device transforms.
    Odt,
    /// Look modification transforms.
    Lmt,
}

impl TransformKind {
    /// Sub-directory under the CTL root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Odt => "odt",
            Self::Lmt => "lmt",
        }
    }

    /// File-name prefix of inverse transforms.
    pub fn inverse_prefix(self) -> &'static str {
        match self {
            Self::Odt => "InvODT",
            Self::Lmt => "InvLMT",
        }
    }
}

/// One discovered transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRecord {
    /// Forward CTL, relative to the CTL root.
    pub forward_path: PathBuf,
    /// Inverse CTL, relative to the CTL root.
    pub inverse_path: Option<PathBuf>,
    /// Value of the `ACEStransformID` header tag.
    pub transform_id: String,
    /// User-facing name (`sRGB`, `Rec.709`, ...).
    pub display_name: String,
    /// Name prefix (`ACES 1.0 Output`, ...).
    pub display_name_prefix: String,
}

/// Dotted name → record, sorted by name.
pub type TransformCatalog = BTreeMap<String, TransformRecord>;

/// Outcome of one discovery pass.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Transforms that were read successfully.
    pub catalog: TransformCatalog,
    /// Files that could not be turned into a record, relative to the root.
    pub rejected: Vec<(PathBuf, GenError)>,
}

/// Source of transform records.
pub trait DescriptorSource: Send + Sync {
    /// Returns every transform of `kind`.
    ///
    /// A bad file lands in [`Discovered::rejected`]; an error means the
    /// whole kind could not be scanned.
    fn discover(&self, kind: TransformKind) -> GenResult<Discovered>;
}

/// Reads the ACES header tags out of CTL text.
#[derive(Debug, Clone)]
pub struct HeaderParser {
    transform_id: Regex,
    user_name: Regex,
}

impl HeaderParser {
    /// Compiles the tag patterns.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            transform_id: Regex::new(r"<ACEStransformID>\s*(.*?)\s*</ACEStransformID>")?,
            user_name: Regex::new(r"<ACESuserName>\s*(.*?)\s*</ACESuserName>")?,
        })
    }

    /// Extracts `(transform id, user name prefix, user name)`.
    ///
    /// The user name splits at its first `-`; without one the whole value
    /// is the name and the prefix is empty.
    pub fn parse(&self, text: &str) -> Option<(String, String, String)> {
        let id = self.transform_id.captures(text)?.get(1)?.as_str().to_string();
        let user = self.user_name.captures(text)?.get(1)?.as_str();
        let (prefix, name) = match user.split_once('-') {
            Some((p, n)) => (p.trim(), n.trim()),
            None => ("", user.trim()),
        };
        Some((id, prefix.to_string(), name.to_string()))
    }
}

/// A CTL directory tree on disk.
#[derive(Debug, Clone)]
pub struct CtlDirectory {
    root: PathBuf,
}

impl CtlDirectory {
    /// Wraps a CTL root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn error(&self, reason: impl Into<String>) -> GenError {
        GenError::Discovery {
            root: self.root.clone(),
            reason: reason.into(),
        }
    }

    fn record(
        &self,
        parser: &HeaderParser,
        kind: TransformKind,
        path: &Path,
        name: &str,
    ) -> GenResult<TransformRecord> {
        let text = fs::read_to_string(path)
            .map_err(|e| self.error(format!("{}: {e}", path.display())))?;
        let (transform_id, display_name_prefix, display_name) = parser
            .parse(&text)
            .ok_or_else(|| self.error(format!("{}: missing ACES header tags", path.display())))?;

        let inverse = path.with_file_name(format!("{}.{}.ctl", kind.inverse_prefix(), name));
        let inverse_path = inverse.is_file().then(|| self.relative(&inverse));

        Ok(TransformRecord {
            forward_path: self.relative(path),
            inverse_path,
            transform_id,
            display_name,
            display_name_prefix,
        })
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }
}

impl DescriptorSource for CtlDirectory {
    fn discover(&self, kind: TransformKind) -> GenResult<Discovered> {
        let dir = self.root.join(kind.dir_name());
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "no transform directory, nothing discovered");
            return Ok(Discovered::default());
        }

        let pattern = format!("{}/**/*", glob::Pattern::escape(&dir.to_string_lossy()));
        let entries = glob::glob(&pattern).map_err(|e| self.error(e.to_string()))?;
        let parser = HeaderParser::new().map_err(|e| self.error(e.to_string()))?;

        let mut found = Discovered::default();
        for entry in entries {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if is_skipped(kind, file_name) {
                trace!(file = file_name, "skipped");
                continue;
            }
            let Some(name) = dotted_name(file_name) else {
                debug!(file = file_name, "no dotted name, skipped");
                continue;
            };

            let record = match self.record(&parser, kind, &path, &name) {
                Ok(record) => record,
                Err(e) => {
                    debug!(file = %path.display(), error = %e, "rejected");
                    found.rejected.push((self.relative(&path), e));
                    continue;
                }
            };
            debug!(
                kind = kind.dir_name(),
                name = %name,
                id = %record.transform_id,
                user_name = %record.display_name,
                inverse = record.inverse_path.is_some(),
                "discovered transform"
            );
            found.catalog.insert(name, record);
        }
        Ok(found)
    }
}

fn is_skipped(kind: TransformKind, file_name: &str) -> bool {
    file_name.starts_with('.')
        || file_name.contains("README")
        || file_name.starts_with(kind.inverse_prefix())
}

/// `ODT.Academy.Rec709_100nits_dim.a1.0.0.ctl` → `Academy.Rec709_100nits_dim.a1.0.0`.
pub fn dotted_name(file_name: &str) -> Option<String> {
    let segments: Vec<&str> = file_name.split('.').collect();
    if segments.len() < 3 {
        return None;
    }
    Some(segments[1..segments.len() - 1].join("."))
}
