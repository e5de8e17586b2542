//! Rendering a configuration to its persisted text form.
//!
//! Output is deterministic: color spaces sorted by name, roles in the fixed
//! role order, displays sorted by name with views in insertion order.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::Configuration;
use crate::document::{ActiveList, ColorSpaceEntry, ConfigDocument, ViewEntry};
use crate::error::OcioResult;

/// Rendering context owned by the caller.
///
/// Holds the document-level settings every rendered config shares.
#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    profile_version: u32,
    strict_parsing: bool,
    luma: [f64; 3],
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            profile_version: 1,
            strict_parsing: true,
            luma: [0.2126, 0.7152, 0.0722],
        }
    }
}

impl Engine {
    /// Creates an engine with v1 profile defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the profile version written to documents.
    pub fn profile_version(mut self, version: u32) -> Self {
        self.profile_version = version;
        self
    }

    /// Sets the strict-parsing flag.
    pub fn strict_parsing(mut self, strict: bool) -> Self {
        self.strict_parsing = strict;
        self
    }

    /// Sets the luma coefficients.
    pub fn luma(mut self, luma: [f64; 3]) -> Self {
        self.luma = luma;
        self
    }
}

/// Renders configurations with a borrowed [`Engine`].
#[derive(Debug, Clone, Copy)]
pub struct Serializer<'e> {
    engine: &'e Engine,
}

impl<'e> Serializer<'e> {
    /// Creates a serializer bound to `engine`.
    pub fn new(engine: &'e Engine) -> Self {
        Self { engine }
    }

    /// Renders `config` to document text.
    pub fn render(&self, config: &Configuration) -> OcioResult<String> {
        let mut colorspaces: Vec<_> = config.colorspaces().iter().collect();
        // Stable: equal names keep insertion order.
        colorspaces.sort_by(|a, b| a.name().cmp(b.name()));

        let doc = ConfigDocument {
            ocio_profile_version: self.engine.profile_version,
            search_path: config.search_path().to_string(),
            strictparsing: self.engine.strict_parsing,
            luma: Some(self.engine.luma),
            description: config.description().to_string(),
            roles: config
                .roles()
                .iter()
                .map(|(role, cs)| (role.as_str().to_string(), cs.to_string()))
                .collect(),
            displays: config
                .displays()
                .displays()
                .iter()
                .map(|d| {
                    let views = d
                        .views()
                        .iter()
                        .map(|v| ViewEntry {
                            name: v.name().to_string(),
                            colorspace: v.colorspace().to_string(),
                        })
                        .collect();
                    (d.name().to_string(), views)
                })
                .collect(),
            active_displays: ActiveList::join(config.active_displays()),
            active_views: ActiveList::join(config.active_views()),
            colorspaces: colorspaces
                .into_iter()
                .map(ColorSpaceEntry::from_colorspace)
                .collect(),
        };

        Ok(serde_yaml::to_string(&doc)?)
    }

    /// Renders and writes `config` to `path`.
    ///
    /// The text goes to a sibling temporary file first and is renamed into
    /// place, so `path` never holds a partial document.
    pub fn write(&self, config: &Configuration, path: impl AsRef<Path>) -> OcioResult<()> {
        let path = path.as_ref();
        let text = self.render(config)?;
        let tmp = temp_sibling(path);
        debug!(path = %tmp.display(), bytes = text.len(), "writing temporary config");
        fs::write(&tmp, text)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!(path = %path.display(), colorspaces = config.colorspaces().len(), "wrote config");
        Ok(())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colorspace::ColorSpace;
    use crate::config_builder::ConfigurationBuilder;
    use crate::role::Role;
    use crate::transform::{TransformDescriptor, TransformDirection};

    fn sample() -> Configuration {
        let mut b = ConfigurationBuilder::new(ColorSpace::new("ACES2065-1")).search_path("luts");
        for name in ["Zeta", "ACEScc", "Beta"] {
            b.register(
                ColorSpace::builder(name)
                    .to_reference(TransformDescriptor::log(2.0, TransformDirection::Inverse))
                    .build(),
            )
            .unwrap();
        }
        b.set_display_view("sRGB", "Log", "ACEScc").unwrap();
        b.set_display_view("ACES", "Raw", "ACES2065-1").unwrap();
        b.set_display_view("ACES", "Log", "ACEScc").unwrap();
        b.set_role(Role::TexturePaint, "Beta").unwrap();
        b.set_role(Role::ColorPicking, "Zeta").unwrap();
        b.finalize().unwrap()
    }

    #[test]
    fn render_is_sorted() {
        let engine = Engine::new();
        let text = Serializer::new(&engine).render(&sample()).unwrap();

        let pos = |needle: &str| text.find(needle).unwrap();
        assert!(pos("name: ACES2065-1") < pos("name: ACEScc"));
        assert!(pos("name: ACEScc") < pos("name: Beta"));
        assert!(pos("name: Beta") < pos("name: Zeta"));
        assert!(pos("color_picking") < pos("texture_paint"));
        assert!(pos("  ACES:") < pos("  sRGB:"));
        assert!(pos("name: Raw") < pos("name: Log"));
        assert!(text.contains("ACES,sRGB"));
        assert!(text.contains("Log,Raw"));
        assert!(text.starts_with("ocio_profile_version: 1"));
    }

    #[test]
    fn render_is_deterministic() {
        let engine = Engine::new().strict_parsing(false);
        let s = Serializer::new(&engine);
        let config = sample();
        assert_eq!(s.render(&config).unwrap(), s.render(&config).unwrap());
        assert!(s.render(&config).unwrap().contains("strictparsing: false"));
    }

    #[test]
    fn write_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ocio");
        std::fs::write(&path, "stale").unwrap();

        let engine = Engine::new();
        Serializer::new(&engine).write(&sample(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("ocio_profile_version"));
        assert!(!dir.path().join("config.ocio.tmp").exists());
    }
}
