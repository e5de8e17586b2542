//! The assembled configuration and its reader.
//!
//! A [`Configuration`] is produced by
//! [`ConfigurationBuilder::finalize`](crate::ConfigurationBuilder::finalize)
//! or parsed back from a persisted document.
//!
//! # Example
//!
//! ```ignore
//! use aces_ocio::Configuration;
//!
//! let config = Configuration::from_file("config.ocio")?;
//! for cs in config.colorspaces() {
//!     println!("{} ({})", cs.name(), cs.family());
//! }
//! ```

use std::path::Path;
use std::str::FromStr;

use tracing::warn;

use crate::colorspace::ColorSpace;
use crate::display::DisplayViewTable;
use crate::document::ConfigDocument;
use crate::error::OcioResult;
use crate::role::{Role, RoleTable};

/// Assembled color-management configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    /// Name of the reference space; empty if it could not be determined.
    reference: String,
    /// All color spaces in insertion order, reference included.
    colorspaces: Vec<ColorSpace>,
    displays: DisplayViewTable,
    roles: RoleTable,
    search_path: String,
    description: String,
    active_displays: Vec<String>,
    active_views: Vec<String>,
}

impl Configuration {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        reference: String,
        colorspaces: Vec<ColorSpace>,
        displays: DisplayViewTable,
        roles: RoleTable,
        search_path: String,
        description: String,
        active_displays: Vec<String>,
        active_views: Vec<String>,
    ) -> Self {
        Self {
            reference,
            colorspaces,
            displays,
            roles,
            search_path,
            description,
            active_displays,
            active_views,
        }
    }

    /// Loads a configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> OcioResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Parses a configuration from document text.
    ///
    /// The reference space is the `reference` role target when set,
    /// otherwise the first color space without reference transforms.
    pub fn from_yaml_str(yaml: &str) -> OcioResult<Self> {
        let doc: ConfigDocument = serde_yaml::from_str(yaml)?;
        Self::from_document(doc)
    }

    fn from_document(doc: ConfigDocument) -> OcioResult<Self> {
        let mut roles = RoleTable::new();
        for (key, cs) in doc.roles {
            match Role::from_str(&key) {
                Ok(role) => roles.set(role, cs),
                Err(_) => warn!(role = %key, "ignoring unknown role"),
            }
        }

        let colorspaces = doc
            .colorspaces
            .into_iter()
            .map(|entry| entry.into_colorspace())
            .collect::<OcioResult<Vec<_>>>()?;

        let mut displays = DisplayViewTable::new();
        for (display, views) in doc.displays {
            for view in views {
                displays.set(display.as_str(), view.name, view.colorspace);
            }
        }

        let reference = match roles.reference() {
            Some(name) => name.to_string(),
            None => colorspaces
                .iter()
                .find(|cs| !cs.has_to_reference() && !cs.has_from_reference())
                .map(|cs| cs.name().to_string())
                .unwrap_or_default(),
        };

        Ok(Self {
            reference,
            colorspaces,
            displays,
            roles,
            search_path: doc.search_path,
            description: doc.description,
            active_displays: doc.active_displays.into_vec(),
            active_views: doc.active_views.into_vec(),
        })
    }

    /// Returns the reference space name.
    #[inline]
    pub fn reference_name(&self) -> &str {
        &self.reference
    }

    /// Returns the reference space, if registered.
    pub fn reference(&self) -> Option<&ColorSpace> {
        self.colorspace(&self.reference)
    }

    /// Returns all color spaces in insertion order.
    #[inline]
    pub fn colorspaces(&self) -> &[ColorSpace] {
        &self.colorspaces
    }

    /// Gets a color space by exact name.
    pub fn colorspace(&self, name: &str) -> Option<&ColorSpace> {
        self.colorspaces.iter().find(|cs| cs.name() == name)
    }

    /// Returns all color space names in insertion order.
    pub fn colorspace_names(&self) -> impl Iterator<Item = &str> {
        self.colorspaces.iter().map(|cs| cs.name())
    }

    /// Returns the display/view table.
    #[inline]
    pub fn displays(&self) -> &DisplayViewTable {
        &self.displays
    }

    /// Returns role mappings.
    #[inline]
    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    /// Returns the LUT search path.
    #[inline]
    pub fn search_path(&self) -> &str {
        &self.search_path
    }

    /// Returns the description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns active displays.
    #[inline]
    pub fn active_displays(&self) -> &[String] {
        &self.active_displays
    }

    /// Returns active views.
    #[inline]
    pub fn active_views(&self) -> &[String] {
        &self.active_views
    }
}
