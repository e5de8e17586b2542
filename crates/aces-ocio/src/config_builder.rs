//! Configuration builder.
//!
//! Owns the registry while vendor color spaces are merged in, then runs the
//! consistency check and hands out a [`Configuration`].
//!
//! # Example
//!
//! ```
//! use aces_ocio::{ColorSpace, ConfigurationBuilder, Role, TransformDescriptor};
//!
//! let mut builder = ConfigurationBuilder::new(ColorSpace::new("ACES2065-1"))
//!     .description("An ACES config")
//!     .search_path("luts");
//!
//! builder.register(
//!     ColorSpace::builder("sRGB")
//!         .alias("srgb_texture")
//!         .to_reference(TransformDescriptor::matrix33([
//!             0.4397, 0.3830, 0.1773,
//!             0.0898, 0.8134, 0.0968,
//!             0.0175, 0.1115, 0.8710,
//!         ]))
//!         .build(),
//! )?;
//! builder.set_display_view("sRGB Monitor", "Output Transform", "sRGB")?;
//! builder.set_role(Role::Reference, "ACES2065-1")?;
//!
//! let config = builder.finalize()?;
//! assert!(config.colorspace("srgb_texture").is_some());
//! # Ok::<(), aces_ocio::OcioError>(())
//! ```

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::alias::bind_aliases;
use crate::colorspace::ColorSpace;
use crate::config::Configuration;
use crate::display::{ALTERNATE_VIEW, DisplayMode, DisplayViewTable, LINEAR_DISPLAY, LOG_DISPLAY};
use crate::document::ActiveList;
use crate::error::{OcioError, OcioResult};
use crate::role::{Role, RoleTable};
use crate::validate;

/// Lifecycle of a [`ConfigurationBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Only the reference space is known.
    Empty,
    /// At least one registration happened.
    Populated,
    /// Finalized; all mutators fail.
    Finalized,
}

/// Builder that assembles a [`Configuration`].
#[derive(Debug, Clone)]
pub struct ConfigurationBuilder {
    state: BuilderState,
    mode: DisplayMode,
    description: String,
    search_path: String,
    reference: String,
    reference_aliases: Vec<String>,
    colorspaces: Vec<ColorSpace>,
    names: HashSet<String>,
    displays: DisplayViewTable,
    /// Display names in first-seen order, including ones whose views the
    /// mode dropped.
    seen_displays: Vec<String>,
    views: Vec<String>,
    roles: RoleTable,
}

impl ConfigurationBuilder {
    /// Creates a builder around the reference space.
    ///
    /// The reference is registered immediately; its aliases are expanded by
    /// [`bind_reference_aliases`](Self::bind_reference_aliases).
    pub fn new(reference: ColorSpace) -> Self {
        let name = reference.name().to_string();
        debug!(name = %name, "adding reference color space");
        Self {
            state: BuilderState::Empty,
            mode: DisplayMode::Generic,
            description: String::new(),
            search_path: String::new(),
            reference_aliases: reference.aliases().to_vec(),
            names: HashSet::from([name.clone()]),
            reference: name,
            colorspaces: vec![reference],
            displays: DisplayViewTable::new(),
            seen_displays: Vec::new(),
            views: Vec::new(),
            roles: RoleTable::new(),
        }
    }

    /// Selects how display/view pairs are wired in.
    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the config description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Sets the LUT search path.
    pub fn search_path(mut self, path: impl Into<String>) -> Self {
        self.search_path = path.into();
        self
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Reference space name.
    #[inline]
    pub fn reference_name(&self) -> &str {
        &self.reference
    }

    /// Registered color spaces in insertion order.
    #[inline]
    pub fn colorspaces(&self) -> &[ColorSpace] {
        &self.colorspaces
    }

    /// Gets a registered color space by exact name.
    pub fn colorspace(&self, name: &str) -> Option<&ColorSpace> {
        self.colorspaces.iter().find(|cs| cs.name() == name)
    }

    fn ensure_open(&self) -> OcioResult<()> {
        if self.state == BuilderState::Finalized {
            return Err(OcioError::AlreadyFinalized);
        }
        Ok(())
    }

    /// Registers a color space and its aliases.
    ///
    /// All names are checked before anything is inserted, so a collision
    /// leaves the registry untouched.
    pub fn register(&mut self, colorspace: ColorSpace) -> OcioResult<()> {
        self.ensure_open()?;

        let aliases = bind_aliases(&colorspace, colorspace.aliases(), &self.reference);
        self.insert_all(colorspace, aliases)
    }

    /// Expands the reference space's own aliases.
    ///
    /// A second call is a no-op.
    pub fn bind_reference_aliases(&mut self) -> OcioResult<()> {
        self.ensure_open()?;
        if self.reference_aliases.is_empty() {
            return Ok(());
        }
        let Some(reference) = self.colorspace(&self.reference) else {
            return Err(OcioError::UnknownColorSpace {
                name: self.reference.clone(),
            });
        };
        let aliases = bind_aliases(reference, &self.reference_aliases, &self.reference);
        self.check_names(aliases.iter().map(|cs| cs.name()))?;
        self.reference_aliases.clear();
        for alias in aliases {
            self.push(alias);
        }
        self.state = BuilderState::Populated;
        Ok(())
    }

    fn insert_all(&mut self, colorspace: ColorSpace, aliases: Vec<ColorSpace>) -> OcioResult<()> {
        self.check_names(std::iter::once(colorspace.name()).chain(aliases.iter().map(|cs| cs.name())))?;

        if !colorspace.is_data() && !colorspace.has_to_reference() && !colorspace.has_from_reference() {
            warn!(name = %colorspace.name(), "color space defines no reference transform");
        }

        self.push(colorspace);
        for alias in aliases {
            self.push(alias);
        }
        self.state = BuilderState::Populated;
        Ok(())
    }

    fn check_names<'a>(&self, names: impl Iterator<Item = &'a str>) -> OcioResult<()> {
        let mut pending = HashSet::new();
        for name in names {
            if self.names.contains(name) || !pending.insert(name) {
                return Err(OcioError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn push(&mut self, colorspace: ColorSpace) {
        debug!(name = %colorspace.name(), family = %colorspace.family(), "registered color space");
        self.names.insert(colorspace.name().to_string());
        self.colorspaces.push(colorspace);
    }

    /// Maps `(display, view)` to a registered color space.
    ///
    /// Display and view names end up in `,`-joined active lists, so a name
    /// that is empty, contains `,` or has surrounding whitespace is
    /// rejected. In alternate-consumer mode every view other than the
    /// sentinel is dropped after the name checks.
    pub fn set_display_view(
        &mut self,
        display_name: &str,
        view_name: &str,
        colorspace_name: &str,
    ) -> OcioResult<()> {
        self.ensure_open()?;
        check_list_name(display_name)?;
        check_list_name(view_name)?;
        if !self.names.contains(colorspace_name) {
            return Err(OcioError::UnknownColorSpace {
                name: colorspace_name.to_string(),
            });
        }

        if !self.seen_displays.iter().any(|d| d == display_name) {
            self.seen_displays.push(display_name.to_string());
        }

        let Some(view) = self.mode.map_view(view_name) else {
            debug!(display_name, view_name, "dropping view for alternate consumer");
            return Ok(());
        };
        if !self.views.iter().any(|v| v == view) {
            self.views.push(view.to_string());
        }
        self.displays.set(display_name, view, colorspace_name);
        Ok(())
    }

    /// Binds a role. An empty name leaves the role unset.
    pub fn set_role(&mut self, role: Role, colorspace_name: &str) -> OcioResult<()> {
        self.ensure_open()?;
        if colorspace_name.is_empty() {
            return Ok(());
        }
        if !self.names.contains(colorspace_name) {
            return Err(OcioError::UnknownColorSpace {
                name: colorspace_name.to_string(),
            });
        }
        self.roles.set(role, colorspace_name);
        Ok(())
    }

    /// Runs the consistency check and returns the configuration.
    ///
    /// On failure the builder stays open and nothing is returned.
    pub fn finalize(&mut self) -> OcioResult<Configuration> {
        self.ensure_open()?;

        let mut displays = self.displays.clone();
        let mut display_names = self.seen_displays.clone();
        let mut views = self.views.clone();

        if let DisplayMode::AlternateConsumer {
            linear_space,
            log_space,
        } = &self.mode
        {
            for (name, space) in [(LINEAR_DISPLAY, linear_space), (LOG_DISPLAY, log_space)] {
                if displays.display(name).is_some() {
                    warn!(display = name, "synthetic display overwrites an existing one");
                }
                displays.set(name, ALTERNATE_VIEW, space.as_str());
                display_names.push(name.to_string());
            }
            if !views.iter().any(|v| v == ALTERNATE_VIEW) {
                views.push(ALTERNATE_VIEW.to_string());
            }
        }

        display_names.sort();
        display_names.dedup();

        let config = Configuration::from_parts(
            self.reference.clone(),
            self.colorspaces.clone(),
            displays,
            self.roles.clone(),
            self.search_path.clone(),
            self.description.clone(),
            display_names,
            views,
        );

        if let Err(err) = validate::check(&config) {
            warn!(step = err.step.number(), detail = %err.detail, "configuration rejected");
            return Err(err.into());
        }
        for issue in validate::lint(&config) {
            debug!(severity = %issue.severity, "{}", issue.message);
        }

        self.state = BuilderState::Finalized;
        Ok(config)
    }
}

fn check_list_name(name: &str) -> OcioResult<()> {
    let reason = if name.is_empty() {
        "empty name"
    } else if name.contains(ActiveList::SEPARATOR) {
        "name contains ','"
    } else if name.trim() != name {
        "name has leading or trailing whitespace"
    } else {
        return Ok(());
    };
    Err(OcioError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}
