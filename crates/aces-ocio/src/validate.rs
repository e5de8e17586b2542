//! Configuration validation.
//!
//! Two layers:
//! - [`check`] is the ordered consistency check run by
//!   [`ConfigurationBuilder::finalize`](crate::ConfigurationBuilder::finalize).
//!   It stops at the first failing [`ValidationStep`].
//! - [`lint`] collects non-fatal issues worth logging.
//!
//! # Example
//!
//! ```ignore
//! use aces_ocio::{Configuration, validate};
//!
//! let config = Configuration::from_file("config.ocio")?;
//! validate::check(&config)?;
//! for issue in validate::lint(&config) {
//!     println!("{}: {}", issue.severity, issue.message);
//! }
//! ```

use std::collections::HashSet;
use std::fmt;

use crate::config::Configuration;
use crate::error::{ValidationError, ValidationStep};

/// Runs the five consistency steps in order.
pub fn check(config: &Configuration) -> Result<(), ValidationError> {
    check_reference(config)?;
    check_unique_names(config)?;
    check_display_views(config)?;
    check_roles(config)?;
    check_active_lists(config)
}

fn check_reference(config: &Configuration) -> Result<(), ValidationError> {
    let step = ValidationStep::ReferenceSpace;
    let Some(reference) = config.reference() else {
        return Err(ValidationError::new(
            step,
            format!("reference space '{}' is not registered", config.reference_name()),
        ));
    };
    if reference.has_to_reference() || reference.has_from_reference() {
        return Err(ValidationError::new(
            step,
            format!("reference space '{}' carries a reference transform", reference.name()),
        ));
    }
    Ok(())
}

fn check_unique_names(config: &Configuration) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for name in config.colorspace_names() {
        if !names.insert(name) {
            return Err(ValidationError::new(
                ValidationStep::UniqueNames,
                format!("duplicate color space name '{name}'"),
            ));
        }
    }
    Ok(())
}

fn check_display_views(config: &Configuration) -> Result<(), ValidationError> {
    for (display, view, cs) in config.displays().entries() {
        if config.colorspace(cs).is_none() {
            return Err(ValidationError::new(
                ValidationStep::DisplayViews,
                format!("view '{view}' of display '{display}' targets unknown color space '{cs}'"),
            ));
        }
    }
    Ok(())
}

fn check_roles(config: &Configuration) -> Result<(), ValidationError> {
    for (role, cs) in config.roles().iter() {
        if config.colorspace(cs).is_none() {
            return Err(ValidationError::new(
                ValidationStep::Roles,
                format!("role '{role}' targets unknown color space '{cs}'"),
            ));
        }
    }
    Ok(())
}

fn check_active_lists(config: &Configuration) -> Result<(), ValidationError> {
    let needs_display = config
        .colorspaces()
        .iter()
        .any(|cs| cs.name() != config.reference_name() && !cs.is_data());
    if !needs_display {
        return Ok(());
    }
    let step = ValidationStep::ActiveLists;
    if config.active_displays().is_empty() {
        return Err(ValidationError::new(step, "no active displays"));
    }
    if config.active_views().is_empty() {
        return Err(ValidationError::new(step, "no active views"));
    }
    Ok(())
}

/// Severity level for lint issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational message.
    Info,
    /// Warning - config works but may have issues.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
        }
    }
}

/// Categories of lint issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCategory {
    /// Non-data space with no way to or from the reference.
    MissingTransform,
    /// Data space carrying transforms.
    DataWithTransform,
    /// Display listed without views.
    EmptyDisplay,
}

/// A lint finding.
#[derive(Debug, Clone)]
pub struct Issue {
    /// Severity level.
    pub severity: Severity,
    /// Issue category.
    pub category: IssueCategory,
    /// Human-readable message.
    pub message: String,
    /// Related element (color space or display name).
    pub context: Option<String>,
}

/// Collects non-fatal issues.
pub fn lint(config: &Configuration) -> Vec<Issue> {
    let mut issues = Vec::new();

    for cs in config.colorspaces() {
        if cs.name() == config.reference_name() {
            continue;
        }
        let has_transform = cs.has_to_reference() || cs.has_from_reference();
        if !cs.is_data() && !has_transform {
            issues.push(Issue {
                severity: Severity::Warning,
                category: IssueCategory::MissingTransform,
                message: format!("color space '{}' defines no reference transform", cs.name()),
                context: Some(cs.name().to_string()),
            });
        }
        if cs.is_data() && has_transform {
            issues.push(Issue {
                severity: Severity::Info,
                category: IssueCategory::DataWithTransform,
                message: format!("data color space '{}' has transforms defined", cs.name()),
                context: Some(cs.name().to_string()),
            });
        }
    }

    let listed: HashSet<&str> = config
        .displays()
        .displays()
        .iter()
        .map(|d| d.name())
        .collect();
    for display in config.active_displays() {
        if !listed.contains(display.as_str()) {
            issues.push(Issue {
                severity: Severity::Warning,
                category: IssueCategory::EmptyDisplay,
                message: format!("active display '{display}' has no views"),
                context: Some(display.clone()),
            });
        }
    }

    issues
}

/// Returns true if there are any warnings.
pub fn has_warnings(issues: &[Issue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Warning)
}
