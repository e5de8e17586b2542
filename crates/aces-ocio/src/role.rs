//! Standard color space roles.
//!
//! Roles let consumers pick a sensible color space by purpose rather than
//! by name. The set of roles is fixed; each is either unset or bound to one
//! registered color space.
//!
//! # Roles
//!
//! - `color_picking` - Color picker display space
//! - `color_timing` - Color grading/timing space
//! - `compositing_log` - Log compositing space
//! - `data` - Non-color data (normals, masks, etc.)
//! - `default` - Default input color space
//! - `matte_paint` - Matte painting space
//! - `reference` - The reference space
//! - `scene_linear` - Scene-referred linear working space
//! - `texture_paint` - Texture painting space

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::OcioError;

/// A role slot. Declaration order is the serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Color picker display space.
    ColorPicking,
    /// Color grading space.
    ColorTiming,
    /// Log compositing space.
    CompositingLog,
    /// Non-color data.
    Data,
    /// Default input color space.
    Default,
    /// Matte painting space.
    MattePaint,
    /// Reference space.
    Reference,
    /// Scene-referred linear working space.
    SceneLinear,
    /// Texture painting space.
    TexturePaint,
}

impl Role {
    /// All roles in serialization order.
    pub const ALL: [Role; 9] = [
        Self::ColorPicking,
        Self::ColorTiming,
        Self::CompositingLog,
        Self::Data,
        Self::Default,
        Self::MattePaint,
        Self::Reference,
        Self::SceneLinear,
        Self::TexturePaint,
    ];

    /// Returns the document key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ColorPicking => "color_picking",
            Self::ColorTiming => "color_timing",
            Self::CompositingLog => "compositing_log",
            Self::Data => "data",
            Self::Default => "default",
            Self::MattePaint => "matte_paint",
            Self::Reference => "reference",
            Self::SceneLinear => "scene_linear",
            Self::TexturePaint => "texture_paint",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = OcioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| OcioError::UnknownRole { role: s.to_string() })
    }
}

/// Role to color space mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleTable {
    mapping: BTreeMap<Role, String>,
}

impl RoleTable {
    /// Creates an empty table.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a role.
    #[inline]
    pub fn set(&mut self, role: Role, colorspace: impl Into<String>) {
        self.mapping.insert(role, colorspace.into());
    }

    /// Gets the color space name for a role.
    #[inline]
    pub fn get(&self, role: Role) -> Option<&str> {
        self.mapping.get(&role).map(String::as_str)
    }

    /// Set roles in serialization order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.mapping.iter().map(|(r, cs)| (*r, cs.as_str()))
    }

    /// Number of set roles.
    #[inline]
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Checks if no roles are set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Gets the reference role target.
    #[inline]
    pub fn reference(&self) -> Option<&str> {
        self.get(Role::Reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut roles = RoleTable::new();
        roles.set(Role::SceneLinear, "ACEScg");
        roles.set(Role::Reference, "ACES2065-1");

        assert_eq!(roles.get(Role::SceneLinear), Some("ACEScg"));
        assert_eq!(roles.reference(), Some("ACES2065-1"));
        assert_eq!(roles.get(Role::Data), None);
    }

    #[test]
    fn iteration_uses_fixed_order() {
        let mut roles = RoleTable::new();
        roles.set(Role::TexturePaint, "a");
        roles.set(Role::ColorPicking, "b");
        roles.set(Role::Default, "c");

        let order: Vec<Role> = roles.iter().map(|(r, _)| r).collect();
        assert_eq!(order, vec![Role::ColorPicking, Role::Default, Role::TexturePaint]);
    }

    #[test]
    fn parse_role_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("rendering".parse::<Role>().is_err());
    }
}
