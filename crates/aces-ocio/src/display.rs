//! Display and View management.
//!
//! Output selection is two-level:
//! - **Display**: a physical or virtual output profile (monitor, projector)
//! - **View**: a viewing condition for that display, resolving to one color space
//!
//! # Example
//!
//! ```
//! use aces_ocio::DisplayViewTable;
//!
//! let mut table = DisplayViewTable::new();
//! table.set("sRGB Monitor", "Film", "Output - sRGB");
//! table.set("sRGB Monitor", "Raw", "Raw");
//! table.set("sRGB Monitor", "Film", "Output - sRGB (D60 sim.)");
//!
//! let display = table.display("sRGB Monitor").unwrap();
//! assert_eq!(display.views().len(), 2);
//! assert_eq!(display.view("Film").unwrap().colorspace(), "Output - sRGB (D60 sim.)");
//! ```

/// View name kept by the alternate-consumer mode.
pub const OUTPUT_TRANSFORM_VIEW: &str = "Output Transform";
/// Generic view label used by the alternate-consumer mode.
pub const ALTERNATE_VIEW: &str = "View";
/// Synthetic display showing the linear space.
pub const LINEAR_DISPLAY: &str = "linear";
/// Synthetic display showing the log space.
pub const LOG_DISPLAY: &str = "log";

/// A view within a display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    /// View name (e.g., "Output Transform", "Raw", "Log").
    name: String,
    /// Target color space name.
    colorspace: String,
}

impl View {
    /// Creates a new view.
    pub fn new(name: impl Into<String>, colorspace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colorspace: colorspace.into(),
        }
    }

    /// Returns the view name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the target color space.
    #[inline]
    pub fn colorspace(&self) -> &str {
        &self.colorspace
    }
}

/// A display with its views in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    name: String,
    views: Vec<View>,
}

impl Display {
    /// Creates a display without views.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            views: Vec::new(),
        }
    }

    /// Returns the display name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all views.
    #[inline]
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Gets a view by exact name.
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    /// Inserts a view or retargets an existing one in place.
    fn set_view(&mut self, view: View) {
        match self.views.iter_mut().find(|v| v.name == view.name) {
            Some(existing) => existing.colorspace = view.colorspace,
            None => self.views.push(view),
        }
    }
}

/// Display → view → color space mapping.
///
/// Displays and views keep insertion order; sorting for output is the
/// serializer's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayViewTable {
    displays: Vec<Display>,
}

impl DisplayViewTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites one `(display, view)` mapping.
    pub fn set(
        &mut self,
        display: impl Into<String>,
        view: impl Into<String>,
        colorspace: impl Into<String>,
    ) {
        let display = display.into();
        let view = View::new(view, colorspace);
        match self.displays.iter_mut().find(|d| d.name == display) {
            Some(d) => d.set_view(view),
            None => {
                let mut d = Display::new(display);
                d.set_view(view);
                self.displays.push(d);
            }
        }
    }

    /// Returns all displays.
    #[inline]
    pub fn displays(&self) -> &[Display] {
        &self.displays
    }

    /// Gets a display by exact name.
    pub fn display(&self, name: &str) -> Option<&Display> {
        self.displays.iter().find(|d| d.name == name)
    }

    /// Iterates `(display, view, colorspace)` triples.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.displays.iter().flat_map(|d| {
            d.views
                .iter()
                .map(move |v| (d.name.as_str(), v.name.as_str(), v.colorspace.as_str()))
        })
    }

    /// Total number of views across displays.
    pub fn len(&self) -> usize {
        self.displays.iter().map(|d| d.views.len()).sum()
    }

    /// Checks if the table holds no views.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How vendor display/view pairs are wired into the table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Every pair is kept as supplied.
    #[default]
    Generic,
    /// Simplified downstream consumer: only [`OUTPUT_TRANSFORM_VIEW`] is
    /// kept, renamed to [`ALTERNATE_VIEW`], and the [`LINEAR_DISPLAY`] and
    /// [`LOG_DISPLAY`] displays are always added.
    AlternateConsumer {
        /// Space shown by the `linear` display.
        linear_space: String,
        /// Space shown by the `log` display.
        log_space: String,
    },
}

impl DisplayMode {
    /// Maps an incoming view name, or `None` when the mode drops it.
    pub fn map_view<'a>(&self, view: &'a str) -> Option<&'a str> {
        match self {
            Self::Generic => Some(view),
            Self::AlternateConsumer { .. } if view == OUTPUT_TRANSFORM_VIEW => Some(ALTERNATE_VIEW),
            Self::AlternateConsumer { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_and_overwrite() {
        let mut table = DisplayViewTable::new();
        table.set("B", "v1", "x");
        table.set("A", "v2", "y");
        table.set("B", "v0", "z");
        table.set("B", "v1", "w");

        let names: Vec<&str> = table.displays().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["B", "A"]);

        let entries: Vec<_> = table.entries().collect();
        assert_eq!(
            entries,
            vec![("B", "v1", "w"), ("B", "v0", "z"), ("A", "v2", "y")]
        );
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn alternate_mode_view_mapping() {
        let mode = DisplayMode::AlternateConsumer {
            linear_space: "ACES2065-1".into(),
            log_space: "ACEScc".into(),
        };
        assert_eq!(mode.map_view("Output Transform"), Some("View"));
        assert_eq!(mode.map_view("Log"), None);
        assert_eq!(DisplayMode::Generic.map_view("Log"), Some("Log"));
    }
}
