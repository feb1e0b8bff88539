//! Style records and their resolved stroke form.

use serde::{Deserialize, Serialize};

use crate::CanvasResult;

/// Default stroke color.
pub const DEFAULT_LINE_COLOR: &str = "black";

/// Default stroke width.
pub const DEFAULT_LINE_WIDTH: f64 = 1.0;

/// Line end cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    /// Flat end at the endpoint.
    Butt,
    /// Rounded end.
    #[default]
    Round,
    /// Square end extending past the endpoint.
    Square,
}

impl LineCap {
    /// Canvas keyword for this cap.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

/// Line corner join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    /// Rounded corner.
    #[default]
    Round,
    /// Bevelled corner.
    Bevel,
    /// Sharp corner.
    Miter,
}

impl LineJoin {
    /// Canvas keyword for this join.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::Bevel => "bevel",
            Self::Miter => "miter",
        }
    }
}

/// A style record as supplied by callers. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Style {
    /// Stroke color (CSS color string).
    pub line_color: Option<String>,
    /// Stroke width in world units.
    pub line_width: Option<f64>,
    /// Dash pattern; empty means solid.
    pub line_dash: Option<Vec<f64>>,
    /// End cap.
    pub line_cap: Option<LineCap>,
    /// Corner join.
    pub line_join: Option<LineJoin>,
    /// Fill color for closed shapes.
    pub fill_color: Option<String>,
    /// Minimum spacing between recorded points of a freehand line.
    pub smooth: Option<f64>,
}

impl Style {
    /// Parse a style record from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the stroke color.
    #[must_use]
    pub fn with_line_color(mut self, color: impl Into<String>) -> Self {
        self.line_color = Some(color.into());
        self
    }

    /// Set the stroke width.
    #[must_use]
    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = Some(width);
        self
    }

    /// Set the dash pattern.
    #[must_use]
    pub fn with_line_dash(mut self, dash: Vec<f64>) -> Self {
        self.line_dash = Some(dash);
        self
    }

    /// Set the fill color.
    #[must_use]
    pub fn with_fill_color(mut self, color: impl Into<String>) -> Self {
        self.fill_color = Some(color.into());
        self
    }

    /// Set the freehand smoothing distance.
    #[must_use]
    pub fn with_smooth(mut self, distance: f64) -> Self {
        self.smooth = Some(distance);
        self
    }

    /// Resolve the stroke part of this record, filling in defaults.
    #[must_use]
    pub fn stroke(&self) -> StrokeStyle {
        StrokeStyle {
            color: self
                .line_color
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_LINE_COLOR.to_string()),
            width: self
                .line_width
                .filter(|w| *w > 0.0)
                .unwrap_or(DEFAULT_LINE_WIDTH),
            dash: self.line_dash.clone().unwrap_or_default(),
            cap: self.line_cap.unwrap_or_default(),
            join: self.line_join.unwrap_or_default(),
        }
    }

    /// The fill color, if one is set and non-empty.
    #[must_use]
    pub fn fill(&self) -> Option<String> {
        self.fill_color.clone().filter(|c| !c.is_empty())
    }

    /// The smoothing distance, if one is set and positive.
    #[must_use]
    pub fn smoothing(&self) -> Option<f64> {
        self.smooth.filter(|s| *s > 0.0)
    }
}

/// A fully resolved stroke style, ready for the drawing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Stroke color.
    pub color: String,
    /// Stroke width.
    pub width: f64,
    /// Dash pattern.
    pub dash: Vec<f64>,
    /// End cap.
    pub cap: LineCap,
    /// Corner join.
    pub join: LineJoin,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Style::default().stroke()
    }
}
