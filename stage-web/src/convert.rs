//! Conversions between JavaScript-facing values and stage types.
//!
//! Everything here is plain Rust so it can be tested off the browser.

use stage_core::{Attrs, ListenerId, ObjectId, Style, Vec2};
use stage_renderer::StageConfig;
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Largest integer a JavaScript number holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Errors raised by the web bindings.
#[derive(Debug, Error)]
pub enum WebError {
    /// The page has no `window` or `document`.
    #[error("No {0} object")]
    NoHost(&'static str),

    /// A DOM element lookup failed.
    #[error("Element '{0}' not found")]
    MissingElement(String),

    /// The created element is not a canvas or has no 2D context.
    #[error("Canvas setup failed: {0}")]
    Canvas(String),

    /// A flat coordinate array had an odd length.
    #[error("Expected x,y pairs but got {0} numbers")]
    OddCoordinates(usize),

    /// A number passed from JavaScript is not a valid id.
    #[error("Invalid id: {0}")]
    InvalidId(f64),

    /// Unknown pointer event name.
    #[error("Unknown pointer event '{0}'")]
    UnknownEvent(String),

    /// Style, attribute or option JSON could not be parsed.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<WebError> for JsValue {
    fn from(err: WebError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Map any displayable error into a JavaScript exception value.
pub fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Id of the canvas created inside `container`.
#[must_use]
pub fn canvas_id(container: &str) -> String {
    format!("{container}_canvas")
}

/// Turn `[x0, y0, x1, y1, ...]` into points.
///
/// # Errors
///
/// Returns an error if the array has an odd length.
pub fn points_from_flat(coords: &[f64]) -> Result<Vec<Vec2>, WebError> {
    if coords.len() % 2 != 0 {
        return Err(WebError::OddCoordinates(coords.len()));
    }
    Ok(coords
        .chunks_exact(2)
        .map(|pair| Vec2::new(pair[0], pair[1]))
        .collect())
}

/// Flatten points into `[x0, y0, x1, y1, ...]`.
#[must_use]
pub fn points_to_flat(points: &[Vec2]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

fn non_empty(json: Option<&str>) -> Option<&str> {
    json.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse an optional style record; absent or blank means all defaults.
///
/// # Errors
///
/// Returns an error if the JSON is malformed.
pub fn parse_style(json: Option<&str>) -> Result<Style, WebError> {
    match non_empty(json) {
        Some(json) => Ok(serde_json::from_str(json)?),
        None => Ok(Style::default()),
    }
}

/// Parse an optional attribute object.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or not an object.
pub fn parse_attrs(json: Option<&str>) -> Result<Attrs, WebError> {
    match non_empty(json) {
        Some(json) => Ok(serde_json::from_str(json)?),
        None => Ok(Attrs::new()),
    }
}

/// Stage options from `{"drag": bool, "zoom": bool}` plus the size.
///
/// # Errors
///
/// Returns an error if the JSON is malformed.
pub fn parse_config(json: Option<&str>, width: f64, height: f64) -> Result<StageConfig, WebError> {
    let config: StageConfig = match non_empty(json) {
        Some(json) => serde_json::from_str(json)?,
        None => StageConfig::default(),
    };
    Ok(config.with_size(width, height))
}

/// An id as a JavaScript number.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn id_to_js(raw: u64) -> f64 {
    raw as f64
}

fn raw_from_js(value: f64) -> Result<u64, WebError> {
    if value.is_finite() && value >= 1.0 && value <= MAX_SAFE_INTEGER && value.fract() == 0.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(value as u64)
    } else {
        Err(WebError::InvalidId(value))
    }
}

/// Parse an object id passed from JavaScript.
///
/// # Errors
///
/// Returns an error unless `value` is a positive integer.
pub fn object_id(value: f64) -> Result<ObjectId, WebError> {
    raw_from_js(value).map(ObjectId::from_raw)
}

/// Parse a listener id passed from JavaScript.
///
/// # Errors
///
/// Returns an error unless `value` is a positive integer.
pub fn listener_id(value: f64) -> Result<ListenerId, WebError> {
    raw_from_js(value).map(ListenerId::from_raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_id() {
        assert_eq!(canvas_id("board"), "board_canvas");
    }

    #[test]
    fn test_points_from_flat() {
        let points = points_from_flat(&[1.0, 2.0, 3.0, 4.0]).expect("points");
        assert_eq!(points, vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)]);
        assert_eq!(points_to_flat(&points), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(points_from_flat(&[]).expect("empty").is_empty());
        assert!(matches!(
            points_from_flat(&[1.0, 2.0, 3.0]),
            Err(WebError::OddCoordinates(3))
        ));
    }

    #[test]
    fn test_parse_style_defaults_and_camel_case() {
        assert_eq!(parse_style(None).expect("none"), Style::default());
        assert_eq!(parse_style(Some("  ")).expect("blank"), Style::default());
        let style = parse_style(Some(r#"{"lineColor": "red", "smooth": 4}"#)).expect("style");
        assert_eq!(style.stroke().color, "red");
        assert_eq!(style.smoothing(), Some(4.0));
        assert!(parse_style(Some("{")).is_err());
    }

    #[test]
    fn test_parse_attrs_requires_object() {
        let attrs = parse_attrs(Some(r#"{"name": "pen"}"#)).expect("attrs");
        assert_eq!(attrs.get("name"), Some(&serde_json::json!("pen")));
        assert!(parse_attrs(None).expect("none").is_empty());
        assert!(parse_attrs(Some("[1, 2]")).is_err());
    }

    #[test]
    fn test_parse_config_applies_size() {
        let config = parse_config(Some(r#"{"drag": true}"#), 640.0, 480.0).expect("config");
        assert!(config.drag);
        assert!(!config.zoom);
        assert!((config.width - 640.0).abs() < f64::EPSILON);
        assert!((config.height - 480.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ids_round_trip_through_numbers() {
        let id = object_id(id_to_js(42)).expect("id");
        assert_eq!(id.get(), 42);
        assert_eq!(listener_id(3.0).expect("listener").get(), 3);
        for bad in [0.0, -1.0, 1.5, f64::NAN, f64::INFINITY] {
            assert!(object_id(bad).is_err(), "{bad} accepted");
        }
    }
}
