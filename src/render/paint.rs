//! Literal paint property lookup.
//!
//! Expressions and zoom functions are not evaluated; they fall back to the
//! property's default.

use serde_json::{Map, Value};
use tiny_skia::Color;

pub fn color(paint: &Map<String, Value>, key: &str, default: Color) -> Color {
    match paint.get(key) {
        None => default,
        Some(Value::String(s)) => match csscolorparser::parse(s) {
            Ok(c) => {
                let [r, g, b, a] = c.to_rgba8();
                Color::from_rgba8(r, g, b, a)
            }
            Err(e) => {
                log::debug!("paint {key}: bad color {s:?}: {e}");
                default
            }
        },
        Some(other) => {
            log::debug!("paint {key}: non-literal value {other} ignored");
            default
        }
    }
}

pub fn number(paint: &Map<String, Value>, key: &str, default: f32) -> f32 {
    match paint.get(key) {
        None => default,
        Some(v) => match v.as_f64() {
            Some(n) if n.is_finite() => n as f32,
            _ => {
                log::debug!("paint {key}: non-literal value {v} ignored");
                default
            }
        },
    }
}

/// `color` with its alpha scaled by the `opacity` property (clamped to 0..=1).
pub fn color_with_opacity(
    paint: &Map<String, Value>,
    color_key: &str,
    opacity_key: &str,
    default: Color,
) -> Color {
    let mut c = color(paint, color_key, default);
    c.apply_opacity(number(paint, opacity_key, 1.0).clamp(0.0, 1.0));
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paint(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn reads_css_colors() {
        let p = paint(json!({"fill-color": "rgb(255, 0, 0)", "line-color": "#00ff00"}));
        assert_eq!(color(&p, "fill-color", Color::BLACK).to_color_u8().red(), 255);
        assert_eq!(color(&p, "line-color", Color::BLACK).to_color_u8().green(), 255);
    }

    #[test]
    fn expressions_fall_back_to_default() {
        let p = paint(json!({
            "fill-color": ["get", "colour"],
            "line-width": {"stops": [[0, 1], [10, 4]]},
            "circle-color": "not-a-color"
        }));
        assert_eq!(color(&p, "fill-color", Color::WHITE), Color::WHITE);
        assert_eq!(color(&p, "circle-color", Color::WHITE), Color::WHITE);
        assert_eq!(number(&p, "line-width", 1.0), 1.0);
        assert_eq!(number(&p, "missing", 3.5), 3.5);
    }

    #[test]
    fn opacity_scales_alpha() {
        let p = paint(json!({"fill-color": "#000000", "fill-opacity": 0.5}));
        let c = color_with_opacity(&p, "fill-color", "fill-opacity", Color::WHITE);
        assert!((c.alpha() - 0.5).abs() < 1e-6);

        let p = paint(json!({"fill-opacity": 4}));
        let c = color_with_opacity(&p, "fill-color", "fill-opacity", Color::BLACK);
        assert_eq!(c.alpha(), 1.0);
    }
}
