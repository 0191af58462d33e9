//! `oklch()` → `hsl()` normalization.
//!
//! The rasterizer only understands sRGB-era color syntax, so every `oklch()`
//! value is mapped onto an approximate `hsl()`/`hsla()` before painting. The
//! mapping is a fixed formula, not a color-space conversion:
//!
//! - hue: in degrees (`turn`, `rad` and `grad` are converted), wrapped into
//!   `0..=360` and rounded
//! - saturation: `min(100, round(chroma * 500))`
//! - lightness: `round(L * 100)`, or the value itself when written as a percentage
//! - alpha: kept only when below 1
//!
//! A `none` component counts as zero.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Saturation percentage per unit of chroma.
pub const CHROMA_FACTOR: f64 = 500.0;

/// Replacement for values that look like `oklch(...)` but do not parse.
pub const FALLBACK: &str = "rgb(0, 0, 0)";

static ANY_OKLCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)oklch\([^)]*\)").expect("oklch scan pattern compiles"));

static OKLCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^oklch\(\s*(none|-?[\d.]+)(%?)\s+(none|-?[\d.]+)\s+(none|-?[\d.]+)(deg|turn|rad|grad)?(?:\s*/\s*(none|[\d.]+)(%?))?\s*\)$",
    )
    .expect("oklch pattern compiles")
});

/// Converts a single `oklch(...)` value. Anything unparseable yields [`FALLBACK`].
pub fn oklch_to_hsl(value: &str) -> String {
    convert(value.trim()).unwrap_or_else(|| FALLBACK.to_string())
}

/// Degrees for a hue written with `unit`.
fn hue_degrees(value: f64, unit: &str) -> f64 {
    let degrees = match unit.to_ascii_lowercase().as_str() {
        "turn" => value * 360.0,
        "rad" => value.to_degrees(),
        "grad" => value * 0.9,
        _ => value,
    };
    if (0.0..=360.0).contains(&degrees) {
        degrees
    } else {
        degrees.rem_euclid(360.0)
    }
}

fn convert(value: &str) -> Option<String> {
    let caps = OKLCH.captures(value)?;
    let number = |i: usize| -> Option<f64> {
        let raw = caps.get(i)?.as_str();
        if raw.eq_ignore_ascii_case("none") {
            return Some(0.0);
        }
        raw.parse::<f64>().ok().filter(|v| v.is_finite())
    };
    let flagged = |i: usize| caps.get(i).is_some_and(|m| !m.as_str().is_empty());

    let l = number(1)?;
    let lightness = if flagged(2) { l } else { l * 100.0 };
    // `+ 0.0` turns a rounded -0 into 0.
    let lightness = lightness.clamp(0.0, 100.0).round() + 0.0;
    let saturation = (number(3)?.max(0.0) * CHROMA_FACTOR).round().min(100.0) + 0.0;
    let unit = caps.get(5).map_or("", |m| m.as_str());
    let hue = hue_degrees(number(4)?, unit).round() + 0.0;

    let alpha = match caps.get(6) {
        Some(_) => {
            let raw = number(6)?;
            if flagged(7) {
                raw / 100.0
            } else {
                raw
            }
        }
        None => 1.0,
    };

    Some(if alpha < 1.0 {
        format!("hsla({hue}, {saturation}%, {lightness}%, {alpha})")
    } else {
        format!("hsl({hue}, {saturation}%, {lightness}%)")
    })
}

/// Rewrites every `oklch(...)` occurrence in `text`, leaving the rest untouched.
/// Works on whole stylesheets, markup, and single property values alike.
pub fn normalize(text: &str) -> String {
    ANY_OKLCH
        .replace_all(text, |caps: &Captures<'_>| oklch_to_hsl(&caps[0]))
        .into_owned()
}

/// True when `text` still carries a color syntax the rasterizer cannot read.
pub fn contains_oklch(text: &str) -> bool {
    ANY_OKLCH.is_match(text)
}
