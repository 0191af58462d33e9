//! Template rendering: document + template id → visual tree.

pub mod surface;
pub mod templates;
pub mod theme;
pub mod tree;

use thiserror::Error;

use crate::models::resume::Document;

pub use surface::{OverrideGuard, Surface, TargetKind};
pub use theme::Theme;
pub use tree::{RenderTree, Rule, Selector, Stylesheet, VisualNode};

/// Logical page size in CSS pixels (A4 at 96 dpi).
pub const PAGE_WIDTH: f32 = 794.0;
pub const PAGE_HEIGHT: f32 = 1123.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
}

/// Renders `document` with the theme named `template_id`.
///
/// With `available_width`, the page is scaled to fit that width; without it
/// (or with a non-positive width) the page renders at print size.
pub fn render(
    document: &Document,
    template_id: &str,
    available_width: Option<f32>,
) -> Result<RenderTree, RenderError> {
    let theme = Theme::from_id(template_id)
        .ok_or_else(|| RenderError::UnknownTemplate(template_id.to_string()))?;

    let scale = match available_width {
        Some(width) if width.is_finite() && width > 0.0 => width / PAGE_WIDTH,
        _ => 1.0,
    };

    let mut root = templates::build(theme, document);
    for (i, color) in theme
        .palette(&document.template.color_palette)
        .into_iter()
        .enumerate()
    {
        root.style.insert(format!("--palette-{i}"), color);
    }
    if scale != 1.0 {
        root.style
            .insert("transform".to_string(), format!("scale({scale:.4})"));
        root.style
            .insert("transform-origin".to_string(), "top left".to_string());
    }

    Ok(RenderTree {
        template: theme.id().to_string(),
        scale,
        stylesheet: theme.stylesheet(),
        root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::blank();
        doc.profile.full_name = "Jane Doe".into();
        doc.profile.designation = "Platform Engineer".into();
        doc.work_experience[0].company = "Acme".into();
        doc.work_experience[0].role = "SRE".into();
        doc
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let err = render(&sample(), "retro", None).unwrap_err();
        assert_eq!(err, RenderError::UnknownTemplate("retro".into()));
    }

    #[test]
    fn test_scale_from_available_width() {
        let tree = render(&sample(), "modern", Some(397.0)).unwrap();
        assert!((tree.scale - 0.5).abs() < 1e-6);
        assert_eq!(
            tree.root.style.get("transform").map(String::as_str),
            Some("scale(0.5000)")
        );

        let print = render(&sample(), "modern", None).unwrap();
        assert_eq!(print.scale, 1.0);
        assert!(!print.root.style.contains_key("transform"));

        let bogus = render(&sample(), "modern", Some(-10.0)).unwrap();
        assert_eq!(bogus.scale, 1.0);
    }

    #[test]
    fn test_markup_is_deterministic() {
        for theme in Theme::ALL {
            let a = render(&sample(), theme.id(), Some(600.0)).unwrap().to_markup();
            let b = render(&sample(), theme.id(), Some(600.0)).unwrap().to_markup();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_palette_overrides_reach_root() {
        let mut doc = sample();
        doc.template.color_palette = vec!["#101010".into()];
        let tree = render(&doc, "classic", None).unwrap();
        assert_eq!(
            tree.root.style.get("--palette-0").map(String::as_str),
            Some("#101010")
        );
        assert_eq!(
            tree.root.style.get("--palette-1").map(String::as_str),
            Some(Theme::Classic.default_palette()[1])
        );
    }

    #[test]
    fn test_templates_differ() {
        let doc = sample();
        let modern = render(&doc, "modern", None).unwrap().to_markup();
        let classic = render(&doc, "classic", None).unwrap().to_markup();
        let compact = render(&doc, "compact", None).unwrap().to_markup();
        assert_ne!(modern, classic);
        assert_ne!(classic, compact);
        assert!(modern.contains("Jane Doe"));
        assert!(compact.contains("Platform Engineer"));
    }
}
