//! Built-in themes: identifiers, default palettes, and stylesheets.
//!
//! Stylesheets never name a color directly. They reference the palette roles
//! through `var(--palette-N)`, which the page root defines.

use serde::Serialize;

use crate::render::tree::{Selector, Stylesheet};

/// Number of palette roles every theme defines.
pub const PALETTE_ROLES: usize = 5;

/// Palette role indices, as referenced by the stylesheets.
pub mod role {
    /// Tinted panels: sidebar, header band, tags.
    pub const SURFACE: usize = 0;
    /// Headings and skill bars.
    pub const ACCENT: usize = 1;
    pub const TEXT: usize = 2;
    pub const MUTED: usize = 3;
    /// Rules and empty bar tracks.
    pub const LINE: usize = 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Two columns with a tinted sidebar.
    Modern,
    /// Single column, centered header, ruled section headings.
    Classic,
    /// Header band and condensed type.
    Compact,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Modern, Theme::Classic, Theme::Compact];

    pub fn from_id(id: &str) -> Option<Theme> {
        match id {
            "modern" => Some(Theme::Modern),
            "classic" => Some(Theme::Classic),
            "compact" => Some(Theme::Compact),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Theme::Modern => "modern",
            Theme::Classic => "classic",
            Theme::Compact => "compact",
        }
    }

    pub fn font_family(self) -> &'static str {
        match self {
            Theme::Modern => "Inter, Helvetica, Arial, sans-serif",
            Theme::Classic => "Georgia, 'Times New Roman', serif",
            Theme::Compact => "'Roboto Condensed', 'Arial Narrow', sans-serif",
        }
    }

    pub fn default_palette(self) -> [&'static str; PALETTE_ROLES] {
        match self {
            Theme::Modern => [
                "oklch(0.96 0.02 250)",
                "oklch(0.5 0.16 255)",
                "oklch(0.27 0.03 260)",
                "oklch(0.52 0.03 260)",
                "oklch(0.88 0.03 255)",
            ],
            Theme::Classic => [
                "oklch(0.98 0.005 80)",
                "oklch(0.35 0.05 30)",
                "oklch(0.22 0.01 60)",
                "oklch(0.48 0.01 60)",
                "oklch(0.7 0.02 60)",
            ],
            Theme::Compact => [
                "oklch(0.93 0.04 170)",
                "oklch(0.52 0.12 170)",
                "oklch(0.25 0.02 200)",
                "oklch(0.5 0.02 200)",
                "oklch(0.85 0.04 170)",
            ],
        }
    }

    /// Default palette with `overrides[i]` replacing role `i` when non-blank.
    /// Extra overrides beyond the role count are ignored.
    pub fn palette(self, overrides: &[String]) -> Vec<String> {
        self.default_palette()
            .iter()
            .enumerate()
            .map(|(i, default)| match overrides.get(i) {
                Some(color) if !color.trim().is_empty() => color.trim().to_string(),
                _ => (*default).to_string(),
            })
            .collect()
    }

    pub fn stylesheet(self) -> Stylesheet {
        let base = Stylesheet::default()
            .rule(
                Selector::Class("page".into()),
                &[
                    ("background-color", "#ffffff"),
                    ("color", "var(--palette-2)"),
                    ("font-family", self.font_family()),
                    ("width", "794px"),
                ],
            )
            .rule(Selector::Tag("h1".into()), &[("font-weight", "700"), ("margin", "0")])
            .rule(Selector::Tag("h2".into()), &[("font-weight", "700"), ("margin", "0 0 6px 0")])
            .rule(Selector::Tag("p".into()), &[("margin", "0")])
            .rule(Selector::Class("designation".into()), &[("color", "var(--palette-1)")])
            .rule(
                Selector::Class("section".into()),
                &[("margin", "0 0 14px 0")],
            )
            .rule(
                Selector::Class("section-title".into()),
                &[("color", "var(--palette-1)"), ("text-transform", "uppercase")],
            )
            .rule(
                Selector::Class("entry".into()),
                &[("break-inside", "avoid"), ("margin", "0 0 8px 0")],
            )
            .rule(Selector::Class("entry-head".into()), &[("display", "flex"), ("gap", "8px")])
            .rule(Selector::Class("entry-title".into()), &[("font-weight", "600")])
            .rule(Selector::Class("entry-sub".into()), &[("color", "var(--palette-3)")])
            .rule(
                Selector::Class("entry-dates".into()),
                &[("color", "var(--palette-3)"), ("text-align", "right")],
            )
            .rule(Selector::Class("contact-item".into()), &[("margin", "0 0 3px 0")])
            .rule(Selector::Class("skill".into()), &[("break-inside", "avoid"), ("margin", "0 0 6px 0")])
            .rule(
                Selector::Class("skill-bar".into()),
                &[
                    ("background-color", "var(--palette-4)"),
                    ("border-radius", "2px"),
                    ("height", "4px"),
                    ("margin", "2px 0 0 0"),
                ],
            )
            .rule(
                Selector::Class("skill-fill".into()),
                &[
                    ("background-color", "var(--palette-1)"),
                    ("border-radius", "2px"),
                    ("height", "4px"),
                ],
            )
            .rule(Selector::Class("tag-list".into()), &[("display", "flex"), ("gap", "6px")])
            .rule(
                Selector::Class("tag".into()),
                &[
                    ("background-color", "var(--palette-0)"),
                    ("border-radius", "3px"),
                    ("padding", "2px 6px"),
                ],
            );

        match self {
            Theme::Modern => base
                .rule(
                    Selector::Class("page".into()),
                    &[("display", "flex"), ("font-size", "11px"), ("line-height", "1.45")],
                )
                .rule(
                    Selector::Class("sidebar".into()),
                    &[
                        ("background-color", "var(--palette-0)"),
                        ("padding", "28px 20px"),
                        ("width", "32%"),
                    ],
                )
                .rule(Selector::Class("main".into()), &[("padding", "28px 28px"), ("width", "68%")])
                .rule(Selector::Class("name".into()), &[("font-size", "24px"), ("line-height", "1.2")])
                .rule(Selector::Class("section-title".into()), &[("font-size", "12px")]),

            Theme::Classic => base
                .rule(
                    Selector::Class("page".into()),
                    &[("font-size", "11.5px"), ("line-height", "1.5"), ("padding", "36px 48px")],
                )
                .rule(
                    Selector::Class("header".into()),
                    &[("margin", "0 0 18px 0"), ("text-align", "center")],
                )
                .rule(Selector::Class("name".into()), &[("font-size", "26px"), ("line-height", "1.2")])
                .rule(
                    Selector::Class("section-title".into()),
                    &[
                        ("border-color", "var(--palette-4)"),
                        ("border-width", "0 0 1px 0"),
                        ("font-size", "13px"),
                        ("padding", "0 0 2px 0"),
                    ],
                ),

            Theme::Compact => base
                .rule(
                    Selector::Class("page".into()),
                    &[("font-size", "10px"), ("line-height", "1.35")],
                )
                .rule(
                    Selector::Class("header".into()),
                    &[("background-color", "var(--palette-0)"), ("padding", "18px 24px")],
                )
                .rule(Selector::Class("body".into()), &[("padding", "16px 24px")])
                .rule(Selector::Class("name".into()), &[("font-size", "20px"), ("line-height", "1.15")])
                .rule(Selector::Class("section-title".into()), &[("font-size", "11px")])
                .rule(Selector::Class("section".into()), &[("margin", "0 0 10px 0")]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for theme in Theme::ALL {
            assert_eq!(Theme::from_id(theme.id()), Some(theme));
        }
        assert_eq!(Theme::from_id("Modern"), None);
        assert_eq!(Theme::from_id(""), None);
    }

    #[test]
    fn test_palette_overrides_by_role() {
        let palette = Theme::Modern.palette(&["".into(), "#ff0000".into()]);
        assert_eq!(palette.len(), PALETTE_ROLES);
        assert_eq!(palette[role::SURFACE], Theme::Modern.default_palette()[0]);
        assert_eq!(palette[role::ACCENT], "#ff0000");
        assert_eq!(palette[role::LINE], Theme::Modern.default_palette()[4]);
    }

    #[test]
    fn test_extra_palette_entries_are_ignored() {
        let overrides: Vec<String> = (0..8).map(|i| format!("#00000{i}")).collect();
        assert_eq!(Theme::Classic.palette(&overrides).len(), PALETTE_ROLES);
    }

    #[test]
    fn test_stylesheets_only_use_palette_colors() {
        for theme in Theme::ALL {
            for rule in theme.stylesheet().rules {
                for (property, value) in &rule.declarations {
                    if property.ends_with("color") && value != "#ffffff" {
                        assert!(value.starts_with("var(--palette-"), "{property}: {value}");
                    }
                }
            }
        }
    }
}
