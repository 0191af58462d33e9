//! Box layout over a baked snapshot.
//!
//! Supports only what the built-in themes use: block stacking, single-axis
//! flex rows that wrap, px/%/em lengths, 1–4 value box shorthands, and greedy
//! word wrapping measured with the static metric tables. Margins do not
//! collapse. Flex items without a width take their max-content width, and
//! items with an auto height stretch to the row.

use crate::export::font_metrics::{FontClass, FontMetrics};
use crate::export::snapshot::{parse_px, Snapshot};
use crate::render::tree::VisualNode;

/// Slack added to max-content widths so text measured at its own width never re-wraps.
const INTRINSIC_SLACK: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f32),
    Percent(f32),
    Auto,
}

impl Length {
    pub fn parse(value: &str, font_px: f32) -> Length {
        let value = value.trim();
        if let Some(px) = parse_px(value) {
            Length::Px(px)
        } else if let Some(em) = value.strip_suffix("em").and_then(|v| v.parse::<f32>().ok()) {
            Length::Px(em * font_px)
        } else if let Some(pct) = value.strip_suffix('%').and_then(|v| v.parse::<f32>().ok()) {
            Length::Percent(pct)
        } else if let Ok(bare) = value.parse::<f32>() {
            // Only `0` is meaningful unitless, but treat any bare number as px.
            Length::Px(bare)
        } else {
            Length::Auto
        }
    }

    /// Resolves against `basis`; `Auto` becomes `None`.
    pub fn resolve(self, basis: f32) -> Option<f32> {
        match self {
            Length::Px(px) => Some(px),
            Length::Percent(pct) => Some(basis * pct / 100.0),
            Length::Auto => None,
        }
    }
}

/// Parses a 1–4 value shorthand (`padding`, `margin`, `border-width`).
pub fn parse_edges(value: &str, basis: f32, font_px: f32) -> Edges {
    let parts: Vec<f32> = value
        .split_whitespace()
        .map(|p| Length::parse(p, font_px).resolve(basis).unwrap_or(0.0))
        .collect();
    let (top, right, bottom, left) = match parts.as_slice() {
        [] => (0.0, 0.0, 0.0, 0.0),
        [a] => (*a, *a, *a, *a),
        [v, h] => (*v, *h, *v, *h),
        [t, h, b] => (*t, *h, *b, *h),
        [t, r, b, l, ..] => (*t, *r, *b, *l),
    };
    Edges {
        top,
        right,
        bottom,
        left,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub color: String,
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f32,
    pub baseline: f32,
    pub text: String,
}

/// A positioned border box. Coordinates are absolute page pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub tag: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub margin: Edges,
    pub border: Edges,
    pub border_color: String,
    pub radius: f32,
    pub background: Option<String>,
    pub text_style: TextStyle,
    pub lines: Vec<TextLine>,
    /// `break-inside: avoid`.
    pub avoid_break: bool,
    pub children: Vec<LayoutBox>,
}

impl LayoutBox {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    fn outer_bottom(&self) -> f32 {
        self.bottom() + self.margin.bottom
    }

    fn outer_height(&self) -> f32 {
        self.margin.top + self.height + self.margin.bottom
    }

    fn outer_width(&self) -> f32 {
        self.margin.left + self.width + self.margin.right
    }

    /// Vertical extents of every box that must not be split across pages.
    pub fn avoid_ranges(&self) -> Vec<(f32, f32)> {
        let mut out = Vec::new();
        self.collect_avoid(&mut out);
        out
    }

    fn collect_avoid(&self, out: &mut Vec<(f32, f32)>) {
        if self.avoid_break {
            out.push((self.y, self.bottom()));
        }
        for child in &self.children {
            child.collect_avoid(out);
        }
    }

    /// All text lines in the subtree, in paint order.
    pub fn all_lines(&self) -> Vec<&TextLine> {
        let mut out: Vec<&TextLine> = self.lines.iter().collect();
        for child in &self.children {
            out.extend(child.all_lines());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub root: LayoutBox,
    pub width: f32,
    pub height: f32,
}

/// Lays out `snapshot` in a viewport `viewport_width` pixels wide.
pub fn layout(snapshot: &Snapshot, viewport_width: f32) -> PageLayout {
    let root = layout_node(&snapshot.root, 0.0, 0.0, viewport_width, None);
    let height = root.outer_bottom().max(0.0);
    PageLayout {
        width: viewport_width.max(root.x + root.width),
        height,
        root,
    }
}

fn prop<'a>(node: &'a VisualNode, key: &str) -> &'a str {
    node.style.get(key).map(String::as_str).unwrap_or("")
}

fn font_px(node: &VisualNode) -> f32 {
    parse_px(prop(node, "font-size")).unwrap_or(16.0)
}

fn line_height(node: &VisualNode, font: f32) -> f32 {
    let raw = prop(node, "line-height").trim();
    if raw == "normal" || raw.is_empty() {
        return font * 1.2;
    }
    match Length::parse(raw, font) {
        // A bare number is a multiplier here, not px.
        Length::Px(_) if raw.parse::<f32>().is_ok() => raw.parse::<f32>().unwrap_or(1.2) * font,
        Length::Px(px) => px,
        Length::Percent(pct) => font * pct / 100.0,
        Length::Auto => font * 1.2,
    }
}

fn font_weight(node: &VisualNode) -> u16 {
    prop(node, "font-weight").trim().parse().unwrap_or(400)
}

fn metrics(node: &VisualNode) -> FontMetrics {
    FontMetrics::new(
        FontClass::from_family(prop(node, "font-family")),
        font_px(node),
        font_weight(node) >= 600,
    )
}

fn transformed_text(node: &VisualNode) -> Option<String> {
    let text = node.text.as_deref()?.trim();
    if text.is_empty() {
        return None;
    }
    Some(match prop(node, "text-transform").trim() {
        "uppercase" => text.to_uppercase(),
        "lowercase" => text.to_lowercase(),
        "capitalize" => text
            .split(' ')
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
        _ => text.to_string(),
    })
}

fn text_align(node: &VisualNode) -> TextAlign {
    match prop(node, "text-align").trim() {
        "center" => TextAlign::Center,
        "right" | "end" => TextAlign::Right,
        _ => TextAlign::Left,
    }
}

fn visible_children(node: &VisualNode) -> impl Iterator<Item = &VisualNode> {
    node.children
        .iter()
        .filter(|c| prop(c, "display").trim() != "none")
}

fn is_flex(node: &VisualNode) -> bool {
    matches!(prop(node, "display").trim(), "flex" | "inline-flex")
}

fn background(node: &VisualNode) -> Option<String> {
    let value = prop(node, "background-color").trim();
    match value {
        "" | "transparent" | "none" => None,
        v if v.starts_with("rgba(") && v.replace(' ', "").ends_with(",0)") => None,
        v => Some(v.to_string()),
    }
}

/// Max-content border-box width.
fn intrinsic_width(node: &VisualNode) -> f32 {
    let font = font_px(node);
    let padding = parse_edges(prop(node, "padding"), 0.0, font);
    let border = parse_edges(prop(node, "border-width"), 0.0, font);

    if let Length::Px(px) = Length::parse(prop(node, "width"), font) {
        return px;
    }

    let text = transformed_text(node)
        .map(|t| metrics(node).measure_str(&t))
        .unwrap_or(0.0);

    let children: Vec<f32> = visible_children(node)
        .map(|c| {
            let m = parse_edges(prop(c, "margin"), 0.0, font_px(c));
            intrinsic_width(c) + m.horizontal()
        })
        .collect();
    let content = if is_flex(node) {
        let gap = Length::parse(prop(node, "gap"), font).resolve(0.0).unwrap_or(0.0);
        children.iter().sum::<f32>() + gap * children.len().saturating_sub(1) as f32
    } else {
        children.iter().copied().fold(0.0, f32::max)
    };

    text.max(content) + padding.horizontal() + border.horizontal() + INTRINSIC_SLACK
}

/// Lays out `node` with its margin box starting at (`x`, `y`).
fn layout_node(
    node: &VisualNode,
    x: f32,
    y: f32,
    available: f32,
    forced_width: Option<f32>,
) -> LayoutBox {
    let font = font_px(node);
    let margin = parse_edges(prop(node, "margin"), available, font);
    let border = parse_edges(prop(node, "border-width"), available, font);
    let padding = parse_edges(prop(node, "padding"), available, font);

    let width = forced_width
        .or_else(|| Length::parse(prop(node, "width"), font).resolve(available))
        .unwrap_or(available - margin.horizontal())
        .max(0.0);

    let bx = x + margin.left;
    let by = y + margin.top;
    let content_x = bx + border.left + padding.left;
    let content_w = (width - border.horizontal() - padding.horizontal()).max(0.0);
    let mut cursor = by + border.top + padding.top;

    let metrics = metrics(node);
    let align = text_align(node);
    let line_h = line_height(node, font);
    let mut lines = Vec::new();
    if let Some(text) = transformed_text(node) {
        for line in metrics.wrap(&text, content_w) {
            let w = metrics.measure_str(&line);
            let offset = match align {
                TextAlign::Left => 0.0,
                TextAlign::Center => ((content_w - w) / 2.0).max(0.0),
                TextAlign::Right => (content_w - w).max(0.0),
            };
            lines.push(TextLine {
                x: content_x + offset,
                baseline: cursor + (line_h - font) / 2.0 + font * 0.8,
                text: line,
            });
            cursor += line_h;
        }
    }

    let children = if is_flex(node) {
        let gap = Length::parse(prop(node, "gap"), font)
            .resolve(content_w)
            .unwrap_or(0.0);
        let (children, bottom) = layout_row(node, content_x, cursor, content_w, gap);
        cursor = bottom;
        children
    } else {
        let mut children = Vec::new();
        for child in visible_children(node) {
            let laid = layout_node(child, content_x, cursor, content_w, None);
            cursor = laid.outer_bottom();
            children.push(laid);
        }
        children
    };

    let auto_height = cursor + padding.bottom + border.bottom - by;
    let height = match Length::parse(prop(node, "height"), font) {
        Length::Px(px) => px,
        _ => auto_height,
    }
    .max(0.0);

    LayoutBox {
        tag: node.tag.clone(),
        x: bx,
        y: by,
        width,
        height,
        margin,
        border,
        border_color: prop(node, "border-color").trim().to_string(),
        radius: parse_px(prop(node, "border-radius")).unwrap_or(0.0),
        background: background(node),
        text_style: TextStyle {
            color: prop(node, "color").trim().to_string(),
            font_family: prop(node, "font-family").trim().to_string(),
            font_size: font,
            font_weight: font_weight(node),
        },
        lines,
        avoid_break: prop(node, "break-inside").trim() == "avoid",
        children,
    }
}

/// Packs flex items into rows, wrapping when the next item would overflow.
fn layout_row(
    node: &VisualNode,
    content_x: f32,
    top: f32,
    content_w: f32,
    gap: f32,
) -> (Vec<LayoutBox>, f32) {
    let mut rows: Vec<Vec<(&VisualNode, f32)>> = Vec::new();
    let mut current: Vec<(&VisualNode, f32)> = Vec::new();
    let mut used = 0.0_f32;

    for child in visible_children(node) {
        let font = font_px(child);
        let margin = parse_edges(prop(child, "margin"), content_w, font);
        let width = Length::parse(prop(child, "width"), font)
            .resolve(content_w)
            .unwrap_or_else(|| intrinsic_width(child).min(content_w - margin.horizontal()))
            .max(0.0);
        let outer = width + margin.horizontal();

        let needed = if current.is_empty() { outer } else { used + gap + outer };
        if !current.is_empty() && needed > content_w + INTRINSIC_SLACK {
            rows.push(std::mem::take(&mut current));
            used = outer;
        } else {
            used = needed;
        }
        current.push((child, width));
    }
    if !current.is_empty() {
        rows.push(current);
    }

    let mut boxes = Vec::new();
    let mut row_top = top;
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            row_top += gap;
        }
        let mut x = content_x;
        let mut laid: Vec<LayoutBox> = Vec::with_capacity(row.len());
        for (child, width) in row {
            let b = layout_node(child, x, row_top, content_w, Some(*width));
            x += b.outer_width() + gap;
            laid.push(b);
        }
        let row_height = laid.iter().map(LayoutBox::outer_height).fold(0.0, f32::max);
        for (b, (child, _)) in laid.iter_mut().zip(row) {
            let auto = matches!(
                Length::parse(prop(child, "height"), font_px(child)),
                Length::Auto
            );
            if auto {
                b.height = b.height.max(row_height - b.margin.vertical());
            }
        }
        row_top += row_height;
        boxes.extend(laid);
    }

    (boxes, row_top)
}
