//! Layout → SVG markup for one page window.

use std::fmt::Write as _;

use crate::export::layout::{LayoutBox, PageLayout};

/// The vertical slice of the layout a page shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageWindow {
    pub top: f32,
    pub height: f32,
}

impl PageWindow {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    fn intersects(&self, top: f32, bottom: f32) -> bool {
        bottom > self.top && top < self.bottom()
    }
}

/// Paints the `window` slice of `layout` at the top of an opaque white page
/// `width` × `page_height` pixels. Content outside the slice is clipped.
pub fn paint(layout: &PageLayout, window: PageWindow, width: f32, page_height: f32) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.2}" height="{h:.2}" viewBox="0 {top:.2} {w:.2} {h:.2}">"#,
        w = width,
        h = page_height,
        top = window.top,
    );
    let _ = writeln!(
        svg,
        r##"<rect x="0" y="{top:.2}" width="{w:.2}" height="{h:.2}" fill="#ffffff"/>"##,
        w = width,
        h = page_height,
        top = window.top,
    );
    let _ = writeln!(
        svg,
        r#"<clipPath id="slice"><rect x="0" y="{top:.2}" width="{w:.2}" height="{h:.2}"/></clipPath>"#,
        w = width,
        h = window.height,
        top = window.top,
    );
    svg.push_str("<g clip-path=\"url(#slice)\">\n");
    paint_box(&mut svg, &layout.root, window);
    svg.push_str("</g>\n</svg>\n");
    svg
}

fn paint_box(svg: &mut String, b: &LayoutBox, window: PageWindow) {
    let visible = window.intersects(b.y, b.bottom());
    if !visible && b.children.is_empty() {
        return;
    }

    if let Some(fill) = b.background.as_ref().filter(|_| visible) {
        if b.width > 0.0 && b.height > 0.0 {
            let _ = writeln!(
                svg,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{}"/>"#,
                b.x,
                b.y,
                b.width,
                b.height,
                b.radius,
                attr(fill)
            );
        }
    }

    if visible
        && !b.border.is_zero()
        && !b.border_color.is_empty()
        && b.border_color != "transparent"
    {
        let color = attr(&b.border_color);
        let sides = [
            (b.x, b.y, b.width, b.border.top),
            (b.x + b.width - b.border.right, b.y, b.border.right, b.height),
            (b.x, b.bottom() - b.border.bottom, b.width, b.border.bottom),
            (b.x, b.y, b.border.left, b.height),
        ];
        for (x, y, w, h) in sides {
            if w > 0.0 && h > 0.0 {
                let _ = writeln!(
                    svg,
                    r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{color}"/>"#
                );
            }
        }
    }

    let style = &b.text_style;
    for line in &b.lines {
        let top = line.baseline - style.font_size;
        if !window.intersects(top, line.baseline + style.font_size * 0.25) {
            continue;
        }
        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" font-weight="{}" fill="{}" xml:space="preserve">{}</text>"#,
            line.x,
            line.baseline,
            attr(&style.font_family),
            style.font_size,
            style.font_weight,
            attr(&style.color),
            text(&line.text)
        );
    }

    for child in &b.children {
        paint_box(svg, child, window);
    }
}

fn text(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn attr(raw: &str) -> String {
    text(raw).replace('"', "&quot;")
}
