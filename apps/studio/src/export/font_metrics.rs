//! Static font-metric tables for the families the themes use.
//!
//! Character widths are in em units (relative to font size). This is an
//! approximation: the real glyph advances live in whatever font the
//! rasterizer resolves, but line breaks only need to land on the same word
//! most of the time, and a rare one-word difference is invisible on a resume.
//! The table covers ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

/// Broad family classes. Every CSS `font-family` stack maps onto one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontClass {
    /// Humanist sans-serif (Inter, Helvetica, Arial).
    Sans,
    /// Book serif (Georgia, Times).
    Serif,
    /// Condensed sans-serif (Roboto Condensed, Arial Narrow).
    Condensed,
}

impl FontClass {
    /// Classifies a CSS font stack by its first recognizable family.
    pub fn from_family(stack: &str) -> FontClass {
        let stack = stack.to_ascii_lowercase();
        if stack.contains("condensed") || stack.contains("narrow") {
            FontClass::Condensed
        } else if stack.contains("serif") && !stack.contains("sans-serif")
            || stack.contains("georgia")
            || stack.contains("times")
        {
            FontClass::Serif
        } else {
            FontClass::Sans
        }
    }

    /// Width relative to the sans table.
    fn scale(self) -> f32 {
        match self {
            FontClass::Sans => 1.0,
            FontClass::Serif => 0.92,
            FontClass::Condensed => 0.82,
        }
    }

    /// Generic family name handed to the rasterizer as the final fallback.
    pub fn generic(self) -> &'static str {
        match self {
            FontClass::Sans | FontClass::Condensed => "sans-serif",
            FontClass::Serif => "serif",
        }
    }
}

/// Bold glyphs run roughly this much wider than regular ones.
const BOLD_SCALE: f32 = 1.06;

/// Inter advance widths at 1em.
///
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
#[rustfmt::skip]
static SANS_WIDTHS: [f32; 95] = [
    // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
    0.25, 0.30, 0.38, 0.56, 0.56, 0.89, 0.67, 0.22, 0.33, 0.33, 0.39, 0.59, 0.28, 0.33, 0.28, 0.31,
    // 0     1     2     3     4     5     6     7     8     9
    0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56,
    // :     ;     <     =     >     ?     @
    0.28, 0.28, 0.59, 0.59, 0.59, 0.50, 1.02,
    // A     B     C     D     E     F     G     H     I     J     K     L     M
    0.67, 0.61, 0.61, 0.67, 0.56, 0.50, 0.67, 0.67, 0.25, 0.39, 0.61, 0.53, 0.78,
    // N     O     P     Q     R     S     T     U     V     W     X     Y     Z
    0.67, 0.72, 0.56, 0.72, 0.61, 0.50, 0.56, 0.67, 0.67, 0.89, 0.61, 0.61, 0.56,
    // [     \     ]     ^     _     `
    0.28, 0.31, 0.28, 0.47, 0.56, 0.34,
    // a     b     c     d     e     f     g     h     i     j     k     l     m
    0.56, 0.56, 0.50, 0.56, 0.56, 0.31, 0.56, 0.56, 0.22, 0.22, 0.53, 0.22, 0.83,
    // n     o     p     q     r     s     t     u     v     w     x     y     z
    0.56, 0.56, 0.56, 0.56, 0.33, 0.44, 0.39, 0.56, 0.50, 0.72, 0.50, 0.50, 0.44,
    // {     |     }     ~
    0.33, 0.26, 0.33, 0.59,
];

/// Fallback width for non-ASCII characters.
const AVERAGE_WIDTH: f32 = 0.52;

/// Metrics for one resolved font: class, pixel size, weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub class: FontClass,
    pub size_px: f32,
    pub bold: bool,
}

impl FontMetrics {
    pub fn new(class: FontClass, size_px: f32, bold: bool) -> Self {
        Self {
            class,
            size_px,
            bold,
        }
    }

    fn factor(&self) -> f32 {
        let weight = if self.bold { BOLD_SCALE } else { 1.0 };
        self.size_px * self.class.scale() * weight
    }

    /// Rendered width of `s` in pixels.
    pub fn measure_str(&self, s: &str) -> f32 {
        let ems: f32 = s
            .chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    SANS_WIDTHS[code - 32]
                } else {
                    AVERAGE_WIDTH
                }
            })
            .sum();
        ems * self.factor()
    }

    pub fn space_width(&self) -> f32 {
        SANS_WIDTHS[0] * self.factor()
    }

    /// Greedy word wrap at `max_width` pixels. A word wider than the line
    /// gets a line of its own rather than being split.
    pub fn wrap(&self, text: &str, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;
        let space = self.space_width();

        for word in text.split_whitespace() {
            let word_w = self.measure_str(word);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + space + word_w > max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_w;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}
