//! The visual tree a template produces, and the theme stylesheet it is styled by.
//!
//! Everything here uses ordered maps so the serialized markup is byte-identical
//! for identical input.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

/// Property name → value, in deterministic order.
pub type StyleMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisualNode {
    pub tag: String,
    pub classes: Vec<String>,
    /// Inline style. Custom properties (`--name`) live here too and inherit.
    pub style: StyleMap,
    pub text: Option<String>,
    pub children: Vec<VisualNode>,
}

impl VisualNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn style(mut self, property: &str, value: impl Into<String>) -> Self {
        self.style.insert(property.to_string(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: VisualNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VisualNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Depth-first search for the first node carrying `class`.
    pub fn find_class(&self, class: &str) -> Option<&VisualNode> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_class(class))
    }

    /// Every text fragment in document order.
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(text) = &self.text {
            out.push(text);
        }
        for child in &self.children {
            child.collect_texts(out);
        }
    }

    fn write_markup(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}<{}", self.tag);
        if !self.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&self.classes.join(" ")));
        }
        if !self.style.is_empty() {
            let _ = write!(out, " style=\"{}\"", escape(&declarations(&self.style)));
        }
        out.push('>');

        if self.children.is_empty() {
            if let Some(text) = &self.text {
                out.push_str(&escape(text));
            }
            let _ = writeln!(out, "</{}>", self.tag);
            return;
        }

        out.push('\n');
        if let Some(text) = &self.text {
            let _ = writeln!(out, "{indent}  {}", escape(text));
        }
        for child in &self.children {
            child.write_markup(out, depth + 1);
        }
        let _ = writeln!(out, "{indent}</{}>", self.tag);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Selector {
    Universal,
    Tag(String),
    Class(String),
}

impl Selector {
    pub fn matches(&self, node: &VisualNode) -> bool {
        match self {
            Selector::Universal => true,
            Selector::Tag(tag) => node.tag == *tag,
            Selector::Class(class) => node.has_class(class),
        }
    }

    fn css(&self) -> String {
        match self {
            Selector::Universal => "*".to_string(),
            Selector::Tag(tag) => tag.clone(),
            Selector::Class(class) => format!(".{class}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub selector: Selector,
    pub declarations: StyleMap,
    /// Important rules beat inline styles.
    pub important: bool,
}

impl Rule {
    pub fn new(selector: Selector, declarations: &[(&str, &str)]) -> Self {
        Self {
            selector,
            declarations: declarations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            important: false,
        }
    }

    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }

    pub fn to_css(&self) -> String {
        let suffix = if self.important { " !important" } else { "" };
        let body: Vec<String> = self
            .declarations
            .iter()
            .map(|(k, v)| format!("{k}: {v}{suffix}"))
            .collect();
        format!("{} {{ {} }}", self.selector.css(), body.join("; "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn rule(mut self, selector: Selector, declarations: &[(&str, &str)]) -> Self {
        self.rules.push(Rule::new(selector, declarations));
        self
    }

    pub fn to_css(&self) -> String {
        self.rules
            .iter()
            .map(Rule::to_css)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A rendered document, ready to mount on a render target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderTree {
    pub template: String,
    /// Display scale relative to the 794 px logical page.
    pub scale: f32,
    pub stylesheet: Stylesheet,
    pub root: VisualNode,
}

impl RenderTree {
    /// Serializes the stylesheet and tree. Identical input yields identical bytes.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<style>\n{}\n</style>", self.stylesheet.to_css());
        self.root.write_markup(&mut out, 0);
        out
    }
}

pub(crate) fn declarations(style: &StyleMap) -> String {
    style
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_escapes_text_and_attributes() {
        let node = VisualNode::new("p")
            .class("summary")
            .style("color", "var(--palette-2)")
            .text("R&D <lead> \"ops\"");
        let mut out = String::new();
        node.write_markup(&mut out, 0);
        assert_eq!(
            out,
            "<p class=\"summary\" style=\"color: var(--palette-2)\">R&amp;D &lt;lead&gt; &quot;ops&quot;</p>\n"
        );
    }

    #[test]
    fn test_selectors_match_tag_and_class() {
        let node = VisualNode::new("h2").class("section-title");
        assert!(Selector::Universal.matches(&node));
        assert!(Selector::Tag("h2".into()).matches(&node));
        assert!(!Selector::Tag("p".into()).matches(&node));
        assert!(Selector::Class("section-title".into()).matches(&node));
    }

    #[test]
    fn test_important_rule_css() {
        let rule = Rule::new(Selector::Universal, &[("color", "#000")]).important();
        assert_eq!(rule.to_css(), "* { color: #000 !important }");
    }

    #[test]
    fn test_find_class_and_texts() {
        let tree = VisualNode::new("div")
            .child(VisualNode::new("h1").class("name").text("Jane"))
            .child(VisualNode::new("p").text("Engineer"));
        assert_eq!(tree.find_class("name").and_then(|n| n.text.as_deref()), Some("Jane"));
        assert_eq!(tree.texts(), vec!["Jane", "Engineer"]);
    }
}
