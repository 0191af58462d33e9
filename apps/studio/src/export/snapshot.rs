//! Detached, style-attributed copy of a render target.
//!
//! `capture` walks the visual tree and bakes the computed value of every
//! supported property into each node's inline style, so later stages (color
//! normalization, layout, paint) never consult a stylesheet again.
//!
//! Cascade, lowest to highest: inherited or initial value, universal rules,
//! tag rules, class rules, inline style, important overrides.

use std::collections::BTreeMap;

use crate::export::color;
use crate::render::tree::{RenderTree, Rule, Selector, StyleMap, VisualNode};

/// Properties baked into every snapshot node, with their initial values.
pub const PROPERTIES: &[(&str, &str)] = &[
    ("background-color", "transparent"),
    ("border-color", "currentcolor"),
    ("border-radius", "0"),
    ("border-width", "0"),
    ("break-inside", "auto"),
    ("color", "#000000"),
    ("display", "block"),
    ("font-family", "sans-serif"),
    ("font-size", "16px"),
    ("font-weight", "400"),
    ("gap", "0"),
    ("height", "auto"),
    ("line-height", "1.2"),
    ("margin", "0"),
    ("padding", "0"),
    ("text-align", "left"),
    ("text-transform", "none"),
    ("width", "auto"),
];

const INHERITED: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "line-height",
    "text-align",
    "text-transform",
];

/// Nesting limit for `var()` references.
const MAX_VAR_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub root: VisualNode,
}

impl Snapshot {
    /// Rewrites every `oklch()` value in the tree.
    pub fn normalize_colors(&mut self) {
        fn walk(node: &mut VisualNode) {
            for value in node.style.values_mut() {
                if color::contains_oklch(value) {
                    *value = color::normalize(value);
                }
            }
            node.children.iter_mut().for_each(walk);
        }
        walk(&mut self.root);
    }

    /// Forces a style value on the root only.
    pub fn set_root_style(&mut self, property: &str, value: &str) {
        self.root
            .style
            .insert(property.to_string(), value.to_string());
    }

    /// Every baked value in the tree, depth first.
    pub fn style_values(&self) -> Vec<&str> {
        fn walk<'a>(node: &'a VisualNode, out: &mut Vec<&'a str>) {
            out.extend(node.style.values().map(String::as_str));
            for child in &node.children {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }
}

#[derive(Clone)]
struct Computed {
    values: StyleMap,
    custom: BTreeMap<String, String>,
}

impl Computed {
    fn initial() -> Self {
        Self {
            values: PROPERTIES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            custom: BTreeMap::new(),
        }
    }

    fn inherit(parent: &Computed) -> Self {
        let mut next = Computed::initial();
        for key in INHERITED {
            if let Some(value) = parent.values.get(*key) {
                next.values.insert(key.to_string(), value.clone());
            }
        }
        next.custom = parent.custom.clone();
        next
    }
}

/// Captures `tree` with `overrides` applied on top of everything else.
pub fn capture(tree: &RenderTree, overrides: &[Rule]) -> Snapshot {
    let rules = &tree.stylesheet.rules;
    let root_parent = Computed::initial();
    Snapshot {
        root: capture_node(&tree.root, &root_parent, rules, overrides),
    }
}

fn tier(selector: &Selector) -> u8 {
    match selector {
        Selector::Universal => 0,
        Selector::Tag(_) => 1,
        Selector::Class(_) => 2,
    }
}

fn capture_node(
    node: &VisualNode,
    parent: &Computed,
    rules: &[Rule],
    overrides: &[Rule],
) -> VisualNode {
    // Specified declarations in cascade order; later entries win.
    let mut matched: Vec<&Rule> = rules
        .iter()
        .filter(|r| !r.important && r.selector.matches(node))
        .collect();
    matched.sort_by_key(|r| tier(&r.selector));

    let mut specified: Vec<(&str, &str)> = Vec::new();
    for rule in matched {
        specified.extend(rule.declarations.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    specified.extend(node.style.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    for rule in rules
        .iter()
        .chain(overrides)
        .filter(|r| r.important && r.selector.matches(node))
    {
        specified.extend(rule.declarations.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    let mut computed = Computed::inherit(parent);

    // Custom properties first so every other value can reference them.
    for (name, value) in specified.iter().filter(|(k, _)| k.starts_with("--")) {
        let resolved = resolve_vars(value, &computed.custom, 0);
        if let Some(resolved) = resolved {
            computed.custom.insert(name.to_string(), resolved);
        }
    }

    for (name, value) in specified.iter().filter(|(k, _)| !k.starts_with("--")) {
        if !computed.values.contains_key(*name) {
            continue;
        }
        let Some(resolved) = resolve_vars(value, &computed.custom, 0) else {
            continue;
        };
        let resolved = match *name {
            "font-size" => resolve_font_size(&resolved, parent),
            "font-weight" => resolve_font_weight(&resolved),
            _ => resolved,
        };
        computed.values.insert(name.to_string(), resolved);
    }

    resolve_current_color(&mut computed, parent);

    VisualNode {
        tag: node.tag.clone(),
        classes: node.classes.clone(),
        style: computed.values.clone(),
        text: node.text.clone(),
        children: node
            .children
            .iter()
            .map(|child| capture_node(child, &computed, rules, overrides))
            .collect(),
    }
}

fn resolve_current_color(computed: &mut Computed, parent: &Computed) {
    let parent_color = parent
        .values
        .get("color")
        .cloned()
        .unwrap_or_else(|| "#000000".to_string());
    if computed
        .values
        .get("color")
        .is_some_and(|c| c.eq_ignore_ascii_case("currentcolor"))
    {
        computed.values.insert("color".to_string(), parent_color);
    }
    let own = computed
        .values
        .get("color")
        .cloned()
        .unwrap_or_else(|| "#000000".to_string());
    for value in computed.values.values_mut() {
        if value.eq_ignore_ascii_case("currentcolor") {
            *value = own.clone();
        }
    }
}

/// Substitutes every `var(--name[, fallback])`. `None` means the value is
/// invalid at computed-value time and the declaration is dropped.
fn resolve_vars(value: &str, custom: &BTreeMap<String, String>, depth: usize) -> Option<String> {
    if depth > MAX_VAR_DEPTH {
        return None;
    }
    let Some(start) = value.find("var(") else {
        return Some(value.to_string());
    };

    let open = start + "var(".len();
    let mut level = 1usize;
    let mut close = None;
    let mut comma = None;
    for (i, c) in value[open..].char_indices() {
        match c {
            '(' => level += 1,
            ')' => {
                level -= 1;
                if level == 0 {
                    close = Some(open + i);
                    break;
                }
            }
            ',' if level == 1 && comma.is_none() => comma = Some(open + i),
            _ => {}
        }
    }
    let close = close?;

    let name_end = comma.unwrap_or(close);
    let name = value[open..name_end].trim();
    let replacement = match custom.get(name) {
        Some(v) => v.clone(),
        None => {
            let fallback = comma.map(|c| value[c + 1..close].trim())?;
            resolve_vars(fallback, custom, depth + 1)?
        }
    };

    let rebuilt = format!("{}{}{}", &value[..start], replacement, &value[close + 1..]);
    resolve_vars(&rebuilt, custom, depth + 1)
}

pub(crate) fn parse_px(value: &str) -> Option<f32> {
    value
        .trim()
        .strip_suffix("px")
        .and_then(|v| v.trim().parse::<f32>().ok())
}

fn resolve_font_size(value: &str, parent: &Computed) -> String {
    let parent_px = parent
        .values
        .get("font-size")
        .and_then(|v| parse_px(v))
        .unwrap_or(16.0);
    let value = value.trim();
    let px = if let Some(px) = parse_px(value) {
        px
    } else if let Some(em) = value.strip_suffix("em").and_then(|v| v.parse::<f32>().ok()) {
        em * parent_px
    } else if let Some(pct) = value.strip_suffix('%').and_then(|v| v.parse::<f32>().ok()) {
        pct / 100.0 * parent_px
    } else {
        parent_px
    };
    format!("{px}px")
}

fn resolve_font_weight(value: &str) -> String {
    match value.trim() {
        "normal" => "400".to_string(),
        "bold" => "700".to_string(),
        other => other.to_string(),
    }
}
