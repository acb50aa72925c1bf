//! CSS custom properties generated from the config tree.

use std::fmt::Write as _;

use crate::config::{ConfigMap, ConfigTree, ConfigValue};

/// One `--name: value;` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// `fontSize` becomes `font-size`. Only a lowercase letter directly followed
/// by an uppercase one is split.
pub fn kebab_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    let mut prev_lower = false;
    for c in segment.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            out.push('-');
        }
        prev_lower = c.is_ascii_lowercase();
        out.extend(c.to_lowercase());
    }
    out
}

/// Flattens every leaf under `map` into one declaration, depth first, in
/// source order.
pub fn flatten(map: &ConfigMap) -> Vec<Declaration> {
    let mut out = Vec::new();
    flatten_into(map, &mut Vec::new(), &mut out);
    out
}

fn flatten_into(map: &ConfigMap, path: &mut Vec<String>, out: &mut Vec<Declaration>) {
    for (key, value) in map {
        path.push(kebab_case(key));
        match value {
            ConfigValue::Branch(children) => flatten_into(children, path, out),
            ConfigValue::Leaf(scalar) => out.push(Declaration {
                property: format!("--{}", path.join("-")),
                value: scalar.to_string(),
            }),
        }
        path.pop();
    }
}

/// Renders the `:root` block for `global` followed by one `.page-<id>`
/// block per page override.
pub fn generate_css(config: &ConfigTree) -> String {
    let mut css = String::from("/* Generated CSS Variables */\n");
    write_block(&mut css, ":root", &flatten(&config.global));
    css.push('\n');

    for (page, overrides) in &config.pages {
        let _ = writeln!(css, "/* Page {} specific styles */", page);
        write_block(&mut css, &format!(".page-{}", page), &flatten(overrides));
        css.push('\n');
    }

    css
}

fn write_block(css: &mut String, selector: &str, declarations: &[Declaration]) {
    let _ = writeln!(css, "{} {{", selector);
    for decl in declarations {
        let _ = writeln!(css, "  {}: {};", decl.property, decl.value);
    }
    css.push_str("}\n");
}
