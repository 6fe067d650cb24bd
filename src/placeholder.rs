//! `{{key}}` substitution for template strings.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Flat key → value map used to fill a template.
pub type Placeholders = HashMap<String, String>;

fn placeholder_pattern() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("valid placeholder regex")
    })
}

/// Replace every `{{key}}` (inner whitespace allowed) with its value.
/// Unknown keys become empty strings.
pub fn interpolate(text: &str, values: &Placeholders) -> String {
    substitute(text, values, str::to_string)
}

/// Like [`interpolate`], for block markup: values are inserted as text, so
/// `<`, `>` and `&` inside them are escaped.
pub fn interpolate_markup(text: &str, values: &Placeholders) -> String {
    substitute(text, values, escape_markup)
}

/// Escape the characters block markup would otherwise read as structure.
pub fn escape_markup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn substitute(text: &str, values: &Placeholders, render: fn(&str) -> String) -> String {
    placeholder_pattern()
        .replace_all(text, |caps: &Captures| {
            let key = &caps[1];
            match values.get(key) {
                Some(value) => render(value),
                None => {
                    log::debug!("Unknown placeholder '{}'", key);
                    String::new()
                }
            }
        })
        .into_owned()
}
