//! `readme.txt` parsing.
//!
//! The format is the one used by the WordPress plugin directory:
//!
//! ```text
//! === Widget ===
//! Contributors: acme
//! Requires at least: 4.6
//! Tested up to: 6.4
//! Stable tag: 1.2.0
//!
//! One line summary.
//!
//! == Description ==
//! Long description.
//!
//! == Changelog ==
//! = 1.2.0 =
//! * Fixed things
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::markdown::render_markdown;

/// Parsed readme, with sections rendered to HTML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredReadme {
    pub name: Option<String>,
    #[serde(default)]
    pub contributors: Vec<String>,
    pub donate_link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub requires: Option<String>,
    pub tested: Option<String>,
    pub requires_php: Option<String>,
    pub stable_tag: Option<String>,
    pub license: Option<String>,
    pub short_description: Option<String>,
    /// Section key (`description`, `changelog`, ...) to HTML.
    #[serde(default)]
    pub sections: BTreeMap<String, String>,
}

/// Parse readme text into its header fields and rendered sections.
pub fn parse_readme(text: &str) -> StructuredReadme {
    let mut readme = StructuredReadme::default();
    let text = text.replace("\r\n", "\n");
    let mut lines = text.lines().peekable();

    // Title line
    while let Some(line) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            lines.next();
            continue;
        }
        if let Some(name) = strip_marker(trimmed, "===") {
            readme.name = Some(name.to_string());
            lines.next();
        }
        break;
    }

    // Header fields run until the first blank line
    while let Some(line) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("==") {
            break;
        }
        if let Some((key, value)) = trimmed.split_once(':') {
            apply_header(&mut readme, key.trim(), value.trim());
        }
        lines.next();
    }

    // Short description is everything before the first section
    let mut short = Vec::new();
    while let Some(line) = lines.peek() {
        if strip_marker(line.trim(), "==").is_some() {
            break;
        }
        short.push(line.trim());
        lines.next();
    }
    let short = short.join(" ").trim().to_string();
    if !short.is_empty() {
        readme.short_description = Some(short);
    }

    // Sections
    let mut current: Option<String> = None;
    let mut body: Vec<String> = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if let Some(title) = strip_marker(trimmed, "==") {
            flush_section(&mut readme, current.take(), &body);
            body.clear();
            current = Some(section_key(title));
        } else if let Some(sub) = strip_marker(trimmed, "=") {
            body.push(format!("#### {}", sub));
        } else {
            body.push(line.to_string());
        }
    }
    flush_section(&mut readme, current, &body);

    readme
}

fn apply_header(readme: &mut StructuredReadme, key: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let list = || {
        value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
    };

    match key.to_lowercase().as_str() {
        "contributors" => readme.contributors = list(),
        "donate link" => readme.donate_link = Some(value.to_string()),
        "tags" => readme.tags = list(),
        "requires at least" => readme.requires = Some(value.to_string()),
        "tested up to" => readme.tested = Some(value.to_string()),
        "requires php" => readme.requires_php = Some(value.to_string()),
        "stable tag" => readme.stable_tag = Some(value.to_string()),
        "license" => readme.license = Some(value.to_string()),
        _ => {}
    }
}

fn flush_section(readme: &mut StructuredReadme, key: Option<String>, body: &[String]) {
    let Some(key) = key else {
        return;
    };
    let text = body.join("\n");
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    readme.sections.insert(key, render_markdown(text));
}

/// `== Frequently Asked Questions ==` -> `frequently_asked_questions`
fn section_key(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Return the inner text of a line wrapped in exactly `marker` on both sides.
fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let inner = line.strip_prefix(marker)?.strip_suffix(marker)?;
    // `=== x ===` must not also count as `== x ==` or `= x =`
    if inner.starts_with('=') || inner.ends_with('=') {
        return None;
    }
    let inner = inner.trim();
    if inner.is_empty() { None } else { Some(inner) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const README: &str = "=== Widget ===
Contributors: acme, wile
Donate link: https://acme.test/donate
Tags: widgets, gadgets
Requires at least: 4.6
Tested up to: 6.4
Requires PHP: 7.4
Stable tag: 1.2.0
License: GPLv2

Widgets for everyone.

== Description ==
Adds *widgets*.

== Frequently Asked Questions ==
= Does it work? =
Yes.

== Changelog ==
= 1.2.0 =
* Fixed things
";

    #[test]
    fn test_parse_headers() {
        let readme = parse_readme(README);
        assert_eq!(readme.name.as_deref(), Some("Widget"));
        assert_eq!(readme.contributors, vec!["acme", "wile"]);
        assert_eq!(readme.tags, vec!["widgets", "gadgets"]);
        assert_eq!(readme.requires.as_deref(), Some("4.6"));
        assert_eq!(readme.tested.as_deref(), Some("6.4"));
        assert_eq!(readme.requires_php.as_deref(), Some("7.4"));
        assert_eq!(readme.stable_tag.as_deref(), Some("1.2.0"));
        assert_eq!(readme.short_description.as_deref(), Some("Widgets for everyone."));
    }

    #[test]
    fn test_parse_sections() {
        let readme = parse_readme(README);
        assert_eq!(readme.sections.len(), 3);
        assert!(readme.sections["description"].contains("<em>widgets</em>"));
        assert!(readme.sections["frequently_asked_questions"].contains("<h4>Does it work?</h4>"));
        assert!(readme.sections["changelog"].contains("<li>Fixed things</li>"));
    }

    #[test]
    fn test_strip_marker() {
        assert_eq!(strip_marker("=== Widget ===", "==="), Some("Widget"));
        assert_eq!(strip_marker("=== Widget ===", "=="), None);
        assert_eq!(strip_marker("== Changelog ==", "=="), Some("Changelog"));
        assert_eq!(strip_marker("= 1.0 =", "="), Some("1.0"));
        assert_eq!(strip_marker("== Changelog ==", "="), None);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_readme(""), StructuredReadme::default());
    }
}
