//! File header block parsing.
//!
//! Plugins declare metadata in a comment at the top of their main PHP file,
//! themes in `style.css`:
//!
//! ```text
//! /*
//!  * Plugin Name: Widget
//!  * Version:     1.2.0
//!  * GitLab Plugin URI: acme/widget
//!  */
//! ```

use std::collections::BTreeMap;

use regex::Regex;

use crate::types::ArtifactType;

/// Headers are only looked for in the first 8 KiB of a file.
const HEADER_SCAN_BYTES: usize = 8 * 1024;

const COMMON_HEADERS: &[&str] = &[
    "Version",
    "Description",
    "Author",
    "Author URI",
    "Text Domain",
    "Requires WP",
    "Requires PHP",
];

const PLUGIN_HEADERS: &[&str] = &[
    "Plugin Name",
    "Plugin URI",
    "Network",
    "GitLab Plugin URI",
    "GitLab Branch",
    "GitLab Enterprise",
    "GitLab CE",
    "GitHub Plugin URI",
    "GitHub Branch",
    "GitHub Enterprise",
];

const THEME_HEADERS: &[&str] = &[
    "Theme Name",
    "Theme URI",
    "Template",
    "GitLab Theme URI",
    "GitLab Branch",
    "GitLab Enterprise",
    "GitLab CE",
    "GitHub Theme URI",
    "GitHub Branch",
    "GitHub Enterprise",
];

/// Parse the header block of a plugin or theme file.
///
/// Returns only headers that are present with a non-empty value.
pub fn parse_file_headers(contents: &str, artifact: ArtifactType) -> BTreeMap<String, String> {
    let scan = truncate_at_char_boundary(contents, HEADER_SCAN_BYTES).replace('\r', "\n");

    let specific = match artifact {
        ArtifactType::Plugin => PLUGIN_HEADERS,
        ArtifactType::Theme => THEME_HEADERS,
    };

    let mut headers = BTreeMap::new();
    for name in specific.iter().chain(COMMON_HEADERS) {
        if let Some(value) = find_header(&scan, name) {
            headers.insert((*name).to_string(), value);
        }
    }
    headers
}

fn find_header(contents: &str, name: &str) -> Option<String> {
    let pattern = format!(r"(?mi)^[ \t/*#@]*{}:(.*)$", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(contents)?.get(1)?.as_str();
    let value = cleanup_comment_close(value);
    if value.is_empty() { None } else { Some(value) }
}

/// Strip a trailing `*/` or `?>` left on the header line.
fn cleanup_comment_close(value: &str) -> String {
    let mut value = value.trim();
    for close in ["*/", "?>"] {
        if let Some(idx) = value.find(close) {
            value = value[..idx].trim();
        }
    }
    value.to_string()
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLUGIN_FILE: &str = r#"<?php
/*
 * Plugin Name:       Widget
 * Plugin URI:        https://gitlab.com/acme/widget
 * Version:           1.2.0
 * Author:            Acme
 * GitLab Plugin URI: https://gitlab.com/acme/widget
 * GitLab Branch:     develop
 * Requires PHP:      7.4
 */
"#;

    #[test]
    fn test_plugin_headers() {
        let headers = parse_file_headers(PLUGIN_FILE, ArtifactType::Plugin);
        assert_eq!(headers.get("Plugin Name").unwrap(), "Widget");
        assert_eq!(headers.get("Version").unwrap(), "1.2.0");
        assert_eq!(headers.get("GitLab Branch").unwrap(), "develop");
        assert_eq!(headers.get("Requires PHP").unwrap(), "7.4");
        assert!(!headers.contains_key("Description"));
        assert!(!headers.contains_key("Theme Name"));
    }

    #[test]
    fn test_theme_headers() {
        let css = "/*\nTheme Name: Sage\nVersion: 8.4.2 */\nbody {}";
        let headers = parse_file_headers(css, ArtifactType::Theme);
        assert_eq!(headers.get("Theme Name").unwrap(), "Sage");
        assert_eq!(headers.get("Version").unwrap(), "8.4.2");
    }

    #[test]
    fn test_headers_beyond_scan_window_ignored() {
        let mut contents = "x".repeat(HEADER_SCAN_BYTES + 10);
        contents.push_str("\nVersion: 9.9.9\n");
        let headers = parse_file_headers(&contents, ArtifactType::Plugin);
        assert!(headers.is_empty());
    }
}
