//! Version ordering for tags and header versions.
//!
//! Tags in the wild are rarely strict semver (`1.2`, `v2.0.1`, `3.0-beta`),
//! so versions are normalized to three numeric components before handing
//! them to `semver`. Anything that still fails to parse is compared
//! component by component.

use std::cmp::Ordering;

use semver::Version;

/// Compare two version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_lenient(a), parse_lenient(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        _ => compare_components(a, b),
    }
}

/// True if `candidate` is strictly newer than `current`.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    compare_versions(candidate, current) == Ordering::Greater
}

/// Sort versions ascending, in place.
pub fn sort_versions(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions(a, b));
}

/// Parse `1.2`, `v1.2.3`, `1.2.3-beta.1` and similar into a semver version.
fn parse_lenient(raw: &str) -> Option<Version> {
    let trimmed = raw.trim().trim_start_matches(['v', 'V']);
    if trimmed.is_empty() {
        return None;
    }

    // Split off pre-release/build suffix
    let split_at = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split_at);

    // Numeric parts go through u64 so `1.01` reads as `1.1`
    let mut parts = core
        .split('.')
        .map(|p| p.parse::<u64>().ok().map(|n| n.to_string()))
        .collect::<Option<Vec<_>>>()?;
    if parts.len() > 3 {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0".to_string());
    }

    Version::parse(&format!("{}{}", parts.join("."), suffix)).ok()
}

/// Fallback ordering: numeric components compare numerically, the rest as strings.
fn compare_components(a: &str, b: &str) -> Ordering {
    let split = |s: &str| -> Vec<String> {
        s.trim()
            .trim_start_matches(['v', 'V'])
            .split(['.', '-', '_', '+'])
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    };

    let pa = split(a);
    let pb = split(b);

    // Missing trailing components count as zero
    for i in 0..pa.len().max(pb.len()) {
        let x = pa.get(i).map_or("0", String::as_str);
        let y = pb.get(i).map_or("0", String::as_str);
        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(nx), Ok(ny)) => nx.cmp(&ny),
            // A number beats a word, so 1.0.1 > 1.0.beta
            (Ok(_), Err(_)) => Ordering::Greater,
            (Err(_), Ok(_)) => Ordering::Less,
            (Err(_), Err(_)) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}
