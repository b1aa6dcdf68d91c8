//! Provider capability trait and the payload shapes shared by providers.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde_json::Value;
use url::form_urlencoded;

use crate::types::RepoDescriptor;

use super::error::RemoteError;

/// Logical API operation an endpoint is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Projects visible to the token.
    Projects,
    /// Repository metadata.
    Meta,
    Tags,
    Branches,
    /// Content of a file in the repo.
    File(String),
    /// Content of the changelog file.
    Changes(String),
    /// Content of `readme.txt`.
    Readme,
}

impl Operation {
    /// Content reads are pinned to the tracked branch.
    pub fn needs_ref(&self) -> bool {
        matches!(
            self,
            Operation::File(_) | Operation::Changes(_) | Operation::Readme
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Projects => "projects",
            Operation::Meta => "meta",
            Operation::Tags => "tags",
            Operation::Branches => "branches",
            Operation::File(_) => "file",
            Operation::Changes(_) => "changes",
            Operation::Readme => "readme",
        }
    }

    /// Repo-relative file path this operation reads, if any.
    pub fn file_path(&self) -> Option<&str> {
        match self {
            Operation::File(path) | Operation::Changes(path) => Some(path),
            Operation::Readme => Some("readme.txt"),
            _ => None,
        }
    }
}

/// How a provider addresses a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectIdentity {
    /// Numeric project ID.
    Id(u64),
    /// URL-encoded `owner/repo`, accepted in place of an ID.
    EncodedPath(String),
    /// Plain `owner/repo` for path-addressed providers.
    Path(String),
}

impl ProjectIdentity {
    pub fn encoded(repo: &RepoDescriptor) -> Self {
        ProjectIdentity::EncodedPath(url_encode(&repo.full_name()))
    }
}

impl fmt::Display for ProjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectIdentity::Id(id) => write!(f, "{}", id),
            ProjectIdentity::EncodedPath(path) | ProjectIdentity::Path(path) => {
                write!(f, "{}", path)
            }
        }
    }
}

/// Normalized repository metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoMeta {
    pub last_updated: Option<DateTime<Utc>>,
    pub private: Option<bool>,
}

/// Per-provider endpoint shapes and field mappings.
///
/// Fetch logic (cache, network, fallback) is shared; providers only say
/// where things live and how their JSON maps onto a [`RepoDescriptor`].
pub trait GitHost: Send + Sync {
    /// Hosted API root, e.g. `https://gitlab.com/api/v3`.
    fn api_base(&self) -> &'static str;

    /// API root on a self-hosted instance at `enterprise`.
    fn enterprise_api_prefix(&self, enterprise: &str) -> String;

    /// Query parameter carrying the access token.
    fn token_param(&self, enterprise: bool) -> &'static str;

    /// Whether update checks refuse to run without tokens.
    fn requires_tokens(&self) -> bool;

    /// Whether the API addresses repos by project ID.
    fn addresses_by_id(&self) -> bool;

    /// Path (and any fixed query) for `op`, relative to the API root.
    fn endpoint_path(
        &self,
        op: &Operation,
        project: Option<&ProjectIdentity>,
        repo: &RepoDescriptor,
    ) -> String;

    /// Base used for archive downloads on the hosted service.
    fn download_base(&self) -> &'static str;

    /// Base used for archive downloads on a self-hosted instance.
    fn enterprise_download_base(&self, enterprise: &str) -> String;

    /// Archive URL for `git_ref`, plus any query pairs it needs.
    fn archive_url(
        &self,
        base: &str,
        repo: &RepoDescriptor,
        git_ref: Option<&str>,
    ) -> (String, Vec<(&'static str, String)>);

    /// Whether metadata comes from the cached project list instead of an endpoint.
    fn meta_from_projects(&self) -> bool;

    fn map_meta(&self, meta: &Value) -> RepoMeta;
}

/// Form-urlencode a single value (`acme/widget` -> `acme%2Fwidget`).
pub fn url_encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Append query pairs to a URL that may already carry a query string.
pub fn with_query(url: String, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return url;
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, sep, query)
}

/// Decode the base64 `content` field of a file payload.
///
/// `Ok(None)` if the payload has no content field.
pub fn decode_content(payload: &Value) -> Result<Option<String>, RemoteError> {
    let Some(encoded) = payload.get("content").and_then(Value::as_str) else {
        return Ok(None);
    };
    // GitHub wraps base64 at 60 columns
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(Some(String::from_utf8(bytes)?))
}

/// Wrap raw file text in the payload shape the providers return.
pub fn encode_content(text: &str) -> Value {
    serde_json::json!({ "content": STANDARD.encode(text) })
}

/// `name` fields of a tag or branch listing.
pub fn ref_names(listing: &Value) -> Vec<String> {
    listing
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Find a project by its path in a project listing.
pub fn find_project<'a>(projects: &'a Value, path: &str) -> Option<&'a Value> {
    projects
        .as_array()?
        .iter()
        .find(|p| p.get("path").and_then(Value::as_str) == Some(path))
}

/// Parse an RFC 3339 timestamp field.
pub fn timestamp_field(meta: &Value, field: &str) -> Option<DateTime<Utc>> {
    let raw = meta.get(field)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Expected top-level shape of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Array,
    Object,
}

/// Provider error bodies and empty results carry no usable data.
pub fn is_error_payload(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty() || map.contains_key("message"),
        _ => false,
    }
}

/// Shared validity check applied before a payload reaches the descriptor.
pub fn is_usable(value: &Value, shape: Shape) -> bool {
    if is_error_payload(value) {
        return false;
    }
    match shape {
        Shape::Array => value.is_array(),
        Shape::Object => value.is_object(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_needs_ref() {
        assert!(Operation::File("widget.php".into()).needs_ref());
        assert!(Operation::Changes("CHANGES.md".into()).needs_ref());
        assert!(Operation::Readme.needs_ref());
        assert!(!Operation::Projects.needs_ref());
        assert!(!Operation::Meta.needs_ref());
        assert!(!Operation::Tags.needs_ref());
        assert!(!Operation::Branches.needs_ref());
    }

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("https://x/a".into(), &[]), "https://x/a");
        assert_eq!(
            with_query("https://x/a".into(), &[("ref", "1.2".into())]),
            "https://x/a?ref=1.2"
        );
        assert_eq!(
            with_query("https://x/a?file_path=b".into(), &[("ref", "feature/x".into())]),
            "https://x/a?file_path=b&ref=feature%2Fx"
        );
    }

    #[test]
    fn test_decode_content() {
        let payload = json!({ "content": "VmVyc2lvbjog\nMS4y" });
        assert_eq!(decode_content(&payload).unwrap().as_deref(), Some("Version: 1.2"));

        assert!(decode_content(&json!({})).unwrap().is_none());
        assert!(decode_content(&json!({ "content": "***" })).is_err());

        let wrapped = encode_content("hello");
        assert_eq!(decode_content(&wrapped).unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn test_ref_names() {
        let listing = json!([{ "name": "1.0" }, { "commit": {} }, { "name": "1.2" }]);
        assert_eq!(ref_names(&listing), vec!["1.0", "1.2"]);
        assert!(ref_names(&json!({ "message": "404" })).is_empty());
    }

    #[test]
    fn test_find_project() {
        let projects = json!([{ "path": "gadget", "id": 7 }, { "path": "widget", "id": 42 }]);
        assert_eq!(find_project(&projects, "widget").unwrap()["id"], 42);
        assert!(find_project(&projects, "sprocket").is_none());
    }

    #[test]
    fn test_validity_check() {
        assert!(!is_usable(&Value::Null, Shape::Object));
        assert!(!is_usable(&json!([]), Shape::Array));
        assert!(!is_usable(&json!({ "message": "No tags found" }), Shape::Object));
        assert!(!is_usable(&json!({ "message": "404 Not Found" }), Shape::Array));
        assert!(!is_usable(&json!({ "id": 1 }), Shape::Array));
        assert!(!is_usable(&json!([1]), Shape::Object));
        assert!(is_usable(&json!([{ "name": "1.0" }]), Shape::Array));
        assert!(is_usable(&json!({ "content": "eA==" }), Shape::Object));
    }

    #[test]
    fn test_url_encode() {
        assert_eq!(url_encode("acme/widget"), "acme%2Fwidget");
    }
}
