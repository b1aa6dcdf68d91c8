//! Authenticated endpoint construction.

use secrecy::ExposeSecret;

use crate::local::Credentials;
use crate::types::RepoDescriptor;

use super::provider::{GitHost, Operation, ProjectIdentity, with_query};

/// API root for a repo: explicit enterprise API base, else one derived from
/// the enterprise web base, else the hosted API.
pub fn api_prefix<H: GitHost + ?Sized>(host: &H, repo: &RepoDescriptor) -> String {
    let web = repo.enterprise_base().map(|w| w.trim_end_matches('/'));
    let api = repo.enterprise_api_base().map(|a| a.trim_end_matches('/'));

    match (api, web) {
        (Some(api), Some(web)) if api != web => api.to_string(),
        (Some(api), None) => api.to_string(),
        (_, Some(web)) => host.enterprise_api_prefix(web),
        (None, None) => host.api_base().to_string(),
    }
}

/// Append the access token for the selected base.
///
/// Only one of the public and enterprise tokens is ever attached; a missing
/// token leaves the request unauthenticated.
pub fn push_token<H: GitHost + ?Sized>(
    host: &H,
    credentials: &Credentials,
    enterprise: bool,
    query: &mut Vec<(&'static str, String)>,
) {
    if let Some(token) = credentials.token_for(enterprise) {
        query.push((
            host.token_param(enterprise),
            token.expose_secret().to_string(),
        ));
    }
}

/// Build the full request URL for `op`.
pub fn build_endpoint<H: GitHost + ?Sized>(
    host: &H,
    op: &Operation,
    project: Option<&ProjectIdentity>,
    repo: &RepoDescriptor,
    credentials: &Credentials,
) -> String {
    let url = format!(
        "{}{}",
        api_prefix(host, repo),
        host.endpoint_path(op, project, repo)
    );

    let mut query = Vec::new();
    if op.needs_ref() {
        query.push(("ref", repo.branch().to_string()));
    }
    push_token(host, credentials, repo.is_enterprise(), &mut query);

    with_query(url, &query)
}
