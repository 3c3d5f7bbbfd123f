//! Capability-polymorphic clients for the external bibliographic sources.
//!
//! Each client maps its source's heterogeneous payload into the common
//! [`WorkRecord`] shape and its failure modes into [`LookupOutcome`]. The
//! three-way outcome is the central invariant of the engine: a positive
//! "does not exist" is evidence, a transport failure is not, and the two
//! must never be conflated.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

use crate::{CoreError, WorkRecord};

pub mod crossref;
pub mod openalex;

pub use crossref::CrossRefClient;
pub use openalex::OpenAlexClient;

/// Outcome of a single-identifier lookup against one source.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    /// The source returned the work's metadata.
    Found(WorkRecord),
    /// The source positively confirms the identifier does not exist.
    NotFound,
    /// The source could not determine existence: network failure, non-404
    /// HTTP failure, or a malformed payload.
    Error(String),
}

/// A lookup/search backend for one external bibliographic source.
///
/// Instances carry their own configuration (base URL, contact email,
/// timeout) and are injected into the orchestrator, so tests can substitute
/// scripted fakes.
#[async_trait]
pub trait SourceClient: Send + Sync {
    fn name(&self) -> &'static str;

    /// Single-identifier lookup. The source's "resource absent" signal maps
    /// to [`LookupOutcome::NotFound`]; every other failure maps to
    /// [`LookupOutcome::Error`]. A transport error is never allowed to
    /// present as not-found.
    async fn get_work(&self, doi: &str) -> LookupOutcome;

    /// Best-effort fuzzy search. Returns an empty list on any failure:
    /// search is already the fallback path, so its failures do not
    /// propagate as an error state.
    async fn search(
        &self,
        title: &str,
        first_author: Option<&str>,
        year: Option<i32>,
    ) -> Vec<WorkRecord>;
}

/// Identify ourselves to the sources, with a mailto when configured.
///
/// Both CrossRef and OpenAlex route clients that send a contact address
/// into their "polite pool"; anonymous traffic gets the shared pool.
pub(crate) fn polite_user_agent(contact_email: Option<&str>) -> String {
    let base = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
    match contact_email {
        Some(mail) => format!("{base} (mailto:{mail})"),
        None => base.to_string(),
    }
}

/// Shared reqwest client construction for both sources.
pub(crate) fn build_http_client(
    contact_email: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, CoreError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let ua = polite_user_agent(contact_email);
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&ua)
            .map_err(|_| CoreError::Config(format!("invalid contact email in user agent: {ua}")))?,
    );
    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_includes_mailto_when_configured() {
        let ua = polite_user_agent(Some("team@example.org"));
        assert!(ua.contains("mailto:team@example.org"));
        assert!(ua.starts_with("citecheck-core/"));
    }

    #[test]
    fn user_agent_without_contact() {
        let ua = polite_user_agent(None);
        assert!(!ua.contains("mailto"));
    }

    #[test]
    fn newline_in_contact_is_rejected() {
        assert!(build_http_client(Some("a@b.c\nX-Evil: 1"), Duration::from_secs(1)).is_err());
    }
}
