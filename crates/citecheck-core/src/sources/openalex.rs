//! OpenAlex client (secondary source).
//!
//! API: `GET {base}/works/doi:{doi}?mailto={contact}`; the response body is
//! itself the work (no envelope). OpenAlex flags retracted works with a
//! bare `is_retracted` boolean rather than update records.

use serde::Deserialize;

use super::{LookupOutcome, SourceClient, build_http_client};
use crate::{Config, CoreError, WorkAuthor, WorkRecord, WorkUpdate, ident};

const SEARCH_ROWS: usize = 5;

pub struct OpenAlexClient {
    client: reqwest::Client,
    base: String,
    mailto: Option<String>,
}

impl OpenAlexClient {
    pub fn new(config: &Config) -> Result<Self, CoreError> {
        Ok(Self {
            client: build_http_client(config.contact_email.as_deref(), config.timeout)?,
            base: config.openalex_base.trim_end_matches('/').to_string(),
            mailto: config.contact_email.clone(),
        })
    }

    fn with_mailto(&self, url: String) -> String {
        match &self.mailto {
            Some(mailto) => {
                let sep = if url.contains('?') { '&' } else { '?' };
                format!("{url}{sep}mailto={}", urlencoding::encode(mailto))
            }
            None => url,
        }
    }
}

#[async_trait::async_trait]
impl SourceClient for OpenAlexClient {
    fn name(&self) -> &'static str {
        "OpenAlex"
    }

    async fn get_work(&self, doi: &str) -> LookupOutcome {
        let url = self.with_mailto(format!(
            "{}/works/doi:{}",
            self.base,
            urlencoding::encode(doi)
        ));
        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(err) => return LookupOutcome::Error(format!("OpenAlex: {err}")),
        };
        match resp.status() {
            s if s == reqwest::StatusCode::NOT_FOUND => LookupOutcome::NotFound,
            s if !s.is_success() => LookupOutcome::Error(format!("OpenAlex: HTTP {s}")),
            _ => match resp.json::<OaWork>().await {
                Ok(work) => LookupOutcome::Found(work_record(work)),
                Err(err) => LookupOutcome::Error(format!("OpenAlex: malformed response: {err}")),
            },
        }
    }

    async fn search(
        &self,
        title: &str,
        _first_author: Option<&str>,
        _year: Option<i32>,
    ) -> Vec<WorkRecord> {
        let url = self.with_mailto(format!(
            "{}/works?search={}&per-page={}",
            self.base,
            urlencoding::encode(title),
            SEARCH_ROWS
        ));
        let resp = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                log::debug!("OpenAlex search failed: HTTP {}", resp.status());
                return Vec::new();
            }
            Err(err) => {
                log::debug!("OpenAlex search failed: {err}");
                return Vec::new();
            }
        };
        match resp.json::<OaSearchResponse>().await {
            Ok(body) => body.results.into_iter().map(work_record).collect(),
            Err(err) => {
                log::debug!("OpenAlex search returned malformed body: {err}");
                Vec::new()
            }
        }
    }
}

fn work_record(work: OaWork) -> WorkRecord {
    let authors = work
        .authorships
        .into_iter()
        .filter_map(|a| a.author)
        .map(|a| WorkAuthor::from_parts(None, None, a.display_name))
        .collect();

    let source = work.primary_location.and_then(|l| l.source);
    let (journal, publisher) = match source {
        Some(s) => (s.display_name, s.host_organization_name),
        None => (None, None),
    };

    // OpenAlex has no update records; synthesize one from its flag so the
    // retraction detector sees a uniform shape.
    let updates = if work.is_retracted {
        vec![WorkUpdate {
            kind: "retraction".to_string(),
            label: Some("Flagged as retracted by OpenAlex".to_string()),
            date: None,
            notice_url: None,
        }]
    } else {
        Vec::new()
    };

    let (volume, issue, pages) = match work.biblio {
        Some(b) => {
            let pages = match (b.first_page, b.last_page) {
                (Some(first), Some(last)) => Some(format!("{first}-{last}")),
                (Some(first), None) => Some(first),
                _ => None,
            };
            (b.volume, b.issue, pages)
        }
        None => (None, None, None),
    };

    WorkRecord {
        doi: ident::normalize_doi(&work.doi.unwrap_or_default()).unwrap_or_default(),
        title: work.display_name.or(work.title).unwrap_or_default(),
        authors,
        year: work.publication_year.unwrap_or(0),
        journal,
        publisher,
        work_type: work.work_type,
        volume,
        issue,
        pages,
        updates,
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OaWork {
    display_name: Option<String>,
    title: Option<String>,
    doi: Option<String>,
    publication_year: Option<i32>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    is_retracted: bool,
    authorships: Vec<OaAuthorship>,
    primary_location: Option<OaLocation>,
    biblio: Option<OaBiblio>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OaAuthorship {
    author: Option<OaAuthor>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OaAuthor {
    display_name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OaLocation {
    source: Option<OaSource>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OaSource {
    display_name: Option<String>,
    host_organization_name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OaBiblio {
    volume: Option<String>,
    issue: Option<String>,
    first_page: Option<String>,
    last_page: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OaSearchResponse {
    results: Vec<OaWork>,
}
