//! CrossRef client (primary source).
//!
//! API: `GET {base}/works/{doi}`; the work sits under the response's nested
//! `message` object. Retraction Watch markers surface in the `update-to`
//! array.

use serde::Deserialize;

use super::{LookupOutcome, SourceClient, build_http_client};
use crate::{Config, CoreError, WorkAuthor, WorkRecord, WorkUpdate, ident};

const SEARCH_ROWS: usize = 5;

pub struct CrossRefClient {
    client: reqwest::Client,
    base: String,
    mailto: Option<String>,
}

impl CrossRefClient {
    pub fn new(config: &Config) -> Result<Self, CoreError> {
        Ok(Self {
            client: build_http_client(config.contact_email.as_deref(), config.timeout)?,
            base: config.crossref_base.trim_end_matches('/').to_string(),
            mailto: config.contact_email.clone(),
        })
    }
}

#[async_trait::async_trait]
impl SourceClient for CrossRefClient {
    fn name(&self) -> &'static str {
        "CrossRef"
    }

    async fn get_work(&self, doi: &str) -> LookupOutcome {
        let url = format!("{}/works/{}", self.base, urlencoding::encode(doi));
        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(err) => return LookupOutcome::Error(format!("CrossRef: {err}")),
        };
        match resp.status() {
            s if s == reqwest::StatusCode::NOT_FOUND => LookupOutcome::NotFound,
            s if !s.is_success() => LookupOutcome::Error(format!("CrossRef: HTTP {s}")),
            _ => match resp.json::<WorksEnvelope>().await {
                Ok(envelope) => LookupOutcome::Found(work_record(envelope.message)),
                Err(err) => LookupOutcome::Error(format!("CrossRef: malformed response: {err}")),
            },
        }
    }

    async fn search(
        &self,
        title: &str,
        first_author: Option<&str>,
        _year: Option<i32>,
    ) -> Vec<WorkRecord> {
        let mut url = format!(
            "{}/works?query.bibliographic={}&rows={}",
            self.base,
            urlencoding::encode(title),
            SEARCH_ROWS
        );
        if let Some(author) = first_author {
            url.push_str(&format!("&query.author={}", urlencoding::encode(author)));
        }
        if let Some(mailto) = &self.mailto {
            url.push_str(&format!("&mailto={}", urlencoding::encode(mailto)));
        }

        let resp = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                log::debug!("CrossRef search failed: HTTP {}", resp.status());
                return Vec::new();
            }
            Err(err) => {
                log::debug!("CrossRef search failed: {err}");
                return Vec::new();
            }
        };
        match resp.json::<SearchEnvelope>().await {
            Ok(envelope) => envelope.message.items.into_iter().map(work_record).collect(),
            Err(err) => {
                log::debug!("CrossRef search returned malformed body: {err}");
                Vec::new()
            }
        }
    }
}

fn work_record(work: CrWork) -> WorkRecord {
    let authors = work
        .author
        .into_iter()
        .map(|a| WorkAuthor::from_parts(a.given, a.family, a.name))
        .collect();

    // First populated date field wins: print, online, issued, created.
    let year = [
        &work.published_print,
        &work.published_online,
        &work.issued,
        &work.created,
    ]
    .into_iter()
    .flatten()
    .find_map(CrDate::year)
    .unwrap_or(0);

    let updates = work
        .update_to
        .into_iter()
        .filter_map(|u| {
            let kind = u.kind?;
            Some(WorkUpdate {
                kind,
                label: u.label,
                date: u.updated.as_ref().and_then(CrDate::iso_date),
                notice_url: None,
            })
        })
        .collect();

    WorkRecord {
        doi: ident::normalize_doi(&work.doi.unwrap_or_default()).unwrap_or_default(),
        title: work.title.into_iter().next().unwrap_or_default(),
        authors,
        year,
        journal: work.container_title.into_iter().next(),
        publisher: work.publisher,
        work_type: work.work_type,
        volume: work.volume,
        issue: work.issue,
        pages: work.page,
        updates,
    }
}

#[derive(Deserialize)]
struct WorksEnvelope {
    message: CrWork,
}

#[derive(Deserialize)]
struct SearchEnvelope {
    message: CrSearchMessage,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CrSearchMessage {
    items: Vec<CrWork>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CrWork {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    title: Vec<String>,
    author: Vec<CrAuthor>,
    #[serde(rename = "container-title")]
    container_title: Vec<String>,
    publisher: Option<String>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    volume: Option<String>,
    issue: Option<String>,
    page: Option<String>,
    #[serde(rename = "published-print")]
    published_print: Option<CrDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CrDate>,
    issued: Option<CrDate>,
    created: Option<CrDate>,
    #[serde(rename = "update-to")]
    update_to: Vec<CrUpdate>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CrAuthor {
    given: Option<String>,
    family: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CrDate {
    #[serde(rename = "date-parts")]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl CrDate {
    fn year(&self) -> Option<i32> {
        self.date_parts.first()?.first()?.map(|y| y as i32)
    }

    fn iso_date(&self) -> Option<String> {
        let parts = self.date_parts.first()?;
        let year = parts.first()?.as_ref()?;
        let month = parts.get(1).copied().flatten();
        let day = parts.get(2).copied().flatten();
        Some(match (month, day) {
            (Some(m), Some(d)) => format!("{year:04}-{m:02}-{d:02}"),
            (Some(m), None) => format!("{year:04}-{m:02}"),
            _ => format!("{year:04}"),
        })
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CrUpdate {
    #[serde(rename = "type")]
    kind: Option<String>,
    label: Option<String>,
    updated: Option<CrDate>,
}
