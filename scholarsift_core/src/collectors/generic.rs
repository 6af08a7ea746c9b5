//! Collector for sources without a dedicated parser.
//!
//! Reads the source's RSS/Atom feeds first. When they yield fewer than
//! [`MIN_FEED_RECORDS`] listings the source page itself is scanned for links
//! that look like scholarships.

use super::extract::{
    absolutize, decode_entities, element_text, extract_country, extract_deadline, extract_degree,
    extract_funding, fragment_text, is_scholarship_link,
};
use super::http::{fetch_bytes, fetch_text};
use crate::config::SourceConfig;
use crate::cpu_pool::spawn_cpu;
use crate::error::FetchError;
use crate::model::{Profile, RawRecord};
use crate::Collector;
use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::io::Cursor;
use tracing::{debug, warn};
use url::Url;

/// Entries read from each feed.
pub const FEED_ENTRY_LIMIT: usize = 10;

/// Below this many feed records the page is scraped too.
pub const MIN_FEED_RECORDS: usize = 5;

/// Links taken from the page scan.
pub const PAGE_LINK_LIMIT: usize = 10;

const UNKNOWN_COUNTRY: &str = "Various";

pub struct GenericCollector {
    client: Client,
    source: SourceConfig,
}

pub fn factory(source: &SourceConfig, client: &Client) -> Box<dyn Collector> {
    Box::new(GenericCollector::new(source.clone(), client.clone()))
}

impl GenericCollector {
    pub fn new(source: SourceConfig, client: Client) -> Self {
        Self { client, source }
    }

    fn fallback_country(&self) -> String {
        self.source
            .country
            .clone()
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
    }

    async fn collect_feed(&self, feed_url: &str) -> Result<Vec<RawRecord>, FetchError> {
        let bytes = fetch_bytes(&self.client, feed_url).await?;
        let fallback = self.fallback_country();
        spawn_cpu(move || parse_feed(&bytes, &fallback, FEED_ENTRY_LIMIT)).await
    }

    async fn collect_page(&self) -> Result<Vec<RawRecord>, FetchError> {
        let html = fetch_text(&self.client, &self.source.url).await?;
        let page_url = self.source.url.clone();
        let fallback = self.fallback_country();
        spawn_cpu(move || parse_page(&html, &page_url, &fallback, PAGE_LINK_LIMIT)).await
    }
}

#[async_trait]
impl Collector for GenericCollector {
    fn name(&self) -> &str {
        &self.source.name
    }

    fn display_name(&self) -> &str {
        &self.source.display_name
    }

    async fn collect(&self, _profile: &Profile) -> Result<Vec<RawRecord>, FetchError> {
        let mut records = Vec::new();
        let mut last_error = None;
        let mut any_success = false;

        for feed_url in &self.source.feeds {
            match self.collect_feed(feed_url).await {
                Ok(mut batch) => {
                    any_success = true;
                    records.append(&mut batch);
                }
                Err(e) => {
                    warn!(source = %self.source.name, feed = %feed_url, error = %e, "feed unavailable");
                    last_error = Some(e);
                }
            }
        }

        if records.len() < MIN_FEED_RECORDS {
            match self.collect_page().await {
                Ok(mut batch) => {
                    any_success = true;
                    records.append(&mut batch);
                }
                Err(e) => {
                    debug!(source = %self.source.name, error = %e, "page scan failed");
                    last_error = Some(e);
                }
            }
        }

        // only an error when nothing could be read at all
        match last_error {
            Some(e) if !any_success => Err(e),
            _ => {
                records.truncate(self.source.limit);
                Ok(records)
            }
        }
    }
}

/// Turn RSS/Atom bytes into listings.
pub fn parse_feed(bytes: &[u8], fallback_country: &str, limit: usize) -> Result<Vec<RawRecord>, FetchError> {
    let feed = parser::parse(Cursor::new(bytes)).map_err(|e| FetchError::Feed(e.to_string()))?;

    Ok(feed
        .entries
        .into_iter()
        .take(limit)
        .filter_map(|entry| {
            let title = entry
                .title
                .map(|t| decode_entities(&t.content))
                .filter(|t| !t.trim().is_empty())?;
            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .map(|html| fragment_text(&html))
                .unwrap_or_default();
            let url = entry.links.first().map(|l| l.href.clone()).unwrap_or_default();

            let country = extract_country(&format!("{title} {summary}"))
                .map(str::to_string)
                .unwrap_or_else(|| fallback_country.to_string());

            Some(
                RawRecord::new(title, country)
                    .with_degree(extract_degree(&summary).unwrap_or("Various levels"))
                    .with_field_of_study("All fields")
                    .with_duration("Varies")
                    .with_funding(extract_funding(&summary))
                    .with_eligibility("International students - check official website")
                    .with_documents("See official announcement")
                    .with_deadline(extract_deadline(&summary).unwrap_or_else(|| "Check official website".to_string()))
                    .with_url(url),
            )
        })
        .collect())
}

/// Scan a page for scholarship-like links.
pub fn parse_page(
    html: &str,
    page_url: &str,
    fallback_country: &str,
    limit: usize,
) -> Result<Vec<RawRecord>, FetchError> {
    let base = Url::parse(page_url)?;
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]")
        .map_err(|e| FetchError::Parse(format!("link selector: {:?}", e)))?;

    Ok(document
        .select(&anchors)
        .filter_map(|link| {
            let title = decode_entities(&element_text(link));
            if !is_scholarship_link(&title) {
                return None;
            }
            let url = absolutize(&base, link.value().attr("href").unwrap_or_default())?;
            let context = enclosing_block(link).map(element_text).unwrap_or_default();

            let country = extract_country(&format!("{title} {context}"))
                .map(str::to_string)
                .unwrap_or_else(|| fallback_country.to_string());

            Some(
                RawRecord::new(title, country)
                    .with_degree(extract_degree(&context).unwrap_or("Various levels"))
                    .with_field_of_study("Various")
                    .with_duration("Varies")
                    .with_funding(extract_funding(&context))
                    .with_eligibility("International students")
                    .with_documents("See official website")
                    .with_deadline(extract_deadline(&context).unwrap_or_else(|| "Check official website".to_string()))
                    .with_url(url),
            )
        })
        .take(limit)
        .collect())
}

fn enclosing_block(link: ElementRef<'_>) -> Option<ElementRef<'_>> {
    link.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| matches!(el.value().name(), "div" | "article" | "section" | "li"))
}
