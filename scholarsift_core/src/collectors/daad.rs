//! DAAD scholarship database.
//!
//! The database page embeds its result set as `JSON.parse('…')` in a script
//! tag. When that payload is missing or unreadable the visible result cards
//! (`a.ghp-wrapper`) are scraped instead.

use super::extract::{absolutize, decode_entities, element_text};
use super::http::fetch_text;
use crate::config::SourceConfig;
use crate::cpu_pool::spawn_cpu;
use crate::error::FetchError;
use crate::model::{Profile, RawRecord};
use crate::Collector;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

const COUNTRY: &str = "Germany";
const MAX_JSON_ITEMS: usize = 50;
const MAX_CARDS: usize = 20;

static PAYLOAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"JSON\.parse\('(.*)'\)").expect("valid payload regex"));

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Default, Deserialize)]
struct Item {
    title: Option<String>,
    degree: Option<String>,
    subject: Option<String>,
    duration: Option<String>,
    funding: Option<String>,
    eligibility: Option<String>,
    deadline: Option<String>,
    url: Option<String>,
}

pub struct DaadCollector {
    client: Client,
    source: SourceConfig,
}

pub fn factory(source: &SourceConfig, client: &Client) -> Box<dyn Collector> {
    Box::new(DaadCollector::new(source.clone(), client.clone()))
}

impl DaadCollector {
    pub fn new(source: SourceConfig, client: Client) -> Self {
        Self { client, source }
    }
}

#[async_trait]
impl Collector for DaadCollector {
    fn name(&self) -> &str {
        &self.source.name
    }

    fn display_name(&self) -> &str {
        &self.source.display_name
    }

    async fn collect(&self, _profile: &Profile) -> Result<Vec<RawRecord>, FetchError> {
        let html = fetch_text(&self.client, &self.source.url).await?;
        let page_url = self.source.url.clone();
        let limit = self.source.limit;
        spawn_cpu(move || parse_listing(&html, &page_url, limit)).await
    }
}

/// Extract listings from a DAAD database page.
pub fn parse_listing(html: &str, page_url: &str, limit: usize) -> Result<Vec<RawRecord>, FetchError> {
    let base = Url::parse(page_url)?;
    let document = Html::parse_document(html);

    if let Some(records) = parse_embedded_json(&document, &base, limit.min(MAX_JSON_ITEMS)) {
        return Ok(records);
    }

    let cards = Selector::parse("a.ghp-wrapper")
        .map_err(|e| FetchError::Parse(format!("card selector: {:?}", e)))?;
    let records: Vec<RawRecord> = document
        .select(&cards)
        .filter_map(|card| {
            let title = element_text(card);
            if title.is_empty() {
                return None;
            }
            let url = card
                .value()
                .attr("href")
                .and_then(|href| absolutize(&base, href))
                .unwrap_or_else(|| page_url.to_string());
            Some(
                RawRecord::new(title, COUNTRY)
                    .with_degree("All levels")
                    .with_field_of_study("All fields")
                    .with_duration("Varies")
                    .with_funding("Full / partial")
                    .with_eligibility("International students")
                    .with_documents("Check portal")
                    .with_deadline("Varies")
                    .with_url(url),
            )
        })
        .take(limit.min(MAX_CARDS))
        .collect();

    if records.is_empty() {
        tracing::debug!(target: "scholarsift::collectors", "no DAAD payload or cards found");
    }
    Ok(records)
}

fn parse_embedded_json(document: &Html, base: &Url, limit: usize) -> Option<Vec<RawRecord>> {
    let scripts = Selector::parse("script").ok()?;
    let payload = document
        .select(&scripts)
        .map(|script| script.text().collect::<String>())
        .find_map(|text| {
            PAYLOAD
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })?;

    let parsed: Payload = match serde_json::from_str(&unescape_js(&payload)) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(target: "scholarsift::collectors", error = %e, "DAAD payload unreadable, using cards");
            return None;
        }
    };

    let page_url = base.to_string();
    Some(
        parsed
            .items
            .into_iter()
            .take(limit)
            .map(|item| {
                let url = item
                    .url
                    .as_deref()
                    .and_then(|href| absolutize(base, href))
                    .unwrap_or_else(|| page_url.clone());
                let text = |value: Option<String>, default: &str| {
                    value
                        .map(|v| decode_entities(&v))
                        .filter(|v| !v.trim().is_empty())
                        .unwrap_or_else(|| default.to_string())
                };
                RawRecord::new(text(item.title, "DAAD Scholarship"), COUNTRY)
                    .with_degree(text(item.degree, "All levels"))
                    .with_field_of_study(text(item.subject, "All fields"))
                    .with_duration(text(item.duration, "Varies"))
                    .with_funding(text(item.funding, "Full/partial"))
                    .with_eligibility(text(item.eligibility, "Check portal"))
                    .with_documents("See DAAD")
                    .with_deadline(text(item.deadline, "Varies"))
                    .with_url(url)
            })
            .collect(),
    )
}

/// Undo the escaping of a single-quoted JavaScript string literal.
fn unescape_js(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\'') => out.push('\''),
            Some('/') => out.push('/'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    // keep JSON-significant characters escaped
                    Some(ch @ ('"' | '\\')) => {
                        out.push('\\');
                        out.push(ch);
                    }
                    Some(ch) if !ch.is_control() => out.push(ch),
                    _ => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            // JSON understands the remaining escapes itself
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
