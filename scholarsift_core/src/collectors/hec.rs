//! HEC Pakistan scholarships and grants page.

use super::extract::{absolutize, element_text, extract_country, extract_deadline, extract_degree};
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
use scraper::{ElementRef, Html, Selector};
use url::Url;

const MAX_BLOCKS: usize = 15;
const MAX_LINKS: usize = 10;
const MIN_TITLE_CHARS: usize = 10;

const ELIGIBILITY: &str = "Pakistani nationals with strong academic records";
const FUNDING: &str = "Full or partial funding";

static BLOCK_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(content|scholarship|news-item)").expect("valid class regex"));

const LINK_KEYWORDS: &[&str] = &["scholarship", "fellowship", "grant", "funding"];

pub struct HecCollector {
    client: Client,
    source: SourceConfig,
}

pub fn factory(source: &SourceConfig, client: &Client) -> Box<dyn Collector> {
    Box::new(HecCollector::new(source.clone(), client.clone()))
}

impl HecCollector {
    pub fn new(source: SourceConfig, client: Client) -> Self {
        Self { client, source }
    }
}

#[async_trait]
impl Collector for HecCollector {
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

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Parse(format!("selector {css}: {e:?}")))
}

/// Content blocks first; keyword links only when no block yields a listing.
pub fn parse_listing(html: &str, page_url: &str, limit: usize) -> Result<Vec<RawRecord>, FetchError> {
    let base = Url::parse(page_url)?;
    let document = Html::parse_document(html);

    let divs = selector("div[class]")?;
    let headings = selector("h2, h3, h4, strong, a")?;
    let anchors = selector("a[href]")?;

    let blocks: Vec<RawRecord> = document
        .select(&divs)
        .filter(|div| {
            div.value()
                .attr("class")
                .is_some_and(|class| BLOCK_CLASS.is_match(class))
        })
        .filter_map(|div| from_block(div, &headings, &anchors, &base, page_url))
        .take(limit.min(MAX_BLOCKS))
        .collect();
    if !blocks.is_empty() {
        return Ok(blocks);
    }

    Ok(document
        .select(&anchors)
        .filter_map(|link| {
            let title = element_text(link);
            let lower = title.to_lowercase();
            if !LINK_KEYWORDS.iter().any(|k| lower.contains(k)) {
                return None;
            }
            let url = link
                .value()
                .attr("href")
                .and_then(|href| absolutize(&base, href))
                .unwrap_or_else(|| page_url.to_string());
            Some(
                RawRecord::new(title, "Various")
                    .with_degree("Master's/PhD")
                    .with_field_of_study("All fields")
                    .with_duration("Varies")
                    .with_funding(FUNDING)
                    .with_eligibility("Pakistani nationals")
                    .with_documents("See HEC portal for requirements")
                    .with_deadline("Check official announcement")
                    .with_url(url),
            )
        })
        .take(limit.min(MAX_LINKS))
        .collect())
}

fn from_block(
    div: ElementRef<'_>,
    headings: &Selector,
    anchors: &Selector,
    base: &Url,
    page_url: &str,
) -> Option<RawRecord> {
    let title = div.select(headings).next().map(element_text)?;
    if title.chars().count() < MIN_TITLE_CHARS {
        return None;
    }

    let url = div
        .select(anchors)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| absolutize(base, href))
        .unwrap_or_else(|| page_url.to_string());

    let content = element_text(div);
    let country = extract_country(&format!("{title} {content}")).unwrap_or("Various");

    Some(
        RawRecord::new(title, country)
            .with_degree(extract_degree(&content).unwrap_or("Master's/PhD"))
            .with_field_of_study("All fields")
            .with_duration("Varies")
            .with_funding(FUNDING)
            .with_eligibility(ELIGIBILITY)
            .with_documents("Academic transcripts, IELTS/TOEFL, Research proposal")
            .with_deadline(extract_deadline(&content).unwrap_or_else(|| "Check official announcement".to_string()))
            .with_url(url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://hec.gov.pk/english/scholarshipsgrants/Pages/default.aspx";

    #[test]
    fn test_parses_content_blocks() {
        let html = r#"<html><body>
            <div class="news-item">
                <h3>HEC Overseas Scholarships for PhD in Selected Fields</h3>
                <p>Study in Germany or France. Last date: 30/06/2025</p>
                <a href="/english/scholarshipsgrants/OSS/Pages/default.aspx">Details</a>
            </div>
            <div class="news-item"><strong>Short</strong></div>
            <div class="footer"><h3>Contact the Higher Education Commission</h3></div>
        </body></html>"#;

        let records = parse_listing(html, PAGE, 20).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(
            record.title.as_deref(),
            Some("HEC Overseas Scholarships for PhD in Selected Fields")
        );
        assert_eq!(record.country.as_deref(), Some("Germany"));
        assert_eq!(record.degree.as_deref(), Some("PhD"));
        assert_eq!(record.deadline.as_deref(), Some("30/06/2025"));
        assert_eq!(
            record.url.as_deref(),
            Some("https://hec.gov.pk/english/scholarshipsgrants/OSS/Pages/default.aspx")
        );
    }

    #[test]
    fn test_falls_back_to_keyword_links() {
        let html = r#"<html><body>
            <ul>
                <li><a href="/english/scholarshipsgrants/ipfp.aspx">Interim Placement of Fresh PhDs Fellowship</a></li>
                <li><a href="/english/about.aspx">About HEC</a></li>
                <li><a href="https://grants.hec.gov.pk/nrpu">NRPU Grant</a></li>
            </ul>
        </body></html>"#;

        let records = parse_listing(html, PAGE, 20).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].country.as_deref(), Some("Various"));
        assert_eq!(
            records[0].url.as_deref(),
            Some("https://hec.gov.pk/english/scholarshipsgrants/ipfp.aspx")
        );
        assert_eq!(records[1].title.as_deref(), Some("NRPU Grant"));
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        let records = parse_listing("<html><body></body></html>", PAGE, 20).unwrap();
        assert!(records.is_empty());
    }
}
