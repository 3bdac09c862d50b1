//! DataForSEO adapters for SERP rankings and on-page content.
//!
//! Both endpoints are "live" task endpoints: one request, one task, results
//! inline. A top-level or task-level status code other than 20000 is an error.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::services::{OnPageOutcome, OnPageService, RankingService};
use crate::types::{MarketSettings, OnPageElements, RankedUrl, SerpResult};

pub const API_BASE: &str = "https://api.dataforseo.com/v3";
const SERP_PATH: &str = "/serp/google/organic/live/advanced";
const ON_PAGE_PATH: &str = "/on_page/content_parsing/live";
const STATUS_OK: u32 = 20000;
const SERP_DEPTH: u32 = 10;

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ApiResponse<T> {
    status_code: u32,
    #[serde(default)]
    status_message: String,
    #[serde(default)]
    tasks: Vec<ApiTask<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ApiTask<T> {
    status_code: u32,
    #[serde(default)]
    status_message: String,
    #[serde(default)]
    result: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
struct SerpTaskResult {
    #[serde(default)]
    items: Option<Vec<SerpItem>>,
}

#[derive(Debug, Deserialize)]
struct SerpItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    rank_group: Option<u32>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    items: Option<Vec<PaaElement>>,
}

#[derive(Debug, Deserialize)]
struct PaaElement {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OnPageTaskResult {
    #[serde(default)]
    items: Option<Vec<OnPageItem>>,
}

#[derive(Debug, Deserialize)]
struct OnPageItem {
    #[serde(default)]
    page_content: Option<PageContent>,
}

#[derive(Debug, Default, Deserialize)]
struct PageContent {
    #[serde(default)]
    main_topic: Option<Vec<Topic>>,
    #[serde(default)]
    secondary_topic: Option<Vec<Topic>>,
}

#[derive(Debug, Deserialize)]
struct Topic {
    #[serde(default)]
    h_title: Option<String>,
    #[serde(default)]
    level: Option<u8>,
    #[serde(default)]
    primary_content: Option<Vec<TextBlock>>,
}

#[derive(Debug, Deserialize)]
struct TextBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct SerpTask<'a> {
    keyword: &'a str,
    location_name: &'a str,
    language_code: &'a str,
    depth: u32,
}

#[derive(Serialize)]
struct OnPageTask<'a> {
    url: &'a str,
}

pub struct DataForSeoClient {
    client: Client,
    api_base: String,
    login: String,
    password: String,
}

impl DataForSeoClient {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: API_BASE.to_string(),
            login: login.into(),
            password: password.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Send one task and return the raw response body
    async fn post<B: Serialize>(&self, path: &str, task: &B) -> Result<String> {
        let url = format!("{}{}", self.api_base, path);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.login, Some(&self.password))
            .json(&[task])
            .send()
            .await
            .with_context(|| format!("DataForSEO request to {} failed", path))?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            anyhow::bail!("DataForSEO returned HTTP {}: {}", status, text);
        }
        Ok(text)
    }
}

/// First task's results, or the first non-OK status as an error
fn unwrap_task<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let response: ApiResponse<T> =
        serde_json::from_str(body).context("DataForSEO response is not valid JSON")?;
    if response.status_code != STATUS_OK {
        anyhow::bail!(
            "DataForSEO error {}: {}",
            response.status_code,
            response.status_message
        );
    }
    let task = response
        .tasks
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("DataForSEO returned no task"))?;
    if task.status_code != STATUS_OK {
        anyhow::bail!(
            "DataForSEO task error {}: {}",
            task.status_code,
            task.status_message
        );
    }
    Ok(task.result.unwrap_or_default())
}

pub fn parse_serp_response(body: &str) -> Result<SerpResult> {
    let results: Vec<SerpTaskResult> = unwrap_task(body)?;
    let mut serp = SerpResult::default();

    for item in results.into_iter().flat_map(|r| r.items.unwrap_or_default()) {
        match item.kind.as_str() {
            "organic" => {
                if let (Some(url), Some(rank)) = (item.url, item.rank_group) {
                    serp.urls.push(RankedUrl { url, rank });
                }
            }
            "people_also_ask" => {
                serp.paa_questions.extend(
                    item.items
                        .unwrap_or_default()
                        .into_iter()
                        .filter_map(|q| q.title)
                        .filter(|q| !q.trim().is_empty()),
                );
            }
            _ => {}
        }
    }

    serp.urls.sort_by_key(|u| u.rank);
    Ok(serp)
}

pub fn parse_on_page_response(body: &str) -> Result<OnPageOutcome> {
    let results: Vec<OnPageTaskResult> = unwrap_task(body)?;
    let content = results
        .into_iter()
        .flat_map(|r| r.items.unwrap_or_default())
        .find_map(|item| item.page_content);

    let Some(content) = content else {
        return Ok(OnPageOutcome::Failed {
            reason: "no page content returned".to_string(),
        });
    };

    let mut elements = OnPageElements::default();
    let mut paragraphs = Vec::new();
    let topics = content
        .main_topic
        .unwrap_or_default()
        .into_iter()
        .chain(content.secondary_topic.unwrap_or_default());

    for topic in topics {
        if let Some(title) = topic.h_title.filter(|t| !t.trim().is_empty()) {
            match topic.level {
                Some(1) => elements.h1s.push(title.clone()),
                Some(2) => elements.h2s.push(title.clone()),
                Some(3) => elements.h3s.push(title.clone()),
                _ => {}
            }
            paragraphs.push(title);
        }
        paragraphs.extend(
            topic
                .primary_content
                .unwrap_or_default()
                .into_iter()
                .filter_map(|b| b.text)
                .filter(|t| !t.trim().is_empty()),
        );
    }

    elements.full_text = paragraphs.join("\n\n");
    elements.word_count = elements.full_text.split_whitespace().count() as u64;
    Ok(OnPageOutcome::from_legacy(elements))
}

#[async_trait]
impl RankingService for DataForSeoClient {
    async fn get_serp_urls(&self, keyword: &str, market: &MarketSettings) -> Result<SerpResult> {
        let task = SerpTask {
            keyword,
            location_name: &market.country,
            language_code: &market.serp_language,
            depth: SERP_DEPTH,
        };
        tracing::debug!(%keyword, location = %market.country, "fetching SERP");
        let body = self.post(SERP_PATH, &task).await?;
        parse_serp_response(&body)
    }
}

#[async_trait]
impl OnPageService for DataForSeoClient {
    async fn get_on_page_elements(&self, url: &str) -> Result<OnPageOutcome> {
        tracing::debug!(%url, "fetching on-page content");
        let body = self.post(ON_PAGE_PATH, &OnPageTask { url }).await?;
        parse_on_page_response(&body)
    }
}
