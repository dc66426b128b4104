//! Typed wrappers over the Tool Gateway
//!
//! Each method coerces the gateway's loosely-shaped result into the type
//! the pipeline expects. A result of the wrong shape is "no data": arrays
//! degrade to empty vecs, objects to defaults, strings to empty strings.

use super::{ServiceId, ToolGateway};
use scholarmatch_common::models::{CitationMetrics, FacultyCandidate, Publication, ScholarCandidate};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// Typed client set shared by all pipeline components
pub struct ToolSet {
    gateway: Arc<dyn ToolGateway>,
}

impl ToolSet {
    pub fn new(gateway: Arc<dyn ToolGateway>) -> Self {
        Self { gateway }
    }

    /// Web search returning result URLs.
    pub async fn search_web(&self, query: &str) -> Vec<String> {
        let result = self
            .gateway
            .invoke(ServiceId::Search, "search_web", json!({ "query": query }))
            .await;

        string_array(&result)
    }

    /// Faculty entries extracted from a directory page.
    ///
    /// Providers answer error conditions with an object instead of an
    /// array; both that and malformed entries degrade to no data.
    pub async fn search_faculty(
        &self,
        directory_url: &str,
        research_area: &str,
    ) -> Vec<FacultyCandidate> {
        let result = self
            .gateway
            .invoke(
                ServiceId::University,
                "search_faculty",
                json!({ "university_url": directory_url, "research_area": research_area }),
            )
            .await;

        let Some(entries) = result.as_array() else {
            if let Some(object) = result.as_object() {
                if !object.is_empty() {
                    let detail = object
                        .get("error")
                        .or_else(|| object.get("raw"))
                        .cloned()
                        .unwrap_or(Value::String("Unknown error".into()));
                    warn!(url = directory_url, detail = %detail, "Faculty search error");
                }
            }
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| serde_json::from_value::<FacultyCandidate>(entry.clone()).ok())
            .filter(|candidate| !candidate.name.is_empty())
            .collect()
    }

    /// Detail fields scraped from a professor's profile page.
    pub async fn get_professor_page(&self, url: &str) -> Value {
        self.gateway
            .invoke(
                ServiceId::University,
                "get_professor_page",
                json!({ "professor_url": url }),
            )
            .await
    }

    /// Broad scholar search by name; affiliation is optional because
    /// directory affiliation strings are often sparse.
    pub async fn search_scholar(
        &self,
        name: &str,
        affiliation: Option<&str>,
    ) -> Vec<ScholarCandidate> {
        let mut args = json!({ "name": name });
        if let Some(affiliation) = affiliation {
            args["affiliation"] = Value::String(affiliation.to_string());
        }

        let result = self
            .gateway
            .invoke(ServiceId::Scholar, "search_scholar", args)
            .await;

        result
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        serde_json::from_value::<ScholarCandidate>(entry.clone()).ok()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Recent publications for a scholar id.
    pub async fn get_publications(
        &self,
        author_id: &str,
        limit: usize,
        years: usize,
    ) -> Vec<Publication> {
        let result = self
            .gateway
            .invoke(
                ServiceId::Scholar,
                "get_publications",
                json!({ "scholar_id": author_id, "limit": limit, "years": years }),
            )
            .await;

        result
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value::<Publication>(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Citation metrics for a scholar id; zeros when unavailable.
    pub async fn get_citation_metrics(&self, author_id: &str) -> CitationMetrics {
        let result = self
            .gateway
            .invoke(
                ServiceId::Scholar,
                "get_citation_metrics",
                json!({ "scholar_id": author_id }),
            )
            .await;

        serde_json::from_value(result).unwrap_or_default()
    }

    /// Locate a Google Scholar profile URL for a name at a domain.
    pub async fn find_google_scholar_url(&self, name: &str, domain: &str) -> Option<String> {
        let result = self
            .gateway
            .invoke(
                ServiceId::Search,
                "find_google_scholar_url",
                json!({ "name": name, "domain": domain }),
            )
            .await;

        result
            .as_str()
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    }

    /// Scrape citation metrics from a Google Scholar profile.
    ///
    /// Returns the raw object so callers can detect the provider's
    /// `error` marker before trusting the numbers.
    pub async fn scrape_google_scholar_metrics(&self, url: &str) -> Value {
        self.gateway
            .invoke(
                ServiceId::Scholar,
                "scrape_google_scholar_metrics",
                json!({ "google_scholar_url": url }),
            )
            .await
    }

    /// Parse an uploaded CV into its structured sections.
    pub async fn parse_cv(&self, file_path: &str) -> Value {
        self.gateway
            .invoke(
                ServiceId::Document,
                "parse_cv",
                json!({ "file_path": file_path }),
            )
            .await
    }

    /// Free-text generation; empty string when the oracle is unavailable.
    pub async fn generate_text(&self, prompt: &str) -> String {
        let result = self
            .gateway
            .invoke(
                ServiceId::Oracle,
                "generate_text",
                json!({ "prompt": prompt }),
            )
            .await;

        result.as_str().unwrap_or_default().to_string()
    }
}

fn string_array(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
