//! Post-match citation backfill
//!
//! Best-effort enrichment of the final ranked matches only: locate a
//! Google Scholar profile when none is known, scrape its citation
//! metrics, and overwrite the match's metrics if the scrape succeeded.
//! Never changes match membership or order; every failure is swallowed
//! per item.

use crate::discovery::bare_domain;
use crate::tools::ToolSet;
use futures::future::join_all;
use scholarmatch_common::models::{CitationMetrics, MatchResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Backfills citation metrics for final matches
pub struct ScholarMetricsBackfill {
    tools: Arc<ToolSet>,
}

impl ScholarMetricsBackfill {
    pub fn new(tools: Arc<ToolSet>) -> Self {
        Self { tools }
    }

    /// Enrich all matches concurrently; the final set is at most ten
    /// items, so no admission limit is needed here.
    pub async fn enrich(&self, matches: &mut [MatchResult], university: &str) {
        let domain = bare_domain(university);
        join_all(
            matches
                .iter_mut()
                .map(|entry| self.enrich_one(entry, &domain)),
        )
        .await;
    }

    async fn enrich_one(&self, entry: &mut MatchResult, domain: &str) {
        if entry.professor.google_scholar_url.is_none() {
            if let Some(url) = self
                .tools
                .find_google_scholar_url(&entry.professor.name, domain)
                .await
            {
                entry.professor.google_scholar_url = Some(url);
            }
        }

        let Some(url) = entry.professor.google_scholar_url.clone() else {
            return;
        };

        let scraped = self.tools.scrape_google_scholar_metrics(&url).await;
        let Some(metrics) = scraped.as_object() else {
            return;
        };
        // Failure sentinel ({}) and explicit error markers leave the
        // previous metrics untouched.
        if metrics.is_empty() || metrics.contains_key("error") {
            debug!(
                name = entry.professor.name.as_str(),
                "Citation scrape yielded no usable metrics"
            );
            return;
        }

        entry.professor.citation_metrics = Some(CitationMetrics {
            h_index: metrics
                .get("h_index")
                .and_then(Value::as_i64)
                .unwrap_or(0) as i32,
            i10_index: metrics
                .get("i10_index")
                .and_then(Value::as_i64)
                .unwrap_or(0) as i32,
            total_citations: metrics
                .get("total_citations")
                .and_then(Value::as_i64)
                .unwrap_or(0),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::MockToolGateway;
    use chrono::Utc;
    use scholarmatch_common::models::ProfessorProfile;
    use serde_json::json;
    use uuid::Uuid;

    fn match_for(name: &str, score: f64, scholar_url: Option<&str>) -> MatchResult {
        MatchResult {
            professor: ProfessorProfile {
                id: Uuid::new_v4(),
                name: name.to_string(),
                title: None,
                department: None,
                university: "mit.edu".into(),
                email: None,
                scholar_id: None,
                google_scholar_url: scholar_url.map(str::to_string),
                research_areas: vec![],
                publications: vec![],
                citation_metrics: Some(CitationMetrics::default()),
                last_updated: Utc::now(),
            },
            match_score: score,
            alignment_reasons: vec![],
            relevant_publications: vec![],
            shared_keywords: vec![],
            recommendation_text: String::new(),
        }
    }

    fn backfill_with(gateway: MockToolGateway) -> ScholarMetricsBackfill {
        ScholarMetricsBackfill::new(Arc::new(ToolSet::new(Arc::new(gateway))))
    }

    #[tokio::test]
    async fn discovers_url_then_overwrites_metrics() {
        let gateway = MockToolGateway::new()
            .with_response(
                "find_google_scholar_url",
                json!("https://scholar.google.com/citations?user=jd"),
            )
            .with_response(
                "scrape_google_scholar_metrics",
                json!({"h_index": 42, "total_citations": 9001}),
            );
        let backfill = backfill_with(gateway);

        let mut matches = vec![match_for("Jane Doe", 90.0, None)];
        backfill.enrich(&mut matches, "mit.edu").await;

        let metrics = matches[0].professor.citation_metrics.unwrap();
        assert_eq!(metrics.h_index, 42);
        assert_eq!(metrics.total_citations, 9001);
        assert!(matches[0].professor.google_scholar_url.is_some());
    }

    #[tokio::test]
    async fn error_marker_leaves_existing_metrics_untouched() {
        let gateway = MockToolGateway::new().with_response(
            "scrape_google_scholar_metrics",
            json!({"error": "profile blocked"}),
        );
        let backfill = backfill_with(gateway);

        let mut matches = vec![match_for(
            "Jane Doe",
            90.0,
            Some("https://scholar.google.com/citations?user=jd"),
        )];
        backfill.enrich(&mut matches, "mit.edu").await;

        assert_eq!(
            matches[0].professor.citation_metrics,
            Some(CitationMetrics::default())
        );
    }

    #[tokio::test]
    async fn failures_never_change_membership_or_order() {
        // Every tool call fails (sentinel responses).
        let backfill = backfill_with(MockToolGateway::new());

        let mut matches = vec![
            match_for("B", 90.0, None),
            match_for("A", 50.0, Some("https://scholar.google.com/citations?user=a")),
        ];
        backfill.enrich(&mut matches, "mit.edu").await;

        let names: Vec<&str> = matches
            .iter()
            .map(|m| m.professor.name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(
            matches[1].professor.citation_metrics,
            Some(CitationMetrics::default())
        );
    }
}
