//! Domain models for the matching pipeline
//!
//! Covers the full lifecycle of a matching run: discovered faculty
//! candidates, scholar-graph candidates used for disambiguation, enriched
//! professor profiles, the student profile built from uploaded documents,
//! ranked match results, and the per-session run state polled by callers.

mod coerce;

pub use coerce::{value_to_i32, value_to_string, value_to_string_list};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Academic publication attached to a professor profile.
///
/// Immutable once attached; `citation_count` defaults to zero when the
/// scholarly source omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub citation_count: i64,
    #[serde(default)]
    pub url: Option<String>,
}

/// Point-in-time citation snapshot; always replaceable by a fresher scrape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationMetrics {
    #[serde(default)]
    pub h_index: i32,
    #[serde(default)]
    pub i10_index: i32,
    #[serde(default)]
    pub total_citations: i64,
}

/// Enriched professor profile.
///
/// `(name, university)` is the natural key under which profiles are cached;
/// a cached record older than the TTL is treated as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessorProfile {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub university: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub scholar_id: Option<String>,
    #[serde(default)]
    pub google_scholar_url: Option<String>,
    #[serde(default)]
    pub research_areas: Vec<String>,
    #[serde(default)]
    pub publications: Vec<Publication>,
    #[serde(default)]
    pub citation_metrics: Option<CitationMetrics>,
    pub last_updated: DateTime<Utc>,
}

/// Unresolved faculty directory entry produced by Discovery.
///
/// `name` is the dedup key; entries without a non-empty name are discarded
/// at the discovery boundary. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacultyCandidate {
    pub name: String,
    pub title: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub profile_url: Option<String>,
}

/// Scholar-graph search hit, used only for affiliation disambiguation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScholarCandidate {
    pub author_id: String,
    pub name: String,
    pub affiliations: Vec<String>,
}

/// Education entry extracted from a CV.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub year: Option<i32>,
}

/// Work or research experience entry extracted from a CV.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub organization: String,
    pub role: String,
    pub description: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

/// Student profile derived from stated interests and uploaded documents.
///
/// Built once per matching run and handed to the ranker; never persisted
/// independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentProfile {
    pub session_id: Uuid,
    pub stated_interests: Vec<String>,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub publications: Vec<Publication>,
    pub skills: Vec<String>,
    /// Deduplicated merge of stated interests and document-extracted ones.
    pub extracted_keywords: Vec<String>,
}

/// Ranked professor match with the oracle's explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub professor: ProfessorProfile,
    pub match_score: f64,
    #[serde(default)]
    pub alignment_reasons: Vec<String>,
    /// Subset of the professor's own publications selected as relevant.
    #[serde(default)]
    pub relevant_publications: Vec<Publication>,
    #[serde(default)]
    pub shared_keywords: Vec<String>,
    #[serde(default)]
    pub recommendation_text: String,
}

/// Terminal and in-flight states of a matching run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Idle,
    Processing,
    Completed,
    Failed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Idle => "idle",
            MatchStatus::Processing => "processing",
            MatchStatus::Completed => "completed",
            MatchStatus::Failed => "failed",
        }
    }

    /// Whether the run has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Failed)
    }
}

/// Per-session matching run state, persisted after every milestone so a
/// concurrently polling caller observes monotonic progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSession {
    pub match_id: Option<String>,
    pub university: Option<String>,
    pub research_interests: Vec<String>,
    pub file_ids: Vec<String>,
    pub match_status: MatchStatus,
    pub match_progress: u8,
    pub current_step: Option<String>,
    pub match_results: Vec<MatchResult>,
    pub match_start_time: Option<DateTime<Utc>>,
    pub total_match_time_secs: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl MatchSession {
    /// Fresh session with a creation timestamp and idle run state.
    pub fn new() -> Self {
        Self {
            created_at: Some(Utc::now()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faculty_candidate_tolerates_missing_fields() {
        let value = serde_json::json!({"name": "Ada Lovelace", "extra": 42});
        let candidate: FacultyCandidate = serde_json::from_value(value).unwrap();
        assert_eq!(candidate.name, "Ada Lovelace");
        assert!(candidate.title.is_none());
    }

    #[test]
    fn publication_abstract_round_trips_under_wire_name() {
        let value = serde_json::json!({
            "title": "Attention Is All You Need",
            "authors": ["Vaswani"],
            "year": 2017,
            "abstract": "The dominant sequence transduction models..."
        });
        let publication: Publication = serde_json::from_value(value).unwrap();
        assert!(publication.abstract_text.is_some());
        assert_eq!(publication.citation_count, 0);

        let back = serde_json::to_value(&publication).unwrap();
        assert!(back.get("abstract").is_some());
    }

    #[test]
    fn match_status_serializes_snake_case() {
        let status = serde_json::to_value(MatchStatus::Processing).unwrap();
        assert_eq!(status, serde_json::json!("processing"));
        assert!(MatchStatus::Failed.is_terminal());
        assert!(!MatchStatus::Processing.is_terminal());
    }
}
