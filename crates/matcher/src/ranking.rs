//! Match ranking
//!
//! Builds one structured prompt from the enriched profiles plus the
//! optional student profile, asks the oracle for scored matches, and
//! resolves the answer back against the professor set. A ranking failure
//! degrades to "no matches" and never aborts the pipeline.

use crate::tools::ToolSet;
use scholarmatch_common::json::extract_json_array;
use scholarmatch_common::models::{
    value_to_string_list, MatchResult, ProfessorProfile, StudentProfile,
};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Ranks enriched professors against the student's interests
pub struct MatchRanker {
    tools: Arc<ToolSet>,
    max_matches: usize,
}

impl MatchRanker {
    pub fn new(tools: Arc<ToolSet>, max_matches: usize) -> Self {
        Self { tools, max_matches }
    }

    /// Produce ranked matches, descending by score (stable order for
    /// ties). Empty input or an unusable oracle answer yields no matches.
    pub async fn rank(
        &self,
        professors: &[ProfessorProfile],
        research_interests: &[String],
        student: Option<&StudentProfile>,
    ) -> Vec<MatchResult> {
        if professors.is_empty() {
            return Vec::new();
        }

        let prompt = self.build_prompt(professors, research_interests, student);
        let response = self.tools.generate_text(&prompt).await;
        let matches = self.parse_matches(&response, professors);

        if matches.is_empty() {
            warn!("Ranking produced no resolvable matches");
        } else {
            info!(count = matches.len(), "Ranking produced matches");
        }
        matches
    }

    fn build_prompt(
        &self,
        professors: &[ProfessorProfile],
        research_interests: &[String],
        student: Option<&StudentProfile>,
    ) -> String {
        let interests = research_interests.join(", ");

        let student_context = student
            .map(|profile| {
                format!(
                    "\nStudent Background:\n\
                     - Education: {}\n\
                     - Skills: {}\n\
                     - Publications: {} papers\n\
                     - Keywords: {}\n",
                    serde_json::to_string(&profile.education)
                        .unwrap_or_else(|_| "[]".to_string()),
                    profile.skills.join(", "),
                    profile.publications.len(),
                    profile
                        .extracted_keywords
                        .iter()
                        .take(10)
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
            .unwrap_or_default();

        let summaries: Vec<Value> = professors
            .iter()
            .map(|professor| {
                json!({
                    "id": professor.id.to_string(),
                    "name": professor.name,
                    "title": professor.title,
                    "department": professor.department,
                    "research_areas": professor.research_areas.iter().take(5).collect::<Vec<_>>(),
                    "recent_papers": professor
                        .publications
                        .iter()
                        .take(5)
                        .map(|publication| publication.title.as_str())
                        .collect::<Vec<_>>(),
                    "h_index": professor
                        .citation_metrics
                        .map(|metrics| metrics.h_index)
                        .unwrap_or(0),
                })
            })
            .collect();
        let summaries_json =
            serde_json::to_string_pretty(&summaries).unwrap_or_else(|_| "[]".to_string());

        format!(
            "Analyze professors and rank by research alignment with student interests.\n\n\
             Student Research Interests: {}\n{}\n\
             Professors:\n{}\n\n\
             Return JSON array (top {} max) with:\n\
             - professor_id: string\n\
             - match_score: number (0-100)\n\
             - alignment_reasons: string[] (2-3 specific reasons why this professor is a good match)\n\
             - relevant_publication_titles: string[] (select publications that the student could cite or build upon for their research)\n\
             - shared_keywords: string[] (research topics/keywords shared between student interests and professor's work)\n\
             - recommendation_text: string (2-3 sentences explaining why this professor would be valuable for the student's research)\n\n\
             Return ONLY valid JSON array, no other text.",
            interests, student_context, summaries_json, self.max_matches
        )
    }

    fn parse_matches(&self, response: &str, professors: &[ProfessorProfile]) -> Vec<MatchResult> {
        let Some(Value::Array(entries)) = extract_json_array(response) else {
            return Vec::new();
        };

        let by_id: HashMap<String, &ProfessorProfile> = professors
            .iter()
            .map(|professor| (professor.id.to_string(), professor))
            .collect();

        let mut matches = Vec::new();
        for entry in entries.iter().take(self.max_matches) {
            let Some(professor) = entry
                .get("professor_id")
                .and_then(Value::as_str)
                .and_then(|id| by_id.get(id))
            else {
                continue;
            };

            let relevant_titles: HashSet<&str> = entry
                .get("relevant_publication_titles")
                .and_then(Value::as_array)
                .map(|titles| titles.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let relevant_publications = professor
                .publications
                .iter()
                .filter(|publication| relevant_titles.contains(publication.title.as_str()))
                .cloned()
                .collect();

            matches.push(MatchResult {
                professor: (*professor).clone(),
                match_score: entry
                    .get("match_score")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0),
                alignment_reasons: entry
                    .get("alignment_reasons")
                    .map(value_to_string_list)
                    .unwrap_or_default(),
                relevant_publications,
                shared_keywords: entry
                    .get("shared_keywords")
                    .map(value_to_string_list)
                    .unwrap_or_default(),
                recommendation_text: entry
                    .get("recommendation_text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        // Vec::sort_by is stable: ties keep the oracle's relative order.
        matches.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(Ordering::Equal)
        });
        matches
    }
}
