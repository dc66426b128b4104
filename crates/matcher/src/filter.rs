//! Relevance pre-filter
//!
//! Shrinks an oversized candidate list before the per-candidate
//! enrichment fan-out. The oracle selects by index from a compact
//! summary; when its answer is unusable the filter falls back to the
//! first N candidates in original order.

use crate::tools::ToolSet;
use scholarmatch_common::json::extract_json_array;
use scholarmatch_common::models::FacultyCandidate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Caps candidate lists via an oracle ranking call
pub struct RelevanceFilter {
    tools: Arc<ToolSet>,
    max_candidates: usize,
}

impl RelevanceFilter {
    pub fn new(tools: Arc<ToolSet>, max_candidates: usize) -> Self {
        Self {
            tools,
            max_candidates,
        }
    }

    /// Identity for lists at or under the cap.
    pub async fn apply(
        &self,
        mut candidates: Vec<FacultyCandidate>,
        research_interests: &[String],
    ) -> Vec<FacultyCandidate> {
        if candidates.len() <= self.max_candidates {
            return candidates;
        }

        let prompt = self.build_prompt(&candidates, research_interests);
        let response = self.tools.generate_text(&prompt).await;

        if let Some(Value::Array(indices)) = extract_json_array(&response) {
            let selected: Vec<FacultyCandidate> = indices
                .iter()
                .filter_map(Value::as_u64)
                .map(|index| index as usize)
                .filter(|index| *index < candidates.len())
                .map(|index| candidates[index].clone())
                .collect();

            if !selected.is_empty() {
                info!(
                    from = candidates.len(),
                    to = selected.len(),
                    "Relevance filter selected candidates"
                );
                return selected;
            }
        }

        warn!(
            keep = self.max_candidates,
            "Relevance filtering failed, falling back to first candidates"
        );
        candidates.truncate(self.max_candidates);
        candidates
    }

    fn build_prompt(
        &self,
        candidates: &[FacultyCandidate],
        research_interests: &[String],
    ) -> String {
        let interests = research_interests.join(", ");

        let summaries: Vec<String> = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                let name = if candidate.name.is_empty() {
                    "Unknown"
                } else {
                    candidate.name.as_str()
                };
                let mut parts = vec![format!("[{}] {}", index, name)];
                if let Some(title) = &candidate.title {
                    parts.push(format!("- {}", title));
                }
                if let Some(department) = &candidate.department {
                    parts.push(format!("({})", department));
                }
                parts.join(" ")
            })
            .collect();

        format!(
            "From this faculty list, select the {} professors most likely to research: {}\n\n\
             Faculty:\n{}\n\n\
             Return ONLY a JSON array of the index numbers (e.g. [0, 3, 7, ...]). No other text.",
            self.max_candidates,
            interests,
            summaries.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::MockToolGateway;
    use serde_json::json;

    fn candidates(count: usize) -> Vec<FacultyCandidate> {
        (0..count)
            .map(|i| FacultyCandidate {
                name: format!("Professor {}", i),
                ..Default::default()
            })
            .collect()
    }

    fn filter_with(gateway: MockToolGateway) -> RelevanceFilter {
        RelevanceFilter::new(Arc::new(ToolSet::new(Arc::new(gateway))), 30)
    }

    #[tokio::test]
    async fn lists_at_or_under_cap_pass_through_unchanged() {
        let gateway = Arc::new(MockToolGateway::new());
        let filter = RelevanceFilter::new(Arc::new(ToolSet::new(gateway.clone())), 30);

        let input = candidates(30);
        let output = filter.apply(input.clone(), &["ml".to_string()]).await;

        assert_eq!(output, input);
        assert_eq!(gateway.call_count("generate_text"), 0);
    }

    #[tokio::test]
    async fn oracle_indices_select_candidates() {
        let gateway = MockToolGateway::new().with_response(
            "generate_text",
            json!("Selected professors: [2, 0, 40] done"),
        );
        let filter = filter_with(gateway);

        let output = filter.apply(candidates(35), &["ml".to_string()]).await;

        let names: Vec<&str> = output.iter().map(|c| c.name.as_str()).collect();
        // Index 40 is out of range and silently dropped.
        assert_eq!(names, vec!["Professor 2", "Professor 0"]);
    }

    #[tokio::test]
    async fn unparsable_response_falls_back_to_first_30() {
        let gateway = MockToolGateway::new()
            .with_response("generate_text", json!("I cannot rank these professors."));
        let filter = filter_with(gateway);

        let output = filter.apply(candidates(45), &["ml".to_string()]).await;

        assert_eq!(output.len(), 30);
        assert_eq!(output[0].name, "Professor 0");
        assert_eq!(output[29].name, "Professor 29");
    }

    #[tokio::test]
    async fn empty_selection_falls_back_to_first_30() {
        let gateway =
            MockToolGateway::new().with_response("generate_text", json!("indices: []"));
        let filter = filter_with(gateway);

        let output = filter.apply(candidates(31), &["ml".to_string()]).await;
        assert_eq!(output.len(), 30);
    }
}
