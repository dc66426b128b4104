//! Student profile construction
//!
//! Parses uploaded documents (CVs) through the document tool provider and
//! merges the extracted sections with the student's stated interests.
//! Documents parse concurrently; an unreadable or unresolvable file is
//! skipped without affecting the others.

use crate::tools::ToolSet;
use futures::future::join_all;
use scholarmatch_common::models::{
    value_to_i32, value_to_string, value_to_string_list, Education, Experience, Publication,
    StudentProfile,
};
use scholarmatch_common::storage::FileStorage;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Builds a student profile from uploaded documents
pub struct DocumentParser {
    tools: Arc<ToolSet>,
    storage: FileStorage,
}

impl DocumentParser {
    pub fn new(tools: Arc<ToolSet>, storage: FileStorage) -> Self {
        Self { tools, storage }
    }

    /// Parse all of a session's documents and fold them into one profile.
    pub async fn parse(
        &self,
        session_id: &str,
        file_ids: &[String],
        research_interests: &[String],
    ) -> StudentProfile {
        let parsed = join_all(file_ids.iter().map(|file_id| async move {
            let path = self.storage.resolve(session_id, file_id).await?;
            Some(self.tools.parse_cv(&path.to_string_lossy()).await)
        }))
        .await;

        let mut education = Vec::new();
        let mut experience = Vec::new();
        let mut publications = Vec::new();
        let mut skills = Vec::new();
        let mut extracted_keywords: Vec<String> = research_interests.to_vec();

        for cv in parsed.into_iter().flatten() {
            if !cv.is_object() {
                continue;
            }

            for entry in object_entries(&cv, "education") {
                education.push(Education {
                    institution: field_string(entry, "institution"),
                    degree: field_string(entry, "degree"),
                    field: optional_field_string(entry, "field"),
                    year: nonzero(field_i32(entry, "year")),
                });
            }

            for entry in object_entries(&cv, "experience") {
                experience.push(Experience {
                    organization: field_string(entry, "organization"),
                    role: field_string(entry, "role"),
                    description: optional_field_string(entry, "description"),
                    start_year: nonzero(field_i32(entry, "start_year")),
                    end_year: nonzero(field_i32(entry, "end_year")),
                });
            }

            for entry in object_entries(&cv, "publications") {
                publications.push(Publication {
                    title: field_string(entry, "title"),
                    authors: field_string_list(entry, "authors"),
                    year: field_i32(entry, "year"),
                    venue: optional_field_string(entry, "venue"),
                    abstract_text: None,
                    citation_count: 0,
                    url: None,
                });
            }

            if let Some(raw_skills) = cv.get("skills") {
                skills.extend(value_to_string_list(raw_skills));
            }
            if let Some(raw_interests) = cv.get("research_interests") {
                extracted_keywords.extend(value_to_string_list(raw_interests));
            }
        }

        let profile = StudentProfile {
            session_id: Uuid::new_v4(),
            stated_interests: research_interests.to_vec(),
            education,
            experience,
            publications,
            skills: dedup_preserving_order(skills),
            extracted_keywords: dedup_preserving_order(extracted_keywords),
        };

        info!(
            education = profile.education.len(),
            publications = profile.publications.len(),
            keywords = profile.extracted_keywords.len(),
            "Student profile assembled"
        );
        profile
    }
}

fn object_entries<'a>(cv: &'a Value, section: &str) -> Vec<&'a Value> {
    cv.get(section)
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter(|entry| entry.is_object()).collect())
        .unwrap_or_default()
}

fn field_string(entry: &Value, field: &str) -> String {
    entry
        .get(field)
        .and_then(value_to_string)
        .unwrap_or_default()
}

fn optional_field_string(entry: &Value, field: &str) -> Option<String> {
    entry.get(field).and_then(value_to_string)
}

fn field_string_list(entry: &Value, field: &str) -> Vec<String> {
    entry.get(field).map(value_to_string_list).unwrap_or_default()
}

fn field_i32(entry: &Value, field: &str) -> i32 {
    entry.get(field).map(value_to_i32).unwrap_or(0)
}

fn nonzero(year: i32) -> Option<i32> {
    (year != 0).then_some(year)
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| !value.is_empty() && seen.insert(value.clone()))
        .collect()
}
