//! Profile enrichment
//!
//! Resolves each faculty candidate into a full professor profile:
//! cache-first lookup, broad scholar search, affiliation-based
//! disambiguation, publication fetch, research-area derivation, and a
//! cache upsert. The fan-out is admission-limited by a semaphore; a
//! failing candidate is dropped without affecting its siblings.

use crate::discovery::bare_domain;
use crate::tools::ToolSet;
use chrono::Utc;
use futures::future::join_all;
use scholarmatch_common::cache::ProfessorCache;
use scholarmatch_common::config::MatchingConfig;
use scholarmatch_common::errors::{AppError, Result};
use scholarmatch_common::json::extract_json_array;
use scholarmatch_common::models::{
    value_to_string, value_to_string_list, CitationMetrics, FacultyCandidate, ProfessorProfile,
    Publication, ScholarCandidate,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Host tokens that carry no institutional signal
const DOMAIN_STOPWORDS: &[&str] = &[
    "www", "ac", "za", "edu", "uk", "us", "com", "org", "net", "depts", "dept",
];

/// Title tokens ignored by the keyword-frequency fallback
const TITLE_STOPWORDS: &[&str] = &[
    "about", "analysis", "approach", "based", "between", "case", "data", "from", "into",
    "method", "methods", "novel", "over", "paper", "study", "studies", "that", "their",
    "these", "this", "through", "toward", "towards", "under", "using", "what", "when",
    "where", "which", "with", "within",
];

/// Institutional keywords derived from the university host.
///
/// Split on `.`, drop generic TLD/infrastructure tokens and anything of
/// two characters or less; what remains identifies the institution in
/// affiliation strings.
pub fn domain_keywords(university: &str) -> Vec<String> {
    bare_domain(university)
        .to_lowercase()
        .split('.')
        .filter(|part| !DOMAIN_STOPWORDS.contains(part) && part.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Pick the scholar candidate whose affiliation mentions the university.
///
/// Falls back to the first search result when nothing matches; never
/// returns `None` while candidates exist.
pub fn disambiguate<'a>(
    candidates: &'a [ScholarCandidate],
    keywords: &[String],
) -> Option<&'a ScholarCandidate> {
    if candidates.is_empty() {
        return None;
    }

    for candidate in candidates {
        for affiliation in &candidate.affiliations {
            let affiliation = affiliation.to_lowercase();
            if keywords.iter().any(|keyword| affiliation.contains(keyword)) {
                return Some(candidate);
            }
        }
    }

    Some(&candidates[0])
}

/// Deterministic research-area fallback: rank publication-title tokens by
/// frequency after scrubbing punctuation, short tokens, and stopwords.
pub fn keyword_research_areas(publications: &[Publication]) -> Vec<String> {
    let scrub = regex_lite::Regex::new(r"[^a-z0-9\s]").expect("static pattern");

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for publication in publications {
        let lowered = publication.title.to_lowercase();
        let cleaned = scrub.replace_all(&lowered, " ");
        for token in cleaned.split_whitespace() {
            if token.len() <= 3 || TITLE_STOPWORDS.contains(&token) {
                continue;
            }
            let entry = counts.entry(token.to_string()).or_insert(0);
            if *entry == 0 {
                order.push(token.to_string());
            }
            *entry += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = order
        .into_iter()
        .enumerate()
        .map(|(first_seen, token)| {
            let count = counts[&token];
            (token, count, first_seen)
        })
        .collect();
    // Highest frequency first; first occurrence breaks ties deterministically.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(10)
        .map(|(token, _, _)| token)
        .collect()
}

/// Enriches faculty candidates into professor profiles
#[derive(Clone)]
pub struct ProfileEnricher {
    tools: Arc<ToolSet>,
    cache: Arc<dyn ProfessorCache>,
    config: MatchingConfig,
}

impl ProfileEnricher {
    pub fn new(
        tools: Arc<ToolSet>,
        cache: Arc<dyn ProfessorCache>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            tools,
            cache,
            config,
        }
    }

    /// Concurrency-bounded enrichment of the whole candidate list.
    ///
    /// Failed or panicked candidates are logged and dropped; the output
    /// preserves input order for the survivors.
    #[instrument(skip(self, candidates), fields(count = candidates.len()))]
    pub async fn enrich_all(
        &self,
        candidates: Vec<FacultyCandidate>,
        university: &str,
    ) -> Vec<ProfessorProfile> {
        let keywords = Arc::new(domain_keywords(university));
        let semaphore = Arc::new(Semaphore::new(self.config.enrichment_concurrency.max(1)));

        let handles: Vec<_> = candidates
            .into_iter()
            .map(|candidate| {
                let enricher = self.clone();
                let university = university.to_string();
                let keywords = Arc::clone(&keywords);
                let semaphore = Arc::clone(&semaphore);

                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.map_err(|_| {
                        AppError::Internal {
                            message: "enrichment limiter closed".to_string(),
                        }
                    })?;
                    enricher.enrich_one(candidate, &university, &keywords).await
                })
            })
            .collect();

        let mut professors = Vec::new();
        for joined in join_all(handles).await {
            match joined {
                Ok(Ok(Some(profile))) => professors.push(profile),
                Ok(Ok(None)) => {}
                Ok(Err(error)) => warn!(error = %error, "Candidate enrichment dropped"),
                Err(join_error) => warn!(error = %join_error, "Enrichment task aborted"),
            }
        }
        professors
    }

    /// Enrich a single candidate.
    pub async fn enrich_one(
        &self,
        candidate: FacultyCandidate,
        university: &str,
        domain_keywords: &[String],
    ) -> Result<Option<ProfessorProfile>> {
        let name = candidate.name.clone();
        if name.is_empty() {
            return Ok(None);
        }

        if let Some(cached) = self.cache.get(&name, university).await? {
            debug!(name = name.as_str(), "Professor served from cache");
            return Ok(Some(cached));
        }

        // Broad search by name only; affiliation strings from directories
        // are too sparse to qualify the query.
        let scholars = self.tools.search_scholar(&name, None).await;

        let profile = match disambiguate(&scholars, domain_keywords) {
            Some(scholar) => {
                self.build_scholar_profile(&candidate, university, scholar)
                    .await
            }
            None => self.build_minimal_profile(&candidate, university).await,
        };

        self.cache.upsert(&profile).await?;
        Ok(Some(profile))
    }

    /// Profile for a disambiguated scholar: publications plus derived
    /// research areas. Citation metrics start zeroed; the post-match
    /// backfill replaces them for the final matches only.
    async fn build_scholar_profile(
        &self,
        candidate: &FacultyCandidate,
        university: &str,
        scholar: &ScholarCandidate,
    ) -> ProfessorProfile {
        let scholar_id = (!scholar.author_id.is_empty()).then(|| scholar.author_id.clone());

        let publications = match &scholar_id {
            Some(id) => {
                self.tools
                    .get_publications(
                        id,
                        self.config.publications_limit,
                        self.config.publications_years,
                    )
                    .await
            }
            None => Vec::new(),
        };

        let research_areas = self.extract_research_areas(&publications).await;

        ProfessorProfile {
            id: Uuid::new_v4(),
            name: candidate.name.clone(),
            title: candidate.title.clone(),
            department: candidate.department.clone(),
            university: university.to_string(),
            email: candidate.email.clone(),
            scholar_id,
            google_scholar_url: None,
            research_areas,
            publications,
            citation_metrics: Some(CitationMetrics::default()),
            last_updated: Utc::now(),
        }
    }

    /// Best-effort profile when no scholar record exists: optionally pull
    /// the faculty page for whatever detail it yields.
    async fn build_minimal_profile(
        &self,
        candidate: &FacultyCandidate,
        university: &str,
    ) -> ProfessorProfile {
        let page = match &candidate.profile_url {
            Some(url) => self.tools.get_professor_page(url).await,
            None => Value::Null,
        };

        let page_field = |field: &str| page.get(field).and_then(value_to_string);
        let research_areas = page
            .get("research_areas")
            .map(value_to_string_list)
            .unwrap_or_default();

        ProfessorProfile {
            id: Uuid::new_v4(),
            name: candidate.name.clone(),
            title: candidate.title.clone().or_else(|| page_field("title")),
            department: candidate
                .department
                .clone()
                .or_else(|| page_field("department")),
            university: university.to_string(),
            email: candidate.email.clone().or_else(|| page_field("email")),
            scholar_id: None,
            google_scholar_url: None,
            research_areas,
            publications: Vec::new(),
            citation_metrics: None,
            last_updated: Utc::now(),
        }
    }

    /// Research areas from publication titles: oracle summarization with
    /// the keyword-frequency fallback when the answer is unusable.
    async fn extract_research_areas(&self, publications: &[Publication]) -> Vec<String> {
        if publications.is_empty() {
            return Vec::new();
        }

        let titles: Vec<String> = publications
            .iter()
            .take(15)
            .map(|publication| format!("- {}", publication.title))
            .collect();

        let prompt = format!(
            "From these publication titles, extract 3-7 research areas/topics.\n\
             Return short, specific phrases (e.g. \"computer vision\", \"natural language processing\", \"reinforcement learning\").\n\n\
             Publications:\n{}\n\n\
             Return ONLY a JSON array of strings. No other text.",
            titles.join("\n")
        );

        let response = self.tools.generate_text(&prompt).await;
        if let Some(Value::Array(areas)) = extract_json_array(&response) {
            let areas: Vec<String> = areas
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .take(7)
                .collect();
            if !areas.is_empty() {
                return areas;
            }
        }

        keyword_research_areas(publications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::MockToolGateway;
    use scholarmatch_common::cache::MemoryProfessorCache;
    use serde_json::json;

    fn scholar(author_id: &str, affiliations: &[&str]) -> ScholarCandidate {
        ScholarCandidate {
            author_id: author_id.to_string(),
            name: "Jane Doe".to_string(),
            affiliations: affiliations.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn candidate(name: &str) -> FacultyCandidate {
        FacultyCandidate {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn enricher_with(
        gateway: MockToolGateway,
        cache: Arc<MemoryProfessorCache>,
    ) -> ProfileEnricher {
        ProfileEnricher::new(
            Arc::new(ToolSet::new(Arc::new(gateway))),
            cache,
            MatchingConfig::default(),
        )
    }

    fn test_cache() -> Arc<MemoryProfessorCache> {
        Arc::new(MemoryProfessorCache::new(chrono::Duration::days(7)))
    }

    #[test]
    fn domain_keywords_drop_stopwords_and_short_tokens() {
        assert_eq!(
            domain_keywords("https://www.cs.wits.ac.za"),
            vec!["wits".to_string()]
        );
        assert_eq!(domain_keywords("mit.edu"), vec!["mit".to_string()]);
        assert_eq!(
            domain_keywords("https://depts.washington.edu"),
            vec!["washington".to_string()]
        );
    }

    #[test]
    fn disambiguation_prefers_affiliation_match() {
        let candidates = vec![
            scholar("a1", &["Stanford University"]),
            scholar("a2", &["Massachusetts Institute of Technology (MIT)"]),
        ];
        let keywords = vec!["mit".to_string()];

        let chosen = disambiguate(&candidates, &keywords).unwrap();
        assert_eq!(chosen.author_id, "a2");
    }

    #[test]
    fn disambiguation_never_returns_none_when_candidates_exist() {
        let candidates = vec![scholar("a1", &["Unrelated Institute"]), scholar("a2", &[])];
        let keywords = vec!["mit".to_string()];

        let chosen = disambiguate(&candidates, &keywords).unwrap();
        assert_eq!(chosen.author_id, "a1");

        assert!(disambiguate(&[], &keywords).is_none());
    }

    #[test]
    fn keyword_fallback_ranks_by_frequency() {
        let publications: Vec<Publication> = [
            "Deep learning for robotics",
            "Robotics and control: a survey",
            "Deep networks in robotics",
        ]
        .iter()
        .map(|title| Publication {
            title: title.to_string(),
            authors: vec![],
            year: 2020,
            venue: None,
            abstract_text: None,
            citation_count: 0,
            url: None,
        })
        .collect();

        let areas = keyword_research_areas(&publications);
        assert_eq!(areas[0], "robotics");
        assert_eq!(areas[1], "deep");
        assert!(areas.iter().all(|a| a.len() > 3));
        // Deterministic across runs.
        assert_eq!(areas, keyword_research_areas(&publications));
    }

    #[tokio::test]
    async fn cache_hit_skips_scholar_search() {
        let cache = test_cache();
        let cached = ProfessorProfile {
            id: Uuid::new_v4(),
            name: "Jane Doe".into(),
            title: None,
            department: None,
            university: "mit.edu".into(),
            email: None,
            scholar_id: Some("a2".into()),
            google_scholar_url: None,
            research_areas: vec!["robotics".into()],
            publications: vec![],
            citation_metrics: None,
            last_updated: Utc::now(),
        };
        cache.upsert(&cached).await.unwrap();

        let gateway = Arc::new(MockToolGateway::new());
        let enricher = ProfileEnricher::new(
            Arc::new(ToolSet::new(gateway.clone())),
            cache,
            MatchingConfig::default(),
        );

        let profile = enricher
            .enrich_one(candidate("Jane Doe"), "mit.edu", &["mit".to_string()])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(profile.scholar_id.as_deref(), Some("a2"));
        assert_eq!(gateway.call_count("search_scholar"), 0);
    }

    #[tokio::test]
    async fn matched_scholar_yields_publications_and_areas() {
        let gateway = MockToolGateway::new()
            .with_response(
                "search_scholar",
                json!([{"author_id": "a2", "name": "Jane Doe", "affiliations": ["MIT CSAIL"]}]),
            )
            .with_response(
                "get_publications",
                json!([
                    {"title": "Robot learning", "authors": ["Jane Doe"], "year": 2023, "citation_count": 10},
                    {"title": "Safe robot planning", "authors": ["Jane Doe"], "year": 2022}
                ]),
            )
            .with_response("generate_text", json!("[\"robot learning\", \"motion planning\"]"));
        let cache = test_cache();
        let enricher = enricher_with(gateway, cache.clone());

        let profile = enricher
            .enrich_one(candidate("Jane Doe"), "mit.edu", &["mit".to_string()])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(profile.scholar_id.as_deref(), Some("a2"));
        assert_eq!(profile.publications.len(), 2);
        assert_eq!(
            profile.research_areas,
            vec!["robot learning".to_string(), "motion planning".to_string()]
        );
        assert_eq!(profile.citation_metrics, Some(CitationMetrics::default()));
        // Upserted before returning.
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn unusable_oracle_answer_uses_keyword_fallback() {
        let gateway = MockToolGateway::new()
            .with_response(
                "search_scholar",
                json!([{"author_id": "a2", "name": "Jane Doe", "affiliations": ["MIT"]}]),
            )
            .with_response(
                "get_publications",
                json!([{"title": "Quantum error correction codes", "year": 2024}]),
            );
        let enricher = enricher_with(gateway, test_cache());

        let profile = enricher
            .enrich_one(candidate("Jane Doe"), "mit.edu", &["mit".to_string()])
            .await
            .unwrap()
            .unwrap();

        assert!(profile.research_areas.contains(&"quantum".to_string()));
    }

    #[tokio::test]
    async fn no_scholar_builds_minimal_profile_from_page() {
        let gateway = MockToolGateway::new()
            .with_response("search_scholar", json!([]))
            .with_response(
                "get_professor_page",
                json!({
                    "title": "Associate Professor",
                    "department": "EECS",
                    "research_areas": "systems, networking"
                }),
            );
        let enricher = enricher_with(gateway, test_cache());

        let mut faculty = candidate("John Roe");
        faculty.profile_url = Some("https://mit.edu/~roe".into());

        let profile = enricher
            .enrich_one(faculty, "mit.edu", &["mit".to_string()])
            .await
            .unwrap()
            .unwrap();

        assert!(profile.scholar_id.is_none());
        assert!(profile.publications.is_empty());
        assert_eq!(profile.title.as_deref(), Some("Associate Professor"));
        assert_eq!(
            profile.research_areas,
            vec!["systems".to_string(), "networking".to_string()]
        );
        assert!(profile.citation_metrics.is_none());
    }

    #[tokio::test]
    async fn enrich_all_drops_failures_without_affecting_siblings() {
        let gateway = MockToolGateway::new()
            .with_keyed_response(
                "search_scholar",
                "Jane Doe",
                json!([{"author_id": "a2", "name": "Jane Doe", "affiliations": ["MIT"]}]),
            )
            .with_response("search_scholar", json!([]))
            .with_response("get_publications", json!([]))
            .with_response("generate_text", json!(""));
        let enricher = enricher_with(gateway, test_cache());

        let candidates = vec![candidate("Jane Doe"), candidate(""), candidate("John Roe")];
        let professors = enricher.enrich_all(candidates, "mit.edu").await;

        let names: Vec<&str> = professors.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Doe", "John Roe"]);
    }
}
