//! Faculty discovery
//!
//! Resolves a university plus a set of research interests into a
//! deduplicated list of named faculty candidates. Interest branches run
//! concurrently; a failed branch contributes zero URLs and never affects
//! its siblings.

use crate::tools::ToolSet;
use futures::future::join_all;
use scholarmatch_common::models::FacultyCandidate;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// URL path segments that mark an explicit directory page
const DIRECTORY_KEYWORDS: &[&str] = &[
    "faculty",
    "staff",
    "people",
    "directory",
    "team",
    "professors",
];

/// Prefix a scheme when the university was given as a bare hostname.
pub fn normalize_university_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

/// Host of the university URL with a leading `www.` stripped.
///
/// The bare domain catches department subdomains (e.g. `depts.ttu.edu`)
/// in web-search queries.
pub fn bare_domain(university: &str) -> String {
    let normalized = normalize_university_url(university);
    reqwest::Url::parse(&normalized)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").unwrap_or(&host).to_string())
        .unwrap_or_default()
}

/// Discovers faculty candidates for a university
pub struct FacultyDiscovery {
    tools: Arc<ToolSet>,
    max_interests: usize,
}

impl FacultyDiscovery {
    pub fn new(tools: Arc<ToolSet>, max_interests: usize) -> Self {
        Self {
            tools,
            max_interests,
        }
    }

    /// Directory URL(s) to search for one interest.
    ///
    /// A URL whose path already names a directory page is used as-is;
    /// otherwise a web search proposes candidate pages, falling back to
    /// the university URL itself when the search yields nothing.
    pub async fn discover_directory_urls(&self, university: &str, interest: &str) -> Vec<String> {
        let normalized = normalize_university_url(university);

        let path = reqwest::Url::parse(&normalized)
            .map(|url| url.path().to_lowercase())
            .unwrap_or_default();
        if DIRECTORY_KEYWORDS.iter().any(|keyword| path.contains(keyword)) {
            return vec![normalized];
        }

        let domain = bare_domain(university);
        let query = if interest.is_empty() {
            format!("Computer Science faculty directory {}", domain)
        } else {
            format!("{} faculty directory {}", interest, domain)
        };

        let urls = self.tools.search_web(&query).await;
        if urls.is_empty() {
            vec![normalized]
        } else {
            urls
        }
    }

    /// Full discovery fan-out: concurrent interest branches, URL dedup,
    /// concurrent per-URL faculty search, name dedup (first wins).
    pub async fn fetch(
        &self,
        university: &str,
        research_interests: &[String],
    ) -> Vec<FacultyCandidate> {
        let interests: Vec<&str> = research_interests
            .iter()
            .take(self.max_interests)
            .map(String::as_str)
            .collect();

        let branch_results = join_all(
            interests
                .iter()
                .map(|interest| self.discover_directory_urls(university, interest)),
        )
        .await;

        let mut seen_urls = HashSet::new();
        let mut search_pairs: Vec<(String, &str)> = Vec::new();
        for (interest, urls) in interests.iter().copied().zip(branch_results) {
            for url in urls {
                if seen_urls.insert(url.clone()) {
                    search_pairs.push((url, interest));
                }
            }
        }

        let fetches = join_all(search_pairs.iter().map(|(url, interest)| async move {
            info!(interest = *interest, url = url.as_str(), "Searching faculty directory");
            let found = self.tools.search_faculty(url, interest).await;
            info!(count = found.len(), url = url.as_str(), "Faculty search finished");
            found
        }))
        .await;

        let unique = dedup_by_name(fetches.into_iter().flatten());
        info!(count = unique.len(), "Total unique faculty found");
        unique
    }
}

/// Deduplicate candidates by exact name, first occurrence winning.
pub fn dedup_by_name(candidates: impl IntoIterator<Item = FacultyCandidate>) -> Vec<FacultyCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| {
            !candidate.name.is_empty() && seen.insert(candidate.name.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::MockToolGateway;
    use serde_json::json;

    fn candidate(name: &str) -> FacultyCandidate {
        FacultyCandidate {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn bare_hostnames_gain_https_scheme() {
        assert_eq!(normalize_university_url("mit.edu"), "https://mit.edu");
        assert_eq!(
            normalize_university_url("http://cs.stanford.edu"),
            "http://cs.stanford.edu"
        );
    }

    #[test]
    fn bare_domain_strips_www() {
        assert_eq!(bare_domain("https://www.ttu.edu/coe"), "ttu.edu");
        assert_eq!(bare_domain("mit.edu"), "mit.edu");
    }

    #[test]
    fn name_dedup_is_idempotent() {
        let once = dedup_by_name(vec![
            candidate("Jane Doe"),
            candidate("John Roe"),
            candidate("Jane Doe"),
            candidate(""),
        ]);
        let twice = dedup_by_name(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn dedup_is_case_sensitive_and_first_wins() {
        let mut first = candidate("Jane Doe");
        first.title = Some("Professor".into());
        let mut second = candidate("Jane Doe");
        second.title = Some("Lecturer".into());

        let unique = dedup_by_name(vec![first, second, candidate("jane doe")]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].title.as_deref(), Some("Professor"));
    }

    #[tokio::test]
    async fn explicit_directory_paths_bypass_web_search() {
        let gateway = MockToolGateway::new();
        let tools = Arc::new(ToolSet::new(Arc::new(gateway)));
        let discovery = FacultyDiscovery::new(tools, 3);

        let urls = discovery
            .discover_directory_urls("https://cs.mit.edu/people", "machine learning")
            .await;
        assert_eq!(urls, vec!["https://cs.mit.edu/people".to_string()]);
    }

    #[tokio::test]
    async fn failed_search_falls_back_to_university_url() {
        let gateway = MockToolGateway::new();
        let tools = Arc::new(ToolSet::new(Arc::new(gateway)));
        let discovery = FacultyDiscovery::new(tools, 3);

        let urls = discovery
            .discover_directory_urls("mit.edu", "robotics")
            .await;
        assert_eq!(urls, vec!["https://mit.edu".to_string()]);
    }

    #[tokio::test]
    async fn fetch_merges_branches_and_dedups_by_name() {
        let gateway = MockToolGateway::new()
            .with_keyed_response(
                "search_web",
                "machine learning",
                json!(["https://mit.edu/ml-faculty"]),
            )
            .with_keyed_response(
                "search_web",
                "robotics",
                json!(["https://mit.edu/robotics-faculty", "https://mit.edu/ml-faculty"]),
            )
            .with_keyed_response(
                "search_faculty",
                "ml-faculty",
                json!([{"name": "Jane Doe"}, {"name": "John Roe"}]),
            )
            .with_keyed_response(
                "search_faculty",
                "robotics-faculty",
                json!([{"name": "John Roe"}, {"name": "Maya Lin"}]),
            );
        let gateway = Arc::new(gateway);
        let tools = Arc::new(ToolSet::new(gateway.clone()));
        let discovery = FacultyDiscovery::new(tools, 3);

        let interests = vec!["machine learning".to_string(), "robotics".to_string()];
        let faculty = discovery.fetch("mit.edu", &interests).await;

        let names: Vec<&str> = faculty.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Doe", "John Roe", "Maya Lin"]);
        // The shared URL is searched once despite appearing in both branches.
        assert_eq!(gateway.call_count("search_faculty"), 2);
    }

    #[tokio::test]
    async fn only_first_three_interests_are_used() {
        let gateway = Arc::new(MockToolGateway::new());
        let tools = Arc::new(ToolSet::new(gateway.clone()));
        let discovery = FacultyDiscovery::new(tools, 3);

        let interests: Vec<String> = (0..5).map(|i| format!("interest-{}", i)).collect();
        discovery.fetch("mit.edu", &interests).await;

        assert_eq!(gateway.call_count("search_web"), 3);
    }
}
