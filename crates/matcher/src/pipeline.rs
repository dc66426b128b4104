//! Pipeline controller
//!
//! Sequences the matching stages, reports progress after every milestone,
//! and commits the final session state. The pipeline runs at most once
//! per invocation and is never retried; an uncaught stage error is mapped
//! to the `failed` session state by the detached host wrapper.

use crate::discovery::FacultyDiscovery;
use crate::enrichment::ProfileEnricher;
use crate::filter::RelevanceFilter;
use crate::postmatch::ScholarMetricsBackfill;
use crate::ranking::MatchRanker;
use crate::student::DocumentParser;
use crate::tools::ToolSet;
use scholarmatch_common::cache::ProfessorCache;
use scholarmatch_common::config::MatchingConfig;
use scholarmatch_common::errors::Result;
use scholarmatch_common::metrics::record_pipeline;
use scholarmatch_common::models::MatchResult;
use scholarmatch_common::session::SessionStore;
use scholarmatch_common::storage::FileStorage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Orchestrates one matching run end to end.
///
/// All collaborators are passed in at construction; the pipeline holds no
/// global state and owns nothing mutable beyond its run-local data.
pub struct MatchPipeline {
    discovery: FacultyDiscovery,
    filter: RelevanceFilter,
    enricher: ProfileEnricher,
    parser: DocumentParser,
    ranker: MatchRanker,
    backfill: ScholarMetricsBackfill,
    sessions: Arc<dyn SessionStore>,
}

impl MatchPipeline {
    pub fn new(
        tools: Arc<ToolSet>,
        cache: Arc<dyn ProfessorCache>,
        sessions: Arc<dyn SessionStore>,
        storage: FileStorage,
        config: MatchingConfig,
    ) -> Self {
        Self {
            discovery: FacultyDiscovery::new(Arc::clone(&tools), config.max_interests),
            filter: RelevanceFilter::new(Arc::clone(&tools), config.max_candidates),
            enricher: ProfileEnricher::new(Arc::clone(&tools), cache, config.clone()),
            parser: DocumentParser::new(Arc::clone(&tools), storage),
            ranker: MatchRanker::new(Arc::clone(&tools), config.max_matches),
            backfill: ScholarMetricsBackfill::new(tools),
            sessions,
        }
    }

    /// Run the full matching pipeline for one session.
    #[instrument(skip(self, research_interests, file_ids))]
    pub async fn run(
        &self,
        session_id: &str,
        university: &str,
        research_interests: &[String],
        file_ids: &[String],
    ) -> Result<Vec<MatchResult>> {
        self.sessions
            .update_progress(session_id, 5, "Parsing uploaded documents")
            .await?;
        let student = if file_ids.is_empty() {
            None
        } else {
            Some(
                self.parser
                    .parse(session_id, file_ids, research_interests)
                    .await,
            )
        };

        self.sessions
            .update_progress(session_id, 15, "Fetching faculty directory")
            .await?;
        let candidates = self.discovery.fetch(university, research_interests).await;

        self.sessions
            .update_progress(session_id, 25, "Filtering candidates")
            .await?;
        let candidates = self.filter.apply(candidates, research_interests).await;

        self.sessions
            .update_progress(session_id, 30, "Retrieving publication data")
            .await?;
        let professors = self.enricher.enrich_all(candidates, university).await;

        self.sessions
            .update_progress(session_id, 70, "Analyzing research alignment")
            .await?;
        let mut matches = self
            .ranker
            .rank(&professors, research_interests, student.as_ref())
            .await;

        self.sessions
            .update_progress(session_id, 90, "Fetching citation metrics")
            .await?;
        self.backfill.enrich(&mut matches, university).await;

        self.sessions
            .update_progress(session_id, 95, "Finalizing recommendations")
            .await?;
        self.sessions.complete_run(session_id, &matches).await?;

        info!(matches = matches.len(), "Matching run completed");
        Ok(matches)
    }

    /// Host wrapper for background execution.
    ///
    /// Catches the run's error exactly once, records the failed session
    /// state with a truncated message, and leaves progress frozen at its
    /// last reported value.
    pub async fn run_detached(
        &self,
        session_id: &str,
        university: &str,
        research_interests: &[String],
        file_ids: &[String],
    ) {
        let started = Instant::now();

        match self
            .run(session_id, university, research_interests, file_ids)
            .await
        {
            Ok(matches) => {
                record_pipeline("completed", started.elapsed().as_secs_f64());
                info!(
                    matches = matches.len(),
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "Matching run finished"
                );
            }
            Err(run_error) => {
                record_pipeline("failed", started.elapsed().as_secs_f64());
                error!(error = %run_error, "Matching run failed");
                if let Err(store_error) = self
                    .sessions
                    .fail_run(session_id, &run_error.to_string())
                    .await
                {
                    error!(error = %store_error, "Failed to record run failure");
                }
            }
        }
    }
}
