//! Professor cache store contract
//!
//! The pipeline reads and writes professor profiles through this trait so
//! enrichment logic stays independent of the persistence backend. Records
//! age out after the configured TTL with an exclusive boundary: a record
//! whose age equals the TTL is already stale.

use crate::db::ProfessorRepository;
use crate::errors::Result;
use crate::metrics::record_cache;
use crate::models::ProfessorProfile;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Read/upsert contract for cached professor profiles
#[async_trait]
pub trait ProfessorCache: Send + Sync {
    /// Fresh record by the `(name, university)` natural key, if any.
    async fn get(&self, name: &str, university: &str) -> Result<Option<ProfessorProfile>>;

    /// Fresh record by external scholar id, if any.
    async fn get_by_scholar_id(&self, scholar_id: &str) -> Result<Option<ProfessorProfile>>;

    /// Insert or overwrite the record under its natural key.
    async fn upsert(&self, profile: &ProfessorProfile) -> Result<()>;
}

/// SeaORM-backed cache store
pub struct SqlProfessorCache {
    repository: ProfessorRepository,
    ttl: Duration,
}

impl SqlProfessorCache {
    pub fn new(repository: ProfessorRepository, ttl: Duration) -> Self {
        Self { repository, ttl }
    }
}

#[async_trait]
impl ProfessorCache for SqlProfessorCache {
    async fn get(&self, name: &str, university: &str) -> Result<Option<ProfessorProfile>> {
        let found = self.repository.find_fresh(name, university, self.ttl).await?;
        record_cache(found.is_some(), "professor");
        Ok(found)
    }

    async fn get_by_scholar_id(&self, scholar_id: &str) -> Result<Option<ProfessorProfile>> {
        let found = self
            .repository
            .find_fresh_by_scholar_id(scholar_id, self.ttl)
            .await?;
        record_cache(found.is_some(), "professor");
        Ok(found)
    }

    async fn upsert(&self, profile: &ProfessorProfile) -> Result<()> {
        self.repository.upsert(profile).await
    }
}

/// In-memory cache store for tests and development.
///
/// Applies the same exclusive TTL boundary as the SQL store, keyed on the
/// profile's own `last_updated` stamp.
pub struct MemoryProfessorCache {
    ttl: Duration,
    records: RwLock<HashMap<(String, String), ProfessorProfile>>,
}

impl MemoryProfessorCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently held, fresh or stale.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn is_fresh(&self, profile: &ProfessorProfile) -> bool {
        Utc::now() - profile.last_updated < self.ttl
    }
}

#[async_trait]
impl ProfessorCache for MemoryProfessorCache {
    async fn get(&self, name: &str, university: &str) -> Result<Option<ProfessorProfile>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(name.to_string(), university.to_string()))
            .filter(|profile| self.is_fresh(profile))
            .cloned())
    }

    async fn get_by_scholar_id(&self, scholar_id: &str) -> Result<Option<ProfessorProfile>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|profile| profile.scholar_id.as_deref() == Some(scholar_id))
            .filter(|profile| self.is_fresh(profile))
            .cloned())
    }

    async fn upsert(&self, profile: &ProfessorProfile) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(
            (profile.name.clone(), profile.university.clone()),
            profile.clone(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile_updated_at(age: Duration) -> ProfessorProfile {
        ProfessorProfile {
            id: Uuid::new_v4(),
            name: "Alan Turing".into(),
            title: None,
            department: None,
            university: "https://cam.ac.uk".into(),
            email: None,
            scholar_id: Some("at1".into()),
            google_scholar_url: None,
            research_areas: vec![],
            publications: vec![],
            citation_metrics: None,
            last_updated: Utc::now() - age,
        }
    }

    #[tokio::test]
    async fn fresh_record_is_returned() {
        let cache = MemoryProfessorCache::new(Duration::days(7));
        cache.upsert(&profile_updated_at(Duration::days(1))).await.unwrap();

        let hit = cache.get("Alan Turing", "https://cam.ac.uk").await.unwrap();
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn record_exactly_at_ttl_boundary_is_stale() {
        let cache = MemoryProfessorCache::new(Duration::days(7));
        cache.upsert(&profile_updated_at(Duration::days(7))).await.unwrap();

        let hit = cache.get("Alan Turing", "https://cam.ac.uk").await.unwrap();
        assert!(hit.is_none(), "age == TTL must be treated as absent");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn scholar_id_lookup_applies_same_gate() {
        let cache = MemoryProfessorCache::new(Duration::days(7));
        cache.upsert(&profile_updated_at(Duration::days(8))).await.unwrap();
        assert!(cache.get_by_scholar_id("at1").await.unwrap().is_none());

        cache.upsert(&profile_updated_at(Duration::hours(1))).await.unwrap();
        assert!(cache.get_by_scholar_id("at1").await.unwrap().is_some());
    }
}
