//! Repository for the professor cache store
//!
//! Implements the read/upsert contract: TTL-gated lookups by the
//! `(name, university)` natural key or by scholar id, and last-write-wins
//! upserts. The freshness boundary is exclusive: a record exactly at the
//! TTL age is stale.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use crate::models::ProfessorProfile;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

/// Data access for cached professor records
#[derive(Clone)]
pub struct ProfessorRepository {
    pool: DbPool,
}

impl ProfessorRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    fn freshness_cutoff(ttl: Duration) -> DateTime<Utc> {
        Utc::now() - ttl
    }

    /// Find a fresh record by the `(name, university)` natural key.
    pub async fn find_fresh(
        &self,
        name: &str,
        university: &str,
        ttl: Duration,
    ) -> Result<Option<ProfessorProfile>> {
        let record = ProfessorCacheEntity::find()
            .filter(ProfessorCacheColumn::Name.eq(name))
            .filter(ProfessorCacheColumn::University.eq(university))
            .filter(ProfessorCacheColumn::UpdatedAt.gt(Self::freshness_cutoff(ttl)))
            .one(self.pool.conn())
            .await?;

        Ok(record.map(ProfessorCacheRecord::into_profile))
    }

    /// Find a fresh record by the external scholar id.
    pub async fn find_fresh_by_scholar_id(
        &self,
        scholar_id: &str,
        ttl: Duration,
    ) -> Result<Option<ProfessorProfile>> {
        let record = ProfessorCacheEntity::find()
            .filter(ProfessorCacheColumn::ScholarId.eq(scholar_id))
            .filter(ProfessorCacheColumn::UpdatedAt.gt(Self::freshness_cutoff(ttl)))
            .one(self.pool.conn())
            .await?;

        Ok(record.map(ProfessorCacheRecord::into_profile))
    }

    /// Find a record by primary id, regardless of freshness.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProfessorProfile>> {
        let record = ProfessorCacheEntity::find_by_id(id)
            .one(self.pool.conn())
            .await?;

        Ok(record.map(ProfessorCacheRecord::into_profile))
    }

    /// Insert or update a profile under its natural key.
    ///
    /// Concurrent writers for the same key resolve last-write-wins; the
    /// `updated_at` stamp is refreshed on every write.
    pub async fn upsert(&self, profile: &ProfessorProfile) -> Result<()> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let research_areas = serde_json::to_value(&profile.research_areas)?;
        let publications = serde_json::to_value(&profile.publications)?;
        let citation_metrics = profile
            .citation_metrics
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let existing = ProfessorCacheEntity::find()
            .filter(ProfessorCacheColumn::Name.eq(profile.name.as_str()))
            .filter(ProfessorCacheColumn::University.eq(profile.university.as_str()))
            .one(self.pool.conn())
            .await?;

        match existing {
            Some(record) => {
                let mut active: ProfessorCacheActiveModel = record.into();
                active.department = Set(profile.department.clone());
                active.title = Set(profile.title.clone());
                active.email = Set(profile.email.clone());
                active.scholar_id = Set(profile.scholar_id.clone());
                active.google_scholar_url = Set(profile.google_scholar_url.clone());
                active.research_areas = Set(research_areas);
                active.publications = Set(publications);
                active.citation_metrics = Set(citation_metrics);
                active.updated_at = Set(now);
                active.update(self.pool.conn()).await?;
            }
            None => {
                let active = ProfessorCacheActiveModel {
                    id: Set(profile.id),
                    name: Set(profile.name.clone()),
                    university: Set(profile.university.clone()),
                    department: Set(profile.department.clone()),
                    title: Set(profile.title.clone()),
                    email: Set(profile.email.clone()),
                    scholar_id: Set(profile.scholar_id.clone()),
                    google_scholar_url: Set(profile.google_scholar_url.clone()),
                    research_areas: Set(research_areas),
                    publications: Set(publications),
                    citation_metrics: Set(citation_metrics),
                    updated_at: Set(now),
                };
                active.insert(self.pool.conn()).await?;
            }
        }

        Ok(())
    }
}
