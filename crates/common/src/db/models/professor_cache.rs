//! Cached professor record entity
//!
//! `(name, university)` is the natural key; `updated_at` drives the TTL
//! gate applied by the repository.

use crate::models::{CitationMetrics, ProfessorProfile, Publication};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "professor_cache")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub university: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub department: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub title: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub email: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub scholar_id: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub google_scholar_url: Option<String>,

    #[sea_orm(column_type = "JsonBinary")]
    pub research_areas: Json,

    #[sea_orm(column_type = "JsonBinary")]
    pub publications: Json,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub citation_metrics: Option<Json>,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Rehydrate the domain profile from the cached record.
    ///
    /// JSON columns are decoded leniently: an unreadable column yields the
    /// empty default rather than failing the lookup.
    pub fn into_profile(self) -> ProfessorProfile {
        let research_areas: Vec<String> =
            serde_json::from_value(self.research_areas).unwrap_or_default();
        let publications: Vec<Publication> =
            serde_json::from_value(self.publications).unwrap_or_default();
        let citation_metrics: Option<CitationMetrics> = self
            .citation_metrics
            .and_then(|value| serde_json::from_value(value).ok());

        ProfessorProfile {
            id: self.id,
            name: self.name,
            title: self.title,
            department: self.department,
            university: self.university,
            email: self.email,
            scholar_id: self.scholar_id,
            google_scholar_url: self.google_scholar_url,
            research_areas,
            publications,
            citation_metrics,
            last_updated: self.updated_at.with_timezone(&chrono::Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn unreadable_json_columns_degrade_to_defaults() {
        let record = Model {
            id: Uuid::new_v4(),
            name: "Grace Hopper".into(),
            university: "https://yale.edu".into(),
            department: None,
            title: None,
            email: None,
            scholar_id: Some("gh1".into()),
            google_scholar_url: None,
            research_areas: serde_json::json!("not-a-list"),
            publications: serde_json::json!({"bad": "shape"}),
            citation_metrics: Some(serde_json::json!([1, 2, 3])),
            updated_at: Utc::now().into(),
        };

        let profile = record.into_profile();
        assert!(profile.research_areas.is_empty());
        assert!(profile.publications.is_empty());
        assert!(profile.citation_metrics.is_none());
        assert_eq!(profile.scholar_id.as_deref(), Some("gh1"));
    }
}
