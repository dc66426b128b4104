//! SeaORM entity models

pub mod professor_cache;

pub use professor_cache::{
    ActiveModel as ProfessorCacheActiveModel, Column as ProfessorCacheColumn,
    Entity as ProfessorCacheEntity, Model as ProfessorCacheRecord,
};
