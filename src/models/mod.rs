pub mod metadata;
pub mod query;
