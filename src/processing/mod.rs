//! Skill extraction: text processing, TF-IDF, catalog, mentions, profiles

pub mod catalog;
pub mod mentions;
pub mod profiles;
pub mod requirements;
pub mod text_processor;
pub mod tfidf;
