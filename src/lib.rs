//! weblate-assist - LLM-assisted translation workflow for Weblate
//!
//! Two engines share one (project, component, language) selection:
//! a batch engine that pages through untranslated units, asks a model for
//! suggestions and learns insights from human corrections, and a context
//! index that embeds the whole catalogue for similarity search.

pub mod cli;
pub mod config;
pub mod error;
pub mod weblate;
pub mod llm;
pub mod embedding;
pub mod store;
pub mod similarity;
pub mod batch;
pub mod index;
pub mod session;
