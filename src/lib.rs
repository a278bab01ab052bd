//! Email triage: local productivity router plus LLM enrichment.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod web;
