//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate fetch and repository calls into use-case level APIs.
//! - Keep CLI and presentation layers decoupled from storage details.

pub mod chart_service;
