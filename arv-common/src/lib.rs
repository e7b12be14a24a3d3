//! # ARV Common Library
//!
//! Shared code for the assessment reporting view crates including:
//! - Domain models (assessments, schedules, content, outcomes, room telemetry)
//! - Common error types
//! - Configuration loading

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{AssessmentStatus, AssessmentType, FileType};
