//! arv-assess: assessment view materialization
//!
//! **Pipeline:**
//! 1. `loader` fetches collaborator data level by level into an aggregate
//!    (`resolver` decides locked vs floating lesson plans along the way)
//! 2. `matcher` aligns room telemetry with catalog materials
//! 3. `processor` picks the completion and attribution rules per type
//! 4. `assembler` emits list rows and detail records
//!
//! Collaborators are injected through the traits in `collaborators`;
//! `memory::MemoryBackend` implements all of them over a JSON dataset.

pub mod assembler;
pub mod collaborators;
pub mod loader;
pub mod matcher;
pub mod memory;
pub mod processor;
pub mod resolver;
pub mod service;
pub mod views;

pub use crate::collaborators::Collaborators;
pub use crate::service::AssessmentViewService;
