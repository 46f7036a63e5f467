//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into path-based transactions.
//! - Keep API/CLI layers decoupled from archive and XML details.

mod lock;
pub mod mindmap_service;

pub use mindmap_service::{Committed, ExportFormat, MindMapService};
