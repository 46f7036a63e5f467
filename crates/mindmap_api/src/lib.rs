//! Use-case operation surface over `mindmap_core`.
//!
//! # Responsibility
//! - Expose path-based, serializable operations for outer layers
//!   (CLI, tool servers, bindings).
//! - Map engine failures onto one stable error envelope.

pub mod api;
pub mod config;

pub use api::{
    add_node, core_version, delete_node, export_mindmap, find_nodes_without_notes, get_node,
    get_node_path, read_mindmap, search_nodes, update_node, ApiError, ApiResult, ExportResponse,
    MutationResponse, NodeHit, NodeListResponse, NodePathResponse, PathStep, ReadFormat,
    ReadResponse, SearchResponse,
};
pub use config::ApiConfig;
