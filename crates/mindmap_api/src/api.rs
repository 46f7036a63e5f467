//! Path-based mind map operations.
//!
//! # Responsibility
//! - Wrap `MindMapService` calls as `Result<Response, ApiError>` functions.
//! - Keep response shapes serializable and free of engine lifetimes.
//!
//! # Invariants
//! - Functions never panic; every failure is an `ApiError` with one of the
//!   engine kinds (`archive_error|malformed_document|node_not_found|
//!   invalid_operation|io_error`).
//! - Mutations report the file they wrote.

use log::warn;
use mindmap_core::{
    breadcrumb, core_version as core_version_inner, path as node_path, search, snapshot,
    summary, to_outline, to_structured, without_notes, ArchiveRepository, EngineError,
    ExportFormat, ExportOptions, MapSummary, MindMap, MindMapService, Node, NodeId,
    NodeSnapshot, NodeUpdate, SearchFields,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

static SERVICE: OnceLock<MindMapService<ArchiveRepository>> = OnceLock::new();

pub type ApiResult<T> = Result<T, ApiError>;

/// Error envelope returned by every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Stable machine-readable error class.
    pub kind: String,
    /// Human-readable description.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl ApiError {
    fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            kind: "invalid_operation".to_string(),
            message: message.into(),
            path: None,
            node_id: None,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Error for ApiError {}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            path: err.path().map(|path| path.display().to_string()),
            node_id: err.node_id().map(|id| id.to_string()),
        }
    }
}

/// Rendering requested from [`read_mindmap`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadFormat {
    #[default]
    Structured,
    Markdown,
    Json,
    Summary,
}

impl FromStr for ReadFormat {
    type Err = ApiError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "structured" => Ok(Self::Structured),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "summary" => Ok(Self::Summary),
            other => Err(ApiError::invalid_argument(format!(
                "unsupported format `{other}`; expected structured|markdown|json|summary"
            ))),
        }
    }
}

/// Document rendered in the requested format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "content", rename_all = "snake_case")]
pub enum ReadResponse {
    Structured(serde_json::Value),
    Markdown(String),
    Json(String),
    Summary(MapSummary),
}

/// Topic reference used by list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHit {
    pub id: String,
    pub text: String,
    pub notes: Option<String>,
    pub parent_id: Option<String>,
    /// Root-to-topic texts joined with ` > `.
    pub breadcrumb: String,
}

/// Search result envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub search_notes: bool,
    pub total: usize,
    pub items: Vec<NodeHit>,
}

/// Plain list of topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeListResponse {
    pub total: usize,
    pub items: Vec<NodeHit>,
}

/// One hop of a root-to-topic path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePathResponse {
    pub node_id: String,
    pub breadcrumb: String,
    /// Root first, requested topic last.
    pub path: Vec<PathStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub format: String,
    pub content: String,
    pub output_path: Option<String>,
}

/// Outcome of a committed create, update or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub operation: String,
    /// Created or updated topic id; the deleted subtree root for deletes.
    pub node_id: String,
    /// Ids removed by a delete, subtree root first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_ids: Vec<String>,
    pub written_path: String,
    pub message: String,
}

/// Expose core crate version.
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Reads a document and renders it as `format`.
///
/// # Contract
/// - Read-only; holds the shared lock on `path` while loading.
/// - `Structured` returns a JSON value, `Json` the same data pretty-printed.
pub fn read_mindmap(path: &str, format: ReadFormat) -> ApiResult<ReadResponse> {
    call("read_mindmap", || {
        service().read(Path::new(path), |stored| {
            let map = &stored.map;
            let response = match format {
                ReadFormat::Structured => {
                    let structured = to_structured(map, None, ExportOptions::default())?;
                    ReadResponse::Structured(serde_json::to_value(&structured).map_err(
                        |err| EngineError::InvalidOperation(format!("json export failed: {err}")),
                    )?)
                }
                ReadFormat::Markdown => ReadResponse::Markdown(to_outline(map, None)?),
                ReadFormat::Json => ReadResponse::Json(mindmap_core::to_json(
                    map,
                    None,
                    ExportOptions::default(),
                )?),
                ReadFormat::Summary => ReadResponse::Summary(summary(map)),
            };
            Ok(response)
        })
    })
}

/// Returns one topic with its children and cross-links.
pub fn get_node(path: &str, node_id: &str) -> ApiResult<NodeSnapshot> {
    let id = parse_node_id(node_id)?;
    call("get_node", || {
        service().read(Path::new(path), |stored| Ok(snapshot(&stored.map, &id)?))
    })
}

/// Case-insensitive substring search over topic text (and notes).
///
/// # Contract
/// - Blank queries return an empty result.
/// - Results follow document pre-order.
pub fn search_nodes(path: &str, query: &str, search_notes: bool) -> ApiResult<SearchResponse> {
    call("search_nodes", || {
        service().read(Path::new(path), |stored| {
            let fields = SearchFields::from_search_notes(search_notes);
            let items = search(&stored.map, query, fields)
                .map(|node| node_hit(&stored.map, node))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SearchResponse {
                query: query.to_string(),
                search_notes,
                total: items.len(),
                items,
            })
        })
    })
}

/// Renders the document as Markdown or JSON, optionally writing it to `output_path`.
pub fn export_mindmap(
    path: &str,
    format: &str,
    output_path: Option<&str>,
) -> ApiResult<ExportResponse> {
    let format = match format.trim().to_ascii_lowercase().as_str() {
        "markdown" | "md" => ExportFormat::Markdown,
        "json" => ExportFormat::Json,
        other => {
            return Err(ApiError::invalid_argument(format!(
                "unsupported export format `{other}`; expected markdown|json"
            )))
        }
    };
    call("export_mindmap", || {
        service().export(Path::new(path), format, output_path.map(Path::new))
    })
    .map(|content| ExportResponse {
        format: format.as_str().to_string(),
        content,
        output_path: output_path.map(str::to_string),
    })
}

/// Adds a topic as the last child of `parent_id`.
///
/// # Contract
/// - Writes to `output_path` when given, otherwise back to `path`.
/// - Empty `notes` are stored as absent.
pub fn add_node(
    path: &str,
    parent_id: &str,
    text: &str,
    notes: Option<String>,
    output_path: Option<&str>,
) -> ApiResult<MutationResponse> {
    let parent_id = parse_node_id(parent_id)?;
    let committed = call("add_node", || {
        service().add_node(
            Path::new(path),
            output_path.map(Path::new),
            &parent_id,
            text,
            notes,
        )
    })?;
    Ok(MutationResponse {
        operation: "add_node".to_string(),
        node_id: committed.value.to_string(),
        removed_ids: Vec::new(),
        written_path: committed.written_path.display().to_string(),
        message: format!("Topic {} added under {}.", committed.value, parent_id),
    })
}

/// Updates text and/or notes of one topic; omitted fields stay unchanged.
///
/// # Contract
/// - At least one of `text` and `notes` must be given.
/// - `notes = Some("")` clears the notes.
pub fn update_node(
    path: &str,
    node_id: &str,
    text: Option<String>,
    notes: Option<String>,
    output_path: Option<&str>,
) -> ApiResult<MutationResponse> {
    let id = parse_node_id(node_id)?;
    let committed = call("update_node", || {
        service().update_node(
            Path::new(path),
            output_path.map(Path::new),
            &id,
            NodeUpdate { text, notes },
        )
    })?;
    Ok(MutationResponse {
        operation: "update_node".to_string(),
        node_id: id.to_string(),
        removed_ids: Vec::new(),
        written_path: committed.written_path.display().to_string(),
        message: format!("Topic {id} updated."),
    })
}

/// Deletes a topic with its whole subtree. The root cannot be deleted.
pub fn delete_node(
    path: &str,
    node_id: &str,
    output_path: Option<&str>,
) -> ApiResult<MutationResponse> {
    let id = parse_node_id(node_id)?;
    let committed = call("delete_node", || {
        service().delete_node(Path::new(path), output_path.map(Path::new), &id)
    })?;
    let removed_ids = committed
        .value
        .iter()
        .map(NodeId::to_string)
        .collect::<Vec<_>>();
    Ok(MutationResponse {
        operation: "delete_node".to_string(),
        node_id: id.to_string(),
        message: format!("Deleted {} topic(s).", removed_ids.len()),
        removed_ids,
        written_path: committed.written_path.display().to_string(),
    })
}

/// Root-to-topic path of `node_id`.
pub fn get_node_path(path: &str, node_id: &str) -> ApiResult<NodePathResponse> {
    let id = parse_node_id(node_id)?;
    call("get_node_path", || {
        service().read(Path::new(path), |stored| {
            let chain = node_path(&stored.map, &id)?;
            Ok(NodePathResponse {
                node_id: id.to_string(),
                breadcrumb: breadcrumb(&chain),
                path: chain
                    .iter()
                    .map(|node| PathStep {
                        id: node.id.to_string(),
                        text: node.text.clone(),
                    })
                    .collect(),
            })
        })
    })
}

/// Topics whose notes are absent or blank, root included, in pre-order.
pub fn find_nodes_without_notes(path: &str) -> ApiResult<NodeListResponse> {
    call("find_nodes_without_notes", || {
        service().read(Path::new(path), |stored| {
            let items = without_notes(&stored.map)
                .map(|node| node_hit(&stored.map, node))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(NodeListResponse {
                total: items.len(),
                items,
            })
        })
    })
}

fn service() -> &'static MindMapService<ArchiveRepository> {
    SERVICE.get_or_init(|| MindMapService::new(ArchiveRepository::new()))
}

fn call<T>(operation: &str, f: impl FnOnce() -> Result<T, EngineError>) -> ApiResult<T> {
    f().map_err(|err| {
        warn!(
            "event=api_call module=api status=error op={} error_code={} error={}",
            operation,
            err.kind(),
            err
        );
        ApiError::from(err)
    })
}

fn parse_node_id(raw: &str) -> ApiResult<NodeId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid_argument("node id must not be empty"));
    }
    Ok(NodeId::from(trimmed))
}

fn node_hit(map: &MindMap, node: &Node) -> Result<NodeHit, EngineError> {
    let chain = node_path(map, &node.id)?;
    Ok(NodeHit {
        id: node.id.to_string(),
        text: node.text.clone(),
        notes: node.notes.clone(),
        parent_id: node.parent_id.as_ref().map(NodeId::to_string),
        breadcrumb: breadcrumb(&chain),
    })
}
