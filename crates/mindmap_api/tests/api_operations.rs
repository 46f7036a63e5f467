use mindmap_api::{
    add_node, delete_node, export_mindmap, find_nodes_without_notes, get_node, get_node_path,
    read_mindmap, search_nodes, update_node, ReadFormat, ReadResponse,
};
use mindmap_core::archive::{write_archive, ArchiveManifest};
use std::path::{Path, PathBuf};

const PAYLOAD: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE simplemind-mindmaps>
<simplemind-mindmaps generator="SimpleMind" gen-version="2.5.0" doc-version="3">
  <mindmap>
    <meta>
      <title text="Trip"/>
    </meta>
    <topics>
      <topic id="0" parent="-1" guid="A0" x="0.00" y="0.00" text="Trip">
        <note>Summer plans</note>
      </topic>
      <topic id="1" parent="0" guid="A1" x="200.00" y="0.00" text="Packing">
        <note>Bags &amp; boxes</note>
      </topic>
      <topic id="2" parent="1" guid="A2" x="400.00" y="0.00" text="Passport"/>
      <topic id="3" parent="0" guid="A3" x="200.00" y="100.00" text="Booking">
        <note>Check the passport expiry</note>
      </topic>
    </topics>
    <relations>
      <relation source="2" target="3" guid="R1"/>
    </relations>
  </mindmap>
</simplemind-mindmaps>
"#;

fn fixture(dir: &Path) -> PathBuf {
    let path = dir.join("trip.smmx");
    write_archive(&path, PAYLOAD.as_bytes(), &ArchiveManifest::default()).unwrap();
    path
}

fn as_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn summary_reports_branches_and_missing_notes() {
    let dir = tempfile::tempdir().unwrap();
    let file = fixture(dir.path());

    let ReadResponse::Summary(summary) = read_mindmap(as_str(&file), ReadFormat::Summary).unwrap()
    else {
        panic!("expected summary");
    };
    assert_eq!(summary.title.as_deref(), Some("Trip"));
    assert_eq!(summary.total_nodes, 4);
    assert_eq!(summary.nodes_without_notes, 1);
    assert_eq!(summary.relation_count, 1);
    assert_eq!(summary.branches.len(), 2);
    assert_eq!(summary.branches[0].subtree_size, 2);
}

#[test]
fn structured_read_nests_children() {
    let dir = tempfile::tempdir().unwrap();
    let file = fixture(dir.path());

    let response = read_mindmap(as_str(&file), ReadFormat::Structured).unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["format"], "structured");
    let root = &json["content"]["root"];
    assert_eq!(root["text"], "Trip");
    assert_eq!(root["children"][0]["children"][0]["text"], "Passport");
    assert_eq!(root["children"][0]["children"][0]["cross_links"][0], "3");
}

#[test]
fn search_matches_notes_only_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    let file = fixture(dir.path());

    let text_only = search_nodes(as_str(&file), "passport", false).unwrap();
    assert_eq!(text_only.total, 1);
    assert_eq!(text_only.items[0].breadcrumb, "Trip > Packing > Passport");

    let with_notes = search_nodes(as_str(&file), "PASSPORT", true).unwrap();
    let ids = with_notes
        .items
        .iter()
        .map(|item| item.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["2", "3"]);
}

#[test]
fn node_and_path_lookups() {
    let dir = tempfile::tempdir().unwrap();
    let file = fixture(dir.path());

    let node = get_node(as_str(&file), "1").unwrap();
    assert_eq!(node.notes.as_deref(), Some("Bags & boxes"));
    assert_eq!(node.children.len(), 1);

    let path = get_node_path(as_str(&file), "2").unwrap();
    assert_eq!(path.breadcrumb, "Trip > Packing > Passport");
    assert_eq!(path.path.len(), 3);

    let err = get_node(as_str(&file), "99").unwrap_err();
    assert_eq!(err.kind, "node_not_found");
    assert_eq!(err.node_id.as_deref(), Some("99"));
}

#[test]
fn mutations_report_written_path_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let file = fixture(dir.path());
    let file_str = as_str(&file);

    let added = add_node(file_str, "1", "Charger", None, None).unwrap();
    assert_eq!(added.node_id, "4");
    assert_eq!(added.written_path, file_str);

    let missing = find_nodes_without_notes(file_str).unwrap();
    assert_eq!(missing.total, 2);

    update_node(file_str, "4", None, Some("USB-C".to_string()), None).unwrap();
    assert_eq!(find_nodes_without_notes(file_str).unwrap().total, 1);

    let deleted = delete_node(file_str, "1", None).unwrap();
    assert_eq!(deleted.removed_ids.len(), 3);
    assert_eq!(deleted.removed_ids[0], "1");

    let err = delete_node(file_str, "0", None).unwrap_err();
    assert_eq!(err.kind, "invalid_operation");
}

#[test]
fn empty_update_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let file = fixture(dir.path());

    let err = update_node(as_str(&file), "1", None, None, None).unwrap_err();
    assert_eq!(err.kind, "invalid_operation");
}

#[test]
fn export_writes_markdown_to_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let file = fixture(dir.path());
    let out = dir.path().join("trip.md");

    let response = export_mindmap(as_str(&file), "markdown", Some(as_str(&out))).unwrap();
    assert!(response.content.starts_with("# Trip\n"));
    assert!(response.content.contains("## Packing"));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), response.content);

    let err = export_mindmap(as_str(&file), "pdf", None).unwrap_err();
    assert_eq!(err.kind, "invalid_operation");
}

#[test]
fn missing_file_is_an_io_error_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.smmx");

    let err = read_mindmap(as_str(&missing), ReadFormat::Markdown).unwrap_err();
    assert_eq!(err.kind, "io_error");
    assert_eq!(err.path.as_deref(), Some(as_str(&missing)));
}
