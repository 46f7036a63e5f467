#![allow(dead_code)]

use mindmap_core::archive::{write_archive, ArchiveEntry, ArchiveManifest, EntryCompression};
use mindmap_core::{MindMap, NodeId};
use std::path::{Path, PathBuf};

pub const FIXTURE_NODE_COUNT: usize = 43;
pub const FIXTURE_WITHOUT_NOTES: usize = 8;
pub const IMAGE_ENTRY: &str = "images/3F2A9C.png";
pub const IMAGE_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 7, 7, 7];

/// Topics lacking notes: "Overview", one empty `<note/>` and six leaves.
const WITHOUT_NOTES: &[u64] = &[1, 9, 12, 20, 25, 30, 33, 40];

struct Topic {
    id: u64,
    parent: Option<u64>,
    text: String,
}

fn topics() -> Vec<Topic> {
    let mut topics = vec![Topic {
        id: 0,
        parent: None,
        text: "Project".to_string(),
    }];
    let branches = ["Overview", "Research", "Development", "Marketing", "Operations"];
    for (index, text) in branches.iter().enumerate() {
        topics.push(Topic {
            id: index as u64 + 1,
            parent: Some(0),
            text: text.to_string(),
        });
    }
    topics.push(Topic {
        id: 6,
        parent: Some(2),
        text: "Papers".to_string(),
    });
    topics.push(Topic {
        id: 7,
        parent: Some(2),
        text: "Interviews".to_string(),
    });

    // Development 8..=17, Marketing 18..=27, Operations 28..=37, Overview 38..=42.
    let groups: [(u64, u64, &str); 4] = [(3, 8, "Task"), (4, 18, "Campaign"), (5, 28, "Process"), (1, 38, "Goal")];
    for (parent, first, label) in groups {
        let count = if parent == 1 { 5 } else { 10 };
        for offset in 0..count {
            topics.push(Topic {
                id: first + offset,
                parent: Some(parent),
                text: format!("{label} {}", offset + 1),
            });
        }
    }
    topics
}

/// SimpleMind payload with 43 topics, one cross-link and Pro-only extras.
pub fn fixture_xml() -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <!DOCTYPE simplemind-mindmaps>\n\
         <simplemind-mindmaps generator=\"SimpleMind\" gen-version=\"2.5.0\" doc-version=\"3\">\n\
         \x20 <mindmap>\n\
         \x20   <meta>\n\
         \x20     <guid guid=\"5C4A1E2B\"/>\n\
         \x20     <title text=\"Project Plan\"/>\n\
         \x20     <style key=\"system.soft-colors\"/>\n\
         \x20     <auto-numbering style=\"disabled\"/>\n\
         \x20     <scrollstate zoom=\"100\" x=\"120\" y=\"80\"/>\n\
         \x20   </meta>\n\
         \x20   <topics>\n",
    );

    for topic in topics() {
        let parent = topic
            .parent
            .map_or_else(|| "-1".to_string(), |parent| parent.to_string());
        let x = 1000 + 200 * i64::from(topic.parent.is_some()) + topic.id as i64 * 3;
        let y = 1000 + topic.id as i64 * 40;
        xml.push_str(&format!(
            "      <topic id=\"{id}\" parent=\"{parent}\" guid=\"G{id:04}\" x=\"{x}.00\" y=\"{y}.00\" text=\"{text}\" palette=\"{palette}\" colorinfo=\"{palette}\"",
            id = topic.id,
            text = topic.text,
            palette = topic.id % 7 + 1,
        ));
        if topic.id == 3 {
            xml.push_str(" icon=\"stock:flag-green\"");
        }
        xml.push_str(">\n");

        if topic.id == 9 {
            xml.push_str("        <note></note>\n");
        } else if !WITHOUT_NOTES.contains(&topic.id) {
            xml.push_str(&format!(
                "        <note>Notes for {} &amp; follow-ups\\Nsecond line</note>\n",
                topic.text
            ));
        }
        if topic.id == 0 {
            xml.push_str("        <layout mode=\"free\" direction=\"auto\" flow=\"default\"/>\n");
        }
        if topic.id == 4 {
            xml.push_str("        <link urllink=\"https://example.com/launch\"/>\n");
            xml.push_str("        <image name=\"3F2A9C\" width=\"64\" height=\"64\"/>\n");
        }
        if topic.id == 8 {
            xml.push_str("        <parent-relation guid=\"PR8\"><style b=\"1\"/></parent-relation>\n");
        }
        xml.push_str("      </topic>\n");
    }

    xml.push_str(
        "    </topics>\n\
         \x20   <relations>\n\
         \x20     <relation guid=\"R1\" source=\"8\" target=\"18\"><style arrow=\"end\"/></relation>\n\
         \x20   </relations>\n\
         \x20   <node-groups/>\n\
         \x20 </mindmap>\n\
         </simplemind-mindmaps>\n",
    );
    xml
}

/// Archive manifest carrying one embedded image before the document entry.
pub fn fixture_manifest() -> ArchiveManifest {
    ArchiveManifest {
        entries: vec![ArchiveEntry {
            name: IMAGE_ENTRY.to_string(),
            data: IMAGE_BYTES.to_vec(),
            compression: EntryCompression::Stored,
            is_dir: false,
            modified: None,
            unix_mode: None,
        }],
        document_slot: 1,
        ..ArchiveManifest::default()
    }
}

/// Writes the fixture archive as `dir/name`.
pub fn write_fixture(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    write_archive(&path, fixture_xml().as_bytes(), &fixture_manifest()).unwrap();
    path
}

/// Id of the first topic (pre-order) whose text equals `text`.
pub fn id_of(map: &MindMap, text: &str) -> NodeId {
    map.nodes()
        .find(|(_, node)| node.text == text)
        .map(|(_, node)| node.id.clone())
        .unwrap()
}
