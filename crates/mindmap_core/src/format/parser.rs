//! SimpleMind schema mapping from the generic element tree to [`MindMap`].
//!
//! Managed levels (wrapper, `mindmap`, `topics`, `relations`, `topic`) drop
//! indentation-only text; everything below an unmanaged element is kept as is.

use super::xml::{read_document, XmlDocument};
use super::{FormatError, FormatResult};
use crate::model::mindmap::{MindMap, Relation};
use crate::model::node::{normalize_notes, Node, NodeId, Position, ROOT_PARENT_SENTINEL};
use crate::model::passthrough::{
    ChildSlot, DocumentPassthrough, ManagedChild, Passthrough, Section, XmlElement, XmlNode,
};

pub(crate) const WRAPPER_ELEMENT: &str = "simplemind-mindmaps";
pub(crate) const MINDMAP_ELEMENT: &str = "mindmap";
pub(crate) const TOPICS_ELEMENT: &str = "topics";
pub(crate) const TOPIC_ELEMENT: &str = "topic";
pub(crate) const RELATIONS_ELEMENT: &str = "relations";
pub(crate) const RELATION_ELEMENT: &str = "relation";
pub(crate) const NOTE_ELEMENT: &str = "note";
pub(crate) const LINK_ELEMENT: &str = "link";
pub(crate) const URL_ATTRIBUTE: &str = "urllink";

/// Parses a `document/mindmap.xml` payload.
///
/// # Errors
/// - `FormatError::Encoding` / `FormatError::Syntax` for unreadable XML.
/// - `FormatError::Schema` when required elements or attributes are missing.
/// - `FormatError::Structure` when topics do not form a single tree.
pub fn parse_mindmap(payload: &[u8]) -> FormatResult<MindMap> {
    let XmlDocument {
        declaration,
        prolog,
        root: wrapper,
        epilog,
    } = read_document(payload)?;

    if wrapper.name != WRAPPER_ELEMENT {
        return Err(FormatError::Schema(format!(
            "expected `{WRAPPER_ELEMENT}` root element, found `{}`",
            wrapper.name
        )));
    }

    let mut wrapper_before = Vec::new();
    let mut wrapper_after = Vec::new();
    let mut mindmap = None;
    for child in wrapper.children {
        match child {
            XmlNode::Element(element) if element.name == MINDMAP_ELEMENT && mindmap.is_none() => {
                mindmap = Some(element);
            }
            other if other.is_blank_text() => {}
            other if mindmap.is_none() => wrapper_before.push(other),
            other => wrapper_after.push(other),
        }
    }
    let mindmap = mindmap.ok_or_else(|| {
        FormatError::Schema(format!("`{WRAPPER_ELEMENT}` has no `{MINDMAP_ELEMENT}` element"))
    })?;

    let mut nodes = Vec::new();
    let mut relations = Vec::new();
    let mut sections = Vec::new();
    let mut seen_topics = false;
    let mut seen_relations = false;
    for child in mindmap.children {
        match child {
            XmlNode::Element(element) if element.name == TOPICS_ELEMENT && !seen_topics => {
                seen_topics = true;
                sections.push(read_topics(element, &mut nodes)?);
            }
            XmlNode::Element(element) if element.name == RELATIONS_ELEMENT && !seen_relations => {
                seen_relations = true;
                sections.push(read_relations(element, &mut relations)?);
            }
            other if other.is_blank_text() => {}
            other => sections.push(Section::Opaque { node: other }),
        }
    }
    if !seen_topics {
        return Err(FormatError::Schema(format!(
            "`{MINDMAP_ELEMENT}` has no `{TOPICS_ELEMENT}` element"
        )));
    }

    let passthrough = DocumentPassthrough {
        declaration,
        prolog,
        wrapper_name: wrapper.name,
        wrapper_attributes: wrapper.attributes,
        wrapper_before,
        wrapper_after,
        mindmap_attributes: mindmap.attributes,
        sections,
        epilog,
    };
    Ok(MindMap::from_nodes(nodes, relations, passthrough)?)
}

fn read_topics(element: XmlElement, nodes: &mut Vec<Node>) -> FormatResult<Section> {
    let mut extra = Vec::new();
    for child in element.children {
        match child {
            XmlNode::Element(topic) if topic.name == TOPIC_ELEMENT => {
                read_topic(topic, None, nodes)?;
            }
            other if other.is_blank_text() => {}
            other => extra.push(other),
        }
    }
    Ok(Section::Topics {
        attributes: element.attributes,
        extra,
    })
}

/// Reads one topic and any topics nested inside it.
///
/// `enclosing` is the id of the topic this element is nested in; it implies
/// the parent when the `parent` attribute is absent and must agree with it
/// otherwise.
fn read_topic(
    element: XmlElement,
    enclosing: Option<&NodeId>,
    nodes: &mut Vec<Node>,
) -> FormatResult<()> {
    let mut id = None;
    let mut parent = None;
    let mut text = String::new();
    let mut position = Position::default();
    let mut guid = None;
    let mut icon = None;
    let mut passthrough = Passthrough::default();

    for attribute in element.attributes {
        match attribute.name.as_str() {
            "id" => id = Some(attribute.value),
            "parent" => parent = Some(attribute.value),
            "x" => position.x = parse_coordinate("x", &attribute.value)?,
            "y" => position.y = parse_coordinate("y", &attribute.value)?,
            "text" => text = attribute.value,
            "guid" => guid = Some(attribute.value),
            "icon" => icon = Some(attribute.value),
            _ => passthrough.attributes.push(attribute),
        }
    }

    let id = match id {
        Some(value) if !value.trim().is_empty() => NodeId::from(value),
        _ => {
            return Err(FormatError::Schema(
                "topic without an `id` attribute".to_string(),
            ))
        }
    };
    let parent_id = resolve_parent(&id, parent, enclosing)?;

    let mut notes = None;
    let mut url_link = None;
    let mut nested = Vec::new();
    for child in element.children {
        match child {
            XmlNode::Element(topic) if topic.name == TOPIC_ELEMENT => nested.push(topic),
            XmlNode::Element(note)
                if note.name == NOTE_ELEMENT
                    && is_character_data_only(&note)
                    && passthrough.managed_slot(ManagedChild::Notes).is_none() =>
            {
                notes = normalize_notes(Some(note.text_content()));
                passthrough.children.push(ChildSlot::Managed {
                    child: ManagedChild::Notes,
                    attributes: note.attributes,
                });
            }
            XmlNode::Element(link)
                if link.name == LINK_ELEMENT
                    && link.children.iter().all(XmlNode::is_blank_text)
                    && passthrough.managed_slot(ManagedChild::Link).is_none() =>
            {
                let mut attributes = Vec::with_capacity(link.attributes.len());
                for attribute in link.attributes {
                    if attribute.name == URL_ATTRIBUTE && url_link.is_none() {
                        url_link = Some(attribute.value);
                    } else {
                        attributes.push(attribute);
                    }
                }
                passthrough.children.push(ChildSlot::Managed {
                    child: ManagedChild::Link,
                    attributes,
                });
            }
            other if other.is_blank_text() => {}
            other => passthrough.children.push(ChildSlot::Opaque { node: other }),
        }
    }

    let mut node = Node::new(id, parent_id, text);
    node.notes = notes;
    node.position = position;
    node.attributes.guid = guid;
    node.attributes.icon = icon;
    node.attributes.url_link = url_link;
    node.attributes.passthrough = passthrough;
    let id = node.id.clone();
    nodes.push(node);

    for topic in nested {
        read_topic(topic, Some(&id), nodes)?;
    }
    Ok(())
}

fn resolve_parent(
    id: &NodeId,
    declared: Option<String>,
    enclosing: Option<&NodeId>,
) -> FormatResult<Option<NodeId>> {
    match (declared, enclosing) {
        (None, Some(enclosing)) => Ok(Some(enclosing.clone())),
        (None, None) => Err(FormatError::Schema(format!(
            "topic `{id}` has no `parent` attribute"
        ))),
        (Some(value), None) if value == ROOT_PARENT_SENTINEL => Ok(None),
        (Some(value), None) => Ok(Some(NodeId::from(value))),
        (Some(value), Some(enclosing)) if value == enclosing.as_str() => {
            Ok(Some(enclosing.clone()))
        }
        (Some(value), Some(enclosing)) => Err(FormatError::Schema(format!(
            "topic `{id}` is nested in `{enclosing}` but declares parent `{value}`"
        ))),
    }
}

fn read_relations(element: XmlElement, relations: &mut Vec<Relation>) -> FormatResult<Section> {
    let mut extra = Vec::new();
    for child in element.children {
        match child {
            XmlNode::Element(relation) if relation.name == RELATION_ELEMENT => {
                relations.push(read_relation(relation)?);
            }
            other if other.is_blank_text() => {}
            other => extra.push(other),
        }
    }
    Ok(Section::Relations {
        attributes: element.attributes,
        extra,
    })
}

fn read_relation(element: XmlElement) -> FormatResult<Relation> {
    let mut source = None;
    let mut target = None;
    let mut passthrough = Passthrough::default();
    for attribute in element.attributes {
        match attribute.name.as_str() {
            "source" if source.is_none() => source = Some(NodeId::from(attribute.value)),
            "target" if target.is_none() => target = Some(NodeId::from(attribute.value)),
            _ => passthrough.attributes.push(attribute),
        }
    }
    for child in element.children {
        if !child.is_blank_text() {
            passthrough.children.push(ChildSlot::Opaque { node: child });
        }
    }

    match (source, target) {
        (Some(source), Some(target)) => Ok(Relation {
            source,
            target,
            passthrough,
        }),
        _ => Err(FormatError::Schema(
            "relation without `source` and `target` attributes".to_string(),
        )),
    }
}

fn parse_coordinate(name: &str, value: &str) -> FormatResult<f64> {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(FormatError::Schema(format!(
            "coordinate `{name}` is not a finite number: `{value}`"
        ))),
    }
}

fn is_character_data_only(element: &XmlElement) -> bool {
    element
        .children
        .iter()
        .all(|child| matches!(child, XmlNode::Text(_) | XmlNode::CData(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mindmap::StructureError;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE simplemind-mindmaps>
<simplemind-mindmaps generator="SimpleMind" gen-version="2.5.0" doc-version="3">
  <mindmap>
    <meta>
      <guid guid="A1B2"/>
      <title text="Project"/>
      <style key="system.soft-colors"/>
    </meta>
    <topics>
      <topic id="0" parent="-1" guid="G0" x="1000.00" y="1000.00" text="Project" palette="1" colorinfo="1">
        <note>Root notes</note>
        <layout mode="free"/>
      </topic>
      <topic id="1" parent="0" guid="G1" x="1200.00" y="1000.00" text="Overview" icon="stock:star">
        <link urllink="https://example.com" target="_blank"/>
      </topic>
      <topic id="2" parent="0" x="1200.00" y="1100.00" text="Research"/>
    </topics>
    <relations>
      <relation guid="R1" source="1" target="2"/>
    </relations>
    <node-groups/>
  </mindmap>
</simplemind-mindmaps>
"#;

    #[test]
    fn parses_managed_fields_and_keeps_the_rest() {
        let map = parse_mindmap(SAMPLE.as_bytes()).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.title(), Some("Project"));

        let root = map.root();
        assert_eq!(root.text, "Project");
        assert_eq!(root.notes.as_deref(), Some("Root notes"));
        assert_eq!(root.attributes.guid.as_deref(), Some("G0"));
        assert_eq!(root.position, Position::new(1000.0, 1000.0));
        assert_eq!(root.attributes.passthrough.attributes.len(), 2);
        assert_eq!(root.attributes.passthrough.opaque_children().count(), 1);

        let overview = map.get(&NodeId::from("1")).unwrap();
        assert_eq!(overview.attributes.icon.as_deref(), Some("stock:star"));
        assert_eq!(
            overview.attributes.url_link.as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            overview
                .attributes
                .passthrough
                .managed_slot(ManagedChild::Link)
                .map(<[_]>::len),
            Some(1)
        );

        assert_eq!(map.relations().len(), 1);
        assert_eq!(map.relations()[0].target, NodeId::from("2"));
        assert!(map.passthrough().section_element("node-groups").is_some());
    }

    #[test]
    fn nested_topics_take_the_enclosing_parent() {
        let xml = r#"<simplemind-mindmaps><mindmap><topics>
            <topic id="0" parent="-1" text="Root">
              <topic id="1" text="Child"><topic id="2" parent="1" text="Grandchild"/></topic>
            </topic>
        </topics></mindmap></simplemind-mindmaps>"#;
        let map = parse_mindmap(xml.as_bytes()).unwrap();
        assert_eq!(map.get(&NodeId::from("2")).unwrap().parent_id, Some(NodeId::from("1")));
        assert_eq!(map.root().children, vec![NodeId::from("1")]);
    }

    #[test]
    fn conflicting_nested_parent_is_rejected() {
        let xml = r#"<simplemind-mindmaps><mindmap><topics>
            <topic id="0" parent="-1" text="Root"><topic id="1" parent="7" text="X"/></topic>
        </topics></mindmap></simplemind-mindmaps>"#;
        assert!(matches!(
            parse_mindmap(xml.as_bytes()),
            Err(FormatError::Schema(_))
        ));
    }

    #[test]
    fn schema_and_structure_errors() {
        let wrong_root = b"<mindmap><topics/></mindmap>";
        assert!(matches!(parse_mindmap(wrong_root), Err(FormatError::Schema(_))));

        let no_topics = b"<simplemind-mindmaps><mindmap/></simplemind-mindmaps>";
        assert!(matches!(parse_mindmap(no_topics), Err(FormatError::Schema(_))));

        let empty_topics = b"<simplemind-mindmaps><mindmap><topics/></mindmap></simplemind-mindmaps>";
        assert_eq!(
            parse_mindmap(empty_topics).unwrap_err(),
            FormatError::Structure(StructureError::MissingRoot)
        );

        let dangling = br#"<simplemind-mindmaps><mindmap><topics>
            <topic id="0" parent="-1" text="Root"/><topic id="1" parent="5" text="Lost"/>
        </topics></mindmap></simplemind-mindmaps>"#;
        assert!(matches!(
            parse_mindmap(dangling),
            Err(FormatError::Structure(StructureError::DanglingParent { .. }))
        ));

        let floating = br#"<simplemind-mindmaps><mindmap><topics>
            <topic id="0" parent="-1" text="Root"/><topic id="1" parent="-1" text="Float"/>
        </topics></mindmap></simplemind-mindmaps>"#;
        assert!(matches!(
            parse_mindmap(floating),
            Err(FormatError::Structure(StructureError::MultipleRoots { .. }))
        ));

        let bad_x = br#"<simplemind-mindmaps><mindmap><topics>
            <topic id="0" parent="-1" x="left" text="Root"/>
        </topics></mindmap></simplemind-mindmaps>"#;
        assert!(matches!(parse_mindmap(bad_x), Err(FormatError::Schema(_))));
    }

    #[test]
    fn empty_note_is_absent_but_slot_is_kept() {
        let xml = br#"<simplemind-mindmaps><mindmap><topics>
            <topic id="0" parent="-1" text="Root"><note/></topic>
        </topics></mindmap></simplemind-mindmaps>"#;
        let map = parse_mindmap(xml).unwrap();
        assert_eq!(map.root().notes, None);
        assert!(map
            .root()
            .attributes
            .passthrough
            .managed_slot(ManagedChild::Notes)
            .is_some());
    }

    #[test]
    fn cdata_notes_and_escaped_text_are_decoded() {
        let xml = br#"<simplemind-mindmaps><mindmap><topics>
            <topic id="0" parent="-1" text="R &amp; D\NPlan"><note><![CDATA[a < b]]></note></topic>
        </topics></mindmap></simplemind-mindmaps>"#;
        let map = parse_mindmap(xml).unwrap();
        assert_eq!(map.root().text, "R & D\\NPlan");
        assert_eq!(map.root().notes.as_deref(), Some("a < b"));
    }
}
