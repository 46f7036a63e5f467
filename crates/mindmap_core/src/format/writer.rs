//! [`MindMap`] to SimpleMind XML.
//!
//! Managed levels are re-indented with two spaces per level. Containers that
//! hold character data of their own are written without added whitespace so
//! their text survives a reparse unchanged.

use super::parser::{
    LINK_ELEMENT, MINDMAP_ELEMENT, NOTE_ELEMENT, RELATIONS_ELEMENT, RELATION_ELEMENT,
    TOPICS_ELEMENT, TOPIC_ELEMENT, URL_ATTRIBUTE,
};
use super::xml::{attribute_pairs, XmlSink};
use super::{format_coordinate, FormatResult};
use crate::model::mindmap::{MindMap, Relation};
use crate::model::node::{Node, ROOT_PARENT_SENTINEL};
use crate::model::passthrough::{ChildSlot, ManagedChild, Section, XmlAttribute, XmlNode};

/// Serializes a document into `document/mindmap.xml` payload bytes.
///
/// Topics are written as a flat list in pre-order, so sibling order is kept.
pub fn serialize_mindmap(map: &MindMap) -> FormatResult<Vec<u8>> {
    let passthrough = map.passthrough();
    let mut sink = XmlSink::new();
    let mut first = true;

    if let Some(declaration) = &passthrough.declaration {
        sink.declaration(declaration)?;
        first = false;
    }
    for node in &passthrough.prolog {
        top_level_break(&mut sink, &mut first)?;
        sink.node(node)?;
    }

    top_level_break(&mut sink, &mut first)?;
    let wrapper_attributes = attribute_pairs(&passthrough.wrapper_attributes);
    sink.start(&passthrough.wrapper_name, &wrapper_attributes, false)?;

    let pretty = !has_character_data(
        passthrough
            .wrapper_before
            .iter()
            .chain(&passthrough.wrapper_after),
    );
    for node in &passthrough.wrapper_before {
        line(&mut sink, pretty, 1)?;
        sink.node(node)?;
    }
    line(&mut sink, pretty, 1)?;
    write_mindmap(&mut sink, map)?;
    for node in &passthrough.wrapper_after {
        line(&mut sink, pretty, 1)?;
        sink.node(node)?;
    }
    line(&mut sink, pretty, 0)?;
    sink.end(&passthrough.wrapper_name)?;

    for node in &passthrough.epilog {
        sink.indent(0)?;
        sink.node(node)?;
    }
    sink.indent(0)?;

    Ok(sink.into_bytes())
}

fn top_level_break(sink: &mut XmlSink, first: &mut bool) -> FormatResult<()> {
    if *first {
        *first = false;
        return Ok(());
    }
    sink.indent(0)
}

fn write_mindmap(sink: &mut XmlSink, map: &MindMap) -> FormatResult<()> {
    let passthrough = map.passthrough();
    let attributes = attribute_pairs(&passthrough.mindmap_attributes);
    sink.start(MINDMAP_ELEMENT, &attributes, false)?;

    let pretty = !has_character_data(passthrough.sections.iter().filter_map(|section| {
        match section {
            Section::Opaque { node } => Some(node),
            _ => None,
        }
    }));
    for section in &passthrough.sections {
        line(sink, pretty, 2)?;
        match section {
            Section::Topics { attributes, extra } => write_topics(sink, map, attributes, extra)?,
            Section::Relations { attributes, extra } => {
                write_relations(sink, map.relations(), attributes, extra)?
            }
            Section::Opaque { node } => sink.node(node)?,
        }
    }
    if !map.relations().is_empty() && !map.has_relations_section() {
        line(sink, pretty, 2)?;
        write_relations(sink, map.relations(), &[], &[])?;
    }

    line(sink, pretty, 1)?;
    sink.end(MINDMAP_ELEMENT)
}

fn write_topics(
    sink: &mut XmlSink,
    map: &MindMap,
    attributes: &[XmlAttribute],
    extra: &[XmlNode],
) -> FormatResult<()> {
    let pairs = attribute_pairs(attributes);
    sink.start(TOPICS_ELEMENT, &pairs, false)?;
    let pretty = !has_character_data(extra.iter());
    for (_, node) in map.nodes() {
        line(sink, pretty, 3)?;
        write_topic(sink, node, pretty)?;
    }
    for node in extra {
        line(sink, pretty, 3)?;
        sink.node(node)?;
    }
    line(sink, pretty, 2)?;
    sink.end(TOPICS_ELEMENT)
}

fn write_topic(sink: &mut XmlSink, node: &Node, pretty_parent: bool) -> FormatResult<()> {
    let x = format_coordinate(node.position.x);
    let y = format_coordinate(node.position.y);
    let parent = node
        .parent_id
        .as_ref()
        .map_or(ROOT_PARENT_SENTINEL, |parent| parent.as_str());

    let passthrough = &node.attributes.passthrough;
    let mut pairs = vec![("id", node.id.as_str()), ("parent", parent)];
    if let Some(guid) = &node.attributes.guid {
        pairs.push(("guid", guid.as_str()));
    }
    pairs.push(("x", x.as_str()));
    pairs.push(("y", y.as_str()));
    pairs.push(("text", node.text.as_str()));
    if let Some(icon) = &node.attributes.icon {
        pairs.push(("icon", icon.as_str()));
    }
    pairs.extend(attribute_pairs(&passthrough.attributes));

    let notes_slot = passthrough.managed_slot(ManagedChild::Notes);
    let link_slot = passthrough.managed_slot(ManagedChild::Link);
    let trailing_notes = notes_slot.is_none() && node.notes.is_some();
    let trailing_link = link_slot.is_none() && node.attributes.url_link.is_some();
    if passthrough.children.is_empty() && !trailing_notes && !trailing_link {
        return sink.start(TOPIC_ELEMENT, &pairs, true);
    }

    sink.start(TOPIC_ELEMENT, &pairs, false)?;
    let pretty = pretty_parent && !has_character_data(passthrough.opaque_children());
    for slot in &passthrough.children {
        line(sink, pretty, 4)?;
        match slot {
            ChildSlot::Managed {
                child: ManagedChild::Notes,
                attributes,
            } => write_note(sink, node.notes.as_deref(), attributes)?,
            ChildSlot::Managed {
                child: ManagedChild::Link,
                attributes,
            } => write_link(sink, node.attributes.url_link.as_deref(), attributes)?,
            ChildSlot::Opaque { node } => sink.node(node)?,
        }
    }
    if trailing_notes {
        line(sink, pretty, 4)?;
        write_note(sink, node.notes.as_deref(), &[])?;
    }
    if trailing_link {
        line(sink, pretty, 4)?;
        write_link(sink, node.attributes.url_link.as_deref(), &[])?;
    }
    line(sink, pretty, 3)?;
    sink.end(TOPIC_ELEMENT)
}

fn write_note(sink: &mut XmlSink, notes: Option<&str>, attributes: &[XmlAttribute]) -> FormatResult<()> {
    let pairs = attribute_pairs(attributes);
    match notes {
        Some(notes) if !notes.is_empty() => {
            sink.start(NOTE_ELEMENT, &pairs, false)?;
            sink.text(notes)?;
            sink.end(NOTE_ELEMENT)
        }
        _ => sink.start(NOTE_ELEMENT, &pairs, true),
    }
}

fn write_link(sink: &mut XmlSink, url: Option<&str>, attributes: &[XmlAttribute]) -> FormatResult<()> {
    let mut pairs = Vec::with_capacity(attributes.len() + 1);
    if let Some(url) = url {
        pairs.push((URL_ATTRIBUTE, url));
    }
    pairs.extend(attribute_pairs(attributes));
    sink.start(LINK_ELEMENT, &pairs, true)
}

fn write_relations(
    sink: &mut XmlSink,
    relations: &[Relation],
    attributes: &[XmlAttribute],
    extra: &[XmlNode],
) -> FormatResult<()> {
    let pairs = attribute_pairs(attributes);
    if relations.is_empty() && extra.is_empty() {
        return sink.start(RELATIONS_ELEMENT, &pairs, true);
    }

    sink.start(RELATIONS_ELEMENT, &pairs, false)?;
    let pretty = !has_character_data(extra.iter());
    for relation in relations {
        line(sink, pretty, 3)?;
        write_relation(sink, relation, pretty)?;
    }
    for node in extra {
        line(sink, pretty, 3)?;
        sink.node(node)?;
    }
    line(sink, pretty, 2)?;
    sink.end(RELATIONS_ELEMENT)
}

fn write_relation(sink: &mut XmlSink, relation: &Relation, pretty_parent: bool) -> FormatResult<()> {
    let passthrough = &relation.passthrough;
    let mut pairs = vec![
        ("source", relation.source.as_str()),
        ("target", relation.target.as_str()),
    ];
    pairs.extend(attribute_pairs(&passthrough.attributes));
    if passthrough.children.is_empty() {
        return sink.start(RELATION_ELEMENT, &pairs, true);
    }

    sink.start(RELATION_ELEMENT, &pairs, false)?;
    let pretty = pretty_parent && !has_character_data(passthrough.opaque_children());
    for node in passthrough.opaque_children() {
        line(sink, pretty, 4)?;
        sink.node(node)?;
    }
    line(sink, pretty, 3)?;
    sink.end(RELATION_ELEMENT)
}

fn line(sink: &mut XmlSink, pretty: bool, depth: usize) -> FormatResult<()> {
    if pretty {
        sink.indent(depth)
    } else {
        Ok(())
    }
}

fn has_character_data<'a>(mut nodes: impl Iterator<Item = &'a XmlNode>) -> bool {
    nodes.any(|node| matches!(node, XmlNode::Text(_) | XmlNode::CData(_)))
}

#[cfg(test)]
mod tests {
    use super::super::parse_mindmap;
    use super::*;
    use crate::model::node::{NodeId, Position};

    #[test]
    fn fresh_document_writes_simplemind_framing() {
        let mut map = MindMap::new("Central");
        map.get_mut(&NodeId::from("0")).unwrap().position = Position::new(500.0, 250.5);

        let bytes = serialize_mindmap(&map).unwrap();
        let xml = String::from_utf8(bytes.clone()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<!DOCTYPE simplemind-mindmaps>"));
        assert!(xml.contains(
            "<topic id=\"0\" parent=\"-1\" x=\"500.00\" y=\"250.50\" text=\"Central\"/>"
        ));
        assert!(xml.contains("<relations/>"));

        assert_eq!(parse_mindmap(&bytes).unwrap(), map);
    }

    #[test]
    fn mixed_content_in_topic_round_trips() {
        let xml = br#"<simplemind-mindmaps><mindmap><topics>
            <topic id="0" parent="-1" text="Root">lead<style b="1"/>tail<note>n</note></topic>
        </topics></mindmap></simplemind-mindmaps>"#;
        let map = parse_mindmap(xml).unwrap();
        let reparsed = parse_mindmap(&serialize_mindmap(&map).unwrap()).unwrap();
        assert_eq!(reparsed, map);
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut map = MindMap::new("a < b & \"c\"");
        map.get_mut(&NodeId::from("0")).unwrap().notes = Some("x <y> & z".to_string());
        let bytes = serialize_mindmap(&map).unwrap();
        let xml = String::from_utf8(bytes.clone()).unwrap();
        assert!(xml.contains("text=\"a &lt; b &amp; &quot;c&quot;\""));

        let reparsed = parse_mindmap(&bytes).unwrap();
        assert_eq!(reparsed.root().text, "a < b & \"c\"");
        assert_eq!(reparsed.root().notes.as_deref(), Some("x <y> & z"));
    }

    #[test]
    fn edited_text_with_line_breaks_is_written_as_character_references() {
        let mut map = MindMap::new("Root");
        crate::tree::update_node(
            &mut map,
            &NodeId::from("0"),
            crate::tree::NodeUpdate::text("a\nb\tc"),
        )
        .unwrap();

        let bytes = serialize_mindmap(&map).unwrap();
        let xml = String::from_utf8(bytes.clone()).unwrap();
        assert!(xml.contains("text=\"a&#10;b&#9;c\""));
        assert!(!xml.contains("a\nb"));
        assert_eq!(parse_mindmap(&bytes).unwrap().root().text, "a\nb\tc");
    }
}
