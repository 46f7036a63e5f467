//! Opaque XML content carried through a load/save cycle.
//!
//! # Responsibility
//! - Hold every element, attribute and text run the engine does not model.
//! - Record where managed fields sat among unmanaged siblings so the writer
//!   can re-emit both in their original order.
//!
//! # Invariants
//! - Text and attribute values are stored unescaped; escaping happens only in
//!   the writer.
//! - Whitespace inside opaque elements is kept as-is.

use serde::{Deserialize, Serialize};

/// One `name="value"` pair from an element start tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Element with its attributes and mixed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the unescaped value of the first attribute named `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Iterates direct child elements, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Concatenated text and CDATA content of direct children.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(text) | XmlNode::CData(text) => out.push_str(text),
                _ => {}
            }
        }
        out
    }
}

/// Any piece of XML content below the document root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

impl XmlNode {
    /// Whether this node is a text run made only of whitespace.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, XmlNode::Text(text) if text.trim().is_empty())
    }
}

/// Managed child element of a topic whose position is remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagedChild {
    Notes,
    Link,
}

/// Ordered child slot of a topic element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "slot")]
pub enum ChildSlot {
    /// Position of a managed element plus the attributes the engine ignores.
    Managed {
        child: ManagedChild,
        attributes: Vec<XmlAttribute>,
    },
    /// Unmanaged content, written back verbatim.
    Opaque { node: XmlNode },
}

/// Unmanaged attributes and child content owned by one topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passthrough {
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<ChildSlot>,
}

impl Passthrough {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self
                .children
                .iter()
                .all(|slot| matches!(slot, ChildSlot::Managed { attributes, .. } if attributes.is_empty()))
    }

    /// Returns the recorded slot for a managed child, if the source had one.
    pub fn managed_slot(&self, child: ManagedChild) -> Option<&[XmlAttribute]> {
        self.children.iter().find_map(|slot| match slot {
            ChildSlot::Managed {
                child: current,
                attributes,
            } if *current == child => Some(attributes.as_slice()),
            _ => None,
        })
    }

    /// Records a slot for `child` at the end unless one already exists.
    pub fn ensure_managed_slot(&mut self, child: ManagedChild) {
        if self.managed_slot(child).is_none() {
            self.children.push(ChildSlot::Managed {
                child,
                attributes: Vec::new(),
            });
        }
    }

    /// Drops the slot for `child` when it carries no attributes of its own.
    pub fn release_managed_slot(&mut self, child: ManagedChild) {
        self.children.retain(|slot| {
            !matches!(
                slot,
                ChildSlot::Managed { child: current, attributes }
                    if *current == child && attributes.is_empty()
            )
        });
    }

    /// Iterates opaque child content in source order.
    pub fn opaque_children(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter_map(|slot| match slot {
            ChildSlot::Opaque { node } => Some(node),
            ChildSlot::Managed { .. } => None,
        })
    }
}

/// `<?xml ...?>` declaration fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("utf-8".to_string()),
            standalone: None,
        }
    }
}

/// Managed section of the `mindmap` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "section")]
pub enum Section {
    /// The `topics` list; `extra` holds non-topic children written after the topics.
    Topics {
        attributes: Vec<XmlAttribute>,
        extra: Vec<XmlNode>,
    },
    /// The `relations` list; `extra` holds non-relation children.
    Relations {
        attributes: Vec<XmlAttribute>,
        extra: Vec<XmlNode>,
    },
    Opaque { node: XmlNode },
}

/// Document-level content the engine does not interpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPassthrough {
    pub declaration: Option<XmlDeclaration>,
    /// Doctype, comments and processing instructions before the root element.
    pub prolog: Vec<XmlNode>,
    pub wrapper_name: String,
    pub wrapper_attributes: Vec<XmlAttribute>,
    /// Wrapper children before the `mindmap` element.
    pub wrapper_before: Vec<XmlNode>,
    /// Wrapper children after the `mindmap` element.
    pub wrapper_after: Vec<XmlNode>,
    pub mindmap_attributes: Vec<XmlAttribute>,
    pub sections: Vec<Section>,
    /// Comments and processing instructions after the root element.
    pub epilog: Vec<XmlNode>,
}

impl Default for DocumentPassthrough {
    fn default() -> Self {
        Self {
            declaration: Some(XmlDeclaration::default()),
            prolog: vec![XmlNode::DocType("simplemind-mindmaps".to_string())],
            wrapper_name: "simplemind-mindmaps".to_string(),
            wrapper_attributes: vec![
                XmlAttribute::new("generator", "mindmap_core"),
                XmlAttribute::new("gen-version", env!("CARGO_PKG_VERSION")),
                XmlAttribute::new("doc-version", "3"),
            ],
            wrapper_before: Vec::new(),
            wrapper_after: Vec::new(),
            mindmap_attributes: Vec::new(),
            sections: vec![
                Section::Topics {
                    attributes: Vec::new(),
                    extra: Vec::new(),
                },
                Section::Relations {
                    attributes: Vec::new(),
                    extra: Vec::new(),
                },
            ],
            epilog: Vec::new(),
        }
    }
}

impl DocumentPassthrough {
    /// Finds an opaque `mindmap` section element by name.
    pub fn section_element(&self, name: &str) -> Option<&XmlElement> {
        self.sections.iter().find_map(|section| match section {
            Section::Opaque {
                node: XmlNode::Element(element),
            } if element.name == name => Some(element),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_joins_text_and_cdata() {
        let mut element = XmlElement::new("note");
        element.children.push(XmlNode::Text("a ".to_string()));
        element.children.push(XmlNode::CData("<b>".to_string()));
        element.children.push(XmlNode::Comment("skip".to_string()));
        assert_eq!(element.text_content(), "a <b>");
    }

    #[test]
    fn passthrough_with_only_bare_managed_slots_is_empty() {
        let passthrough = Passthrough {
            attributes: Vec::new(),
            children: vec![ChildSlot::Managed {
                child: ManagedChild::Notes,
                attributes: Vec::new(),
            }],
        };
        assert!(passthrough.is_empty());
        assert_eq!(passthrough.managed_slot(ManagedChild::Notes), Some(&[][..]));
        assert_eq!(passthrough.managed_slot(ManagedChild::Link), None);
    }

    #[test]
    fn managed_slots_are_added_once_and_released_when_bare() {
        let mut passthrough = Passthrough::default();
        passthrough.ensure_managed_slot(ManagedChild::Notes);
        passthrough.ensure_managed_slot(ManagedChild::Notes);
        assert_eq!(passthrough.children.len(), 1);

        passthrough.release_managed_slot(ManagedChild::Notes);
        assert!(passthrough.children.is_empty());

        passthrough.children.push(ChildSlot::Managed {
            child: ManagedChild::Link,
            attributes: vec![XmlAttribute::new("target", "_blank")],
        });
        passthrough.release_managed_slot(ManagedChild::Link);
        assert_eq!(passthrough.children.len(), 1);
    }
}
