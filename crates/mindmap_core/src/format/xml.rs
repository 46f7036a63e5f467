//! Lossless XML event layer shared by the parser and the writer.
//!
//! # Responsibility
//! - Turn payload bytes into a generic element tree (no schema knowledge).
//! - Emit generic nodes back as XML events.
//!
//! # Invariants
//! - Text inside elements is kept exactly, including whitespace runs.
//! - Blank text outside the root element is dropped; anything else there is kept.
//! - Written attribute values carry `\n`, `\r` and `\t` as character references
//!   so conforming readers do not normalize them to spaces.

use super::{FormatError, FormatResult};
use crate::model::passthrough::{XmlAttribute, XmlDeclaration, XmlElement, XmlNode};
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::fmt::Display;

/// Generic parse result: declaration, out-of-root content and the root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlDocument {
    pub declaration: Option<XmlDeclaration>,
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
    pub epilog: Vec<XmlNode>,
}

pub(crate) fn read_document(payload: &[u8]) -> FormatResult<XmlDocument> {
    let text =
        std::str::from_utf8(payload).map_err(|err| FormatError::Encoding(err.to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut declaration = None;
    let mut prolog = Vec::new();
    let mut epilog = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut stack: Vec<XmlElement> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|err| FormatError::Syntax {
            position: reader.buffer_position() as u64,
            message: err.to_string(),
        })?;

        let content = match event {
            Event::Decl(decl) => {
                if root.is_some() || !stack.is_empty() || !prolog.is_empty() {
                    return Err(FormatError::Schema(
                        "XML declaration must come first".to_string(),
                    ));
                }
                declaration = Some(read_declaration(&decl)?);
                continue;
            }
            Event::Start(start) => {
                stack.push(read_element_head(&start)?);
                continue;
            }
            Event::Empty(start) => {
                let element = read_element_head(&start)?;
                close_element(element, &mut stack, &mut root)?;
                continue;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| FormatError::Syntax {
                    position: reader.buffer_position() as u64,
                    message: "unexpected closing tag".to_string(),
                })?;
                close_element(element, &mut stack, &mut root)?;
                continue;
            }
            Event::Text(text) => XmlNode::Text(
                text.unescape()
                    .map_err(|err| FormatError::Syntax {
                        position: reader.buffer_position() as u64,
                        message: err.to_string(),
                    })?
                    .into_owned(),
            ),
            Event::CData(data) => XmlNode::CData(utf8(&data)?),
            Event::Comment(comment) => XmlNode::Comment(utf8(&comment)?),
            Event::PI(instruction) => XmlNode::ProcessingInstruction(utf8(&instruction)?),
            Event::DocType(doctype) => XmlNode::DocType(utf8(&doctype)?.trim().to_string()),
            Event::Eof => break,
        };

        if let Some(parent) = stack.last_mut() {
            parent.children.push(content);
        } else if content.is_blank_text() {
            continue;
        } else if matches!(content, XmlNode::Text(_) | XmlNode::CData(_)) {
            return Err(FormatError::Schema(
                "text content outside the root element".to_string(),
            ));
        } else if root.is_none() {
            prolog.push(content);
        } else {
            epilog.push(content);
        }
    }

    if let Some(open) = stack.last() {
        return Err(FormatError::Syntax {
            position: reader.buffer_position() as u64,
            message: format!("unclosed element `{}`", open.name),
        });
    }
    let root = root.ok_or_else(|| FormatError::Schema("document has no root element".to_string()))?;

    Ok(XmlDocument {
        declaration,
        prolog,
        root,
        epilog,
    })
}

fn close_element(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> FormatResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(FormatError::Schema(format!(
            "second root element `{}`",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}

fn read_element_head(start: &BytesStart<'_>) -> FormatResult<XmlElement> {
    let mut element = XmlElement::new(utf8(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| schema_error("attribute", err))?;
        let name = utf8(attribute.key.as_ref())?;
        let value = attribute
            .unescape_value()
            .map_err(|err| schema_error("attribute value", err))?
            .into_owned();
        element.attributes.push(XmlAttribute { name, value });
    }
    Ok(element)
}

fn read_declaration(decl: &BytesDecl<'_>) -> FormatResult<XmlDeclaration> {
    let version = utf8(&decl.version().map_err(|err| schema_error("declaration", err))?)?;
    let encoding = match decl.encoding() {
        Some(value) => Some(utf8(&value.map_err(|err| schema_error("declaration", err))?)?),
        None => None,
    };
    let standalone = match decl.standalone() {
        Some(value) => Some(utf8(&value.map_err(|err| schema_error("declaration", err))?)?),
        None => None,
    };
    Ok(XmlDeclaration {
        version,
        encoding,
        standalone,
    })
}

fn utf8(bytes: &[u8]) -> FormatResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|err| FormatError::Encoding(err.to_string()))
}

fn schema_error(context: &str, err: impl Display) -> FormatError {
    FormatError::Schema(format!("invalid {context}: {err}"))
}

/// Event sink used by the payload writer.
pub(crate) struct XmlSink {
    writer: Writer<Vec<u8>>,
}

impl XmlSink {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner()
    }

    pub fn declaration(&mut self, decl: &XmlDeclaration) -> FormatResult<()> {
        self.emit(Event::Decl(BytesDecl::new(
            &decl.version,
            decl.encoding.as_deref(),
            decl.standalone.as_deref(),
        )))
    }

    /// Writes a newline followed by `depth` levels of two-space indentation.
    pub fn indent(&mut self, depth: usize) -> FormatResult<()> {
        let padding = format!("\n{}", "  ".repeat(depth));
        self.emit(Event::Text(BytesText::from_escaped(padding)))
    }

    pub fn start(&mut self, name: &str, attributes: &[(&str, &str)], empty: bool) -> FormatResult<()> {
        let mut start = BytesStart::new(name);
        for (key, value) in attributes {
            start.push_attribute(Attribute {
                key: QName(key.as_bytes()),
                value: Cow::Owned(escape_attribute(value).into_bytes()),
            });
        }
        if empty {
            self.emit(Event::Empty(start))
        } else {
            self.emit(Event::Start(start))
        }
    }

    pub fn end(&mut self, name: &str) -> FormatResult<()> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    pub fn text(&mut self, value: &str) -> FormatResult<()> {
        let escaped = escape(value);
        let escaped = if escaped.contains('\r') {
            Cow::Owned(escaped.replace('\r', "&#13;"))
        } else {
            escaped
        };
        self.emit(Event::Text(BytesText::from_escaped(escaped)))
    }

    /// Writes a generic node exactly as it was read.
    pub fn node(&mut self, node: &XmlNode) -> FormatResult<()> {
        match node {
            XmlNode::Element(element) => {
                let attributes = attribute_pairs(&element.attributes);
                if element.children.is_empty() {
                    return self.start(&element.name, &attributes, true);
                }
                self.start(&element.name, &attributes, false)?;
                for child in &element.children {
                    self.node(child)?;
                }
                self.end(&element.name)
            }
            XmlNode::Text(value) => self.text(value),
            XmlNode::CData(value) => self.emit(Event::CData(BytesCData::new(value.as_str()))),
            XmlNode::Comment(value) => {
                self.emit(Event::Comment(BytesText::from_escaped(value.as_str())))
            }
            XmlNode::ProcessingInstruction(value) => {
                self.emit(Event::PI(BytesPI::new(value.as_str())))
            }
            XmlNode::DocType(value) => {
                self.emit(Event::DocType(BytesText::from_escaped(value.as_str())))
            }
        }
    }

    fn emit(&mut self, event: Event<'_>) -> FormatResult<()> {
        self.writer
            .write_event(event)
            .map_err(|err| FormatError::Write(err.to_string()))
    }
}

/// Markup-escapes `value` and turns line breaks and tabs into character references.
fn escape_attribute(value: &str) -> String {
    let escaped = escape(value);
    let mut out = String::with_capacity(escaped.len());
    for ch in escaped.chars() {
        match ch {
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            other => out.push(other),
        }
    }
    out
}

pub(crate) fn attribute_pairs(attributes: &[XmlAttribute]) -> Vec<(&str, &str)> {
    attributes
        .iter()
        .map(|attribute| (attribute.name.as_str(), attribute.value.as_str()))
        .collect()
}
