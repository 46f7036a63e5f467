//! SimpleMind XML payload codec.
//!
//! # Responsibility
//! - Parse `document/mindmap.xml` into a [`MindMap`](crate::model::mindmap::MindMap).
//! - Serialize a document back to XML without dropping unmanaged content.
//!
//! # Invariants
//! - Parsing is a pure function of the payload bytes.
//! - `parse(serialize(doc)) == doc` for every parsed or engine-mutated document.
//! - Parsing never recovers partially: any schema violation fails the whole load.

use crate::model::mindmap::StructureError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod parser;
mod writer;
mod xml;

pub use parser::parse_mindmap;
pub use writer::serialize_mindmap;

pub type FormatResult<T> = Result<T, FormatError>;

/// Payload is not a well-formed SimpleMind document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Bytes are not UTF-8.
    Encoding(String),
    /// XML syntax error reported by the reader.
    Syntax { position: u64, message: String },
    /// Required element or attribute is missing or invalid.
    Schema(String),
    /// Topic graph violates tree invariants.
    Structure(StructureError),
    /// Writer failure (only possible on a broken sink).
    Write(String),
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encoding(message) => write!(f, "payload is not valid UTF-8: {message}"),
            Self::Syntax { position, message } => {
                write!(f, "malformed XML at byte {position}: {message}")
            }
            Self::Schema(message) => write!(f, "invalid mind map schema: {message}"),
            Self::Structure(err) => write!(f, "invalid topic tree: {err}"),
            Self::Write(message) => write!(f, "failed to serialize payload: {message}"),
        }
    }
}

impl Error for FormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Structure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StructureError> for FormatError {
    fn from(value: StructureError) -> Self {
        Self::Structure(value)
    }
}

/// Formats a coordinate with two decimals when exact, else the shortest
/// round-tripping form.
pub(crate) fn format_coordinate(value: f64) -> String {
    let fixed = format!("{value:.2}");
    match fixed.parse::<f64>() {
        Ok(parsed) if parsed == value => fixed,
        _ => format!("{value}"),
    }
}

#[cfg(test)]
mod tests {
    use super::format_coordinate;

    #[test]
    fn coordinates_keep_two_decimals_when_exact() {
        assert_eq!(format_coordinate(12.5), "12.50");
        assert_eq!(format_coordinate(-200.0), "-200.00");
        assert_eq!(format_coordinate(1.234), "1.234");
        assert_eq!(format_coordinate(1.234).parse::<f64>().unwrap(), 1.234);
    }
}
