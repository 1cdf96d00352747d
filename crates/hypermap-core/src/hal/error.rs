use thiserror::Error;

use crate::model::LinkError;

/// Errors raised while rendering or reading HAL documents.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Reading {0} is not supported")]
    ReadNotSupported(&'static str),

    #[error("No schema registered for type: {0}")]
    UnknownType(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Invalid value for {property}: {text:?}")]
    InvalidValue { property: String, text: String },

    #[error("Unexpected document structure: {0}")]
    Structure(String),

    #[error(transparent)]
    Link(#[from] LinkError),
}
