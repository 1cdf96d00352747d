//! HAL wire formats.
//!
//! - `json` - `application/hal+json` writer
//! - `xml` - `application/hal+xml` writer and reader

mod error;
mod json;
mod xml;

pub use error::FormatError;
pub use json::HalJsonSerializer;
pub use xml::HalXmlSerializer;

use std::fmt;
use std::str::FromStr;

/// `application/hal+json`
pub const HAL_JSON: &str = "application/hal+json";

/// `application/hal+xml`
pub const HAL_XML: &str = "application/hal+xml";

/// The two HAL renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HalFormat {
    Json,
    Xml,
}

impl HalFormat {
    pub fn media_type(&self) -> &'static str {
        match self {
            HalFormat::Json => HAL_JSON,
            HalFormat::Xml => HAL_XML,
        }
    }

    /// `Content-Type` header value.
    pub fn content_type(&self) -> &'static str {
        match self {
            HalFormat::Json => "application/hal+json; charset=utf-8",
            HalFormat::Xml => "application/hal+xml; charset=utf-8",
        }
    }

    /// Value of the `f` query parameter selecting this format.
    pub fn query_flag(&self) -> &'static str {
        match self {
            HalFormat::Json => "haljson",
            HalFormat::Xml => "halxml",
        }
    }

    /// Select a format from a media type, ignoring parameters and case.
    pub fn from_media_type(media_type: &str) -> Result<Self, FormatError> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            HAL_JSON => Ok(HalFormat::Json),
            HAL_XML => Ok(HalFormat::Xml),
            _ => Err(FormatError::UnsupportedMediaType(media_type.to_string())),
        }
    }

    /// Select a format from the `f` query flag.
    pub fn from_query_flag(flag: &str) -> Option<Self> {
        if flag.eq_ignore_ascii_case("haljson") {
            Some(HalFormat::Json)
        } else if flag.eq_ignore_ascii_case("halxml") {
            Some(HalFormat::Xml)
        } else {
            None
        }
    }
}

impl FromStr for HalFormat {
    type Err = FormatError;

    /// Accepts a media type, a query flag, or the short names `json`/`xml`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(format) = HalFormat::from_query_flag(s) {
            return Ok(format);
        }
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(HalFormat::Json),
            "xml" => Ok(HalFormat::Xml),
            _ => HalFormat::from_media_type(s),
        }
    }
}

impl fmt::Display for HalFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())
    }
}
