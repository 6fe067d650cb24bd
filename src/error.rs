//! Structured error types for the certificate composer.
//!
//! Composition itself never fails: missing data degrades to empty strings and
//! default positions. Errors only come from reading inputs (JSON, files,
//! images) and from serializing the finished page.

use thiserror::Error;

/// The unified error type returned by the public API.
#[derive(Debug, Error)]
pub enum CertError {
    /// JSON input failed to parse as a template, record or job file.
    #[error("Failed to parse {what}: {source}{}", format_hint(.hint))]
    ParseError {
        what: &'static str,
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// Reading or writing a file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A logo could not be loaded or decoded.
    #[error("Image error: {0}")]
    ImageError(String),
    /// PDF serialization failed.
    #[error("Render error: {0}")]
    RenderError(String),
}

pub type Result<T> = std::result::Result<T, CertError>;

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl CertError {
    /// Wrap a serde_json error, attaching a hint chosen by error category.
    pub fn parse(what: &'static str, e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => format!(
                "The JSON is valid but doesn't match the {} schema. Check field names and types.",
                what
            ),
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        CertError::ParseError {
            what,
            source: e,
            hint,
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        CertError::Io {
            path: path.into(),
            source,
        }
    }
}
