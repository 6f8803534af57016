//! Error types for document rebranding.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, rebranding or saving a document.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a stream.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error in '{part}': {message}")]
    XmlError { part: String, message: String },

    /// A part the pipeline depends on is absent from the package.
    #[error("Missing part: {0}")]
    MissingPart(String),

    /// The package structure is inconsistent (bad relationship, missing element).
    #[error("Invalid or corrupted document: {0}")]
    CorruptedFile(String),

    /// An attribute held a value that could not be interpreted.
    #[error("Invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute { attribute: String, value: String },

    /// The replacement image could not be recognized.
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),
}

impl Error {
    /// Build an XML error tagged with the part it came from.
    pub fn xml(part: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::XmlError {
            part: part.into(),
            message: message.to_string(),
        }
    }

    /// Build an error for an attribute value that failed to parse.
    pub fn invalid_attribute(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Error::InvalidAttribute {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipError(err.to_string())
    }
}
