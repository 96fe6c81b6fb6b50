//! Parse error types and the error-tolerance mode

use std::io;

use thiserror::Error;

/// How the parser treats constructs it does not handle
///
/// Selected once per parse invocation; the mode is fixed for the whole parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// Skip unrecognized or malformed constructs silently
    #[default]
    Ignore,
    /// Abort parsing on the first unrecognized or malformed construct
    Fail,
    /// Skip unrecognized or malformed constructs and emit a warning
    Warn,
}

/// Errors raised while parsing icon markup
#[derive(Error, Debug)]
pub enum SvgError {
    /// The underlying token stream is unusable; always fatal
    #[error("XML token stream error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error while reading the source; always fatal
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// An element this parser's subset does not cover
    #[error("unrecognized element <{0}>")]
    UnrecognizedElement(String),

    /// A numeric, color or path-data literal that failed to parse
    #[error("malformed attribute value {0:?}")]
    MalformedAttribute(String),

    /// A gradient or definition identifier with no definition
    #[error("reference to undefined id {0:?}")]
    UnresolvedReference(String),
}
