//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent wrapper for [`lz4_flex::frame::Error`]
    #[error(transparent)]
    Lz4Error(#[from] lz4_flex::frame::Error),

    /// the table of contents could not be parsed
    #[error("corrupt archive: {0}")]
    #[diagnostic(code(tes_bsa::corrupt_archive))]
    CorruptArchive(String),

    /// the leading word does not name a known archive layout
    #[error("unsupported archive version {0:#010x}")]
    #[diagnostic(code(tes_bsa::unsupported_version))]
    UnsupportedVersion(u32),

    /// unable to find requested file
    #[error("unable to find requested file")]
    FileNotFound(#[from] FileNotFoundError),
}

/// Error type to provide further information when a file has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested file")]
pub enum FileNotFoundError {
    /// at index {0}
    #[error("at index {0}")]
    Index(usize),

    /// by name {0}
    #[error("by name {0}")]
    Name(String),
}

impl Error {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Error::CorruptArchive(reason.into())
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
