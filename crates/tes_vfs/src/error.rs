//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// the path is not part of the index or of the archive asked
    #[error("no such path {0:?}")]
    #[diagnostic(code(tes_vfs::not_found))]
    NotFound(String),

    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`tes_bsa::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Archive(#[from] tes_bsa::error::Error),

    /// Transparent wrapper for [`walkdir::Error`]
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
