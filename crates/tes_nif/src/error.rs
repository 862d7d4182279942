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

    /// the signature or version is outside the supported family
    #[error("unsupported file version {0}")]
    #[diagnostic(code(tes_nif::unsupported_version))]
    UnsupportedVersion(String),

    /// a block type this decoder does not know while permissive mode is off
    #[error("unsupported block type {0}")]
    #[diagnostic(
        code(tes_nif::unsupported_block_type),
        help("decode with permissive mode to keep unknown blocks as raw bytes")
    )]
    UnsupportedBlockType(String),

    /// a block reference outside of the block list
    #[error("{origin} references block {index}, but the file holds {count} blocks")]
    #[diagnostic(code(tes_nif::dangling_reference))]
    DanglingReference {
        origin: String,
        index: i32,
        count: usize,
    },

    /// a declared length runs past the end of the data
    #[error("truncated file: {needed} bytes needed at offset {offset}, {remaining} remain")]
    #[diagnostic(code(tes_nif::truncated_file))]
    TruncatedFile {
        offset: u64,
        needed: u64,
        remaining: u64,
    },

    /// a string reference outside of the header string table
    #[error("{origin} references string {index}, but the header holds {count} strings")]
    #[diagnostic(code(tes_nif::invalid_string_index))]
    InvalidStringIndex {
        origin: String,
        index: u32,
        count: usize,
    },

    /// the header is structurally inconsistent
    #[error("invalid header: {0}")]
    #[diagnostic(code(tes_nif::invalid_header))]
    InvalidHeader(String),
}

/// Error raised by a decode call, carrying the label the data was decoded under
#[derive(Error, Diagnostic, Debug)]
#[error("{label}: {kind}")]
pub struct NifError {
    /// The diagnostic label passed to the decoder, verbatim
    pub label: String,

    /// What went wrong
    pub kind: Error,
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
