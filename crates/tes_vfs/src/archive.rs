//! The capability every backend of the file system provides

use std::{
    fmt::{self, Debug},
    io::{self, Read},
    path::PathBuf,
};

use crate::{
    error::{Error, Result},
    path::{CaseFolding, PathKey},
};

/// Storage format of an archive
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// A loose directory on the host file system
    Directory,
    /// A BSA packed archive
    Bsa,
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveKind::Directory => f.write_str("directory"),
            ArchiveKind::Bsa => f.write_str("bsa"),
        }
    }
}

/// Position of an entry inside the archive listing it
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub usize);

/// A listed entry
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
    pub id: EntryId,
    /// Name as the backend stores it, case preserved
    pub name: &'a str,
}

/// A stream over one entry, borrowing the archive it came from
pub struct VfsFile<'a> {
    size: u64,
    reader: Box<dyn Read + Send + 'a>,
}

impl Debug for VfsFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "VfsFile({} bytes)", self.size)
    }
}

impl<'a> VfsFile<'a> {
    pub fn new(size: u64, reader: impl Read + Send + 'a) -> Self {
        Self {
            size,
            reader: Box::new(reader),
        }
    }

    /// Bytes the stream should yield once fully read, as the backend declares it
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Reads the rest of the stream
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.reader.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

impl Read for VfsFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// A backend exposing a fixed set of entries
///
/// Entries are listed once, when the archive is constructed; backends never modify the storage
/// behind them.
pub trait Archive: Debug + Send + Sync {
    fn kind(&self) -> ArchiveKind;

    /// Name used when reporting on this archive
    fn name(&self) -> &str;

    /// Every entry, in a stable order
    fn entries(&self) -> Vec<Entry<'_>>;

    /// Opens a listed entry
    fn open_entry(&self, id: EntryId) -> Result<VfsFile<'_>>;

    /// Location of the entry on the host file system, when it is a file of its own
    fn host_path(&self, _id: EntryId) -> Option<PathBuf> {
        None
    }

    /// Opens an entry by name, comparing names the way the default [`CaseFolding`] does
    fn open(&self, path: &str) -> Result<VfsFile<'_>> {
        let wanted = PathKey::new(path, CaseFolding::default());
        let entry = self
            .entries()
            .into_iter()
            .find(|entry| PathKey::new(entry.name, CaseFolding::default()) == wanted)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        self.open_entry(entry.id)
    }
}
