//! BSA archives mounted as a backend

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use memmap2::Mmap;
use tes_bsa::BsaArchive;
use tracing::{debug, instrument};

use crate::{
    archive::{Archive, ArchiveKind, Entry, EntryId, VfsFile},
    error::{Error, Result},
};

/// Bytes behind a packed archive
#[derive(Debug)]
pub enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl AsRef<[u8]> for Backing {
    fn as_ref(&self) -> &[u8] {
        match self {
            Backing::Mapped(map) => map,
            Backing::Owned(data) => data,
        }
    }
}

/// A BSA file whose table of contents has been read
#[derive(Debug)]
pub struct PackedArchive {
    name: String,
    host: Option<PathBuf>,
    archive: BsaArchive<Backing>,
}

impl PackedArchive {
    /// Maps the archive at `path` into memory
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: the archive is only ever read, and the mapping lives as long as the archive.
        // Truncating the file from another process while mounted is not supported.
        let map = unsafe { Mmap::map(&file)? };
        debug!(len = map.len(), "mapped archive");

        Self::with_backing(path.display().to_string(), Some(path), Backing::Mapped(map))
    }

    /// Mounts an archive already held in memory, such as one nested inside another archive
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        Self::with_backing(name.into(), None, Backing::Owned(data))
    }

    fn with_backing(name: String, host: Option<&Path>, backing: Backing) -> Result<Self> {
        let archive = BsaArchive::new(backing)?;
        Ok(Self {
            name,
            host: host.map(Path::to_path_buf),
            archive,
        })
    }

    /// The host file this archive was mapped from
    pub fn host(&self) -> Option<&Path> {
        self.host.as_deref()
    }

    pub fn bsa(&self) -> &BsaArchive<Backing> {
        &self.archive
    }
}

impl Archive for PackedArchive {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Bsa
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> Vec<Entry<'_>> {
        self.archive
            .file_names()
            .enumerate()
            .map(|(i, name)| Entry {
                id: EntryId(i),
                name,
            })
            .collect()
    }

    fn open_entry(&self, id: EntryId) -> Result<VfsFile<'_>> {
        let file = match self.archive.by_index(id.0) {
            Ok(file) => file,
            Err(tes_bsa::error::Error::FileNotFound(_)) => {
                return Err(Error::NotFound(format!("{}#{}", self.name, id.0)))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(VfsFile::new(file.size(), file))
    }
}
