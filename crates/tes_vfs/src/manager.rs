//! The namespace merging every mounted archive

use std::{collections::BTreeMap, path::PathBuf};

use bon::Builder;
use tracing::{debug, instrument, trace};

use crate::{
    archive::{Archive, ArchiveKind, EntryId, VfsFile},
    error::{Error, Result},
    path::{CaseFolding, PathKey},
};

/// Options for how a [`Manager`] maps paths to keys
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct ManagerOptions {
    /// How paths are case folded before lookup
    #[builder(default)]
    pub case_folding: CaseFolding,
}

/// Where an indexed key resolves to
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// Registration order of the owning archive
    pub archive: usize,
    pub entry: EntryId,
}

/// A virtual file system over an ordered list of archives
///
/// Archives registered later shadow earlier ones. Lookups need [`Manager::build_index`] to have
/// run after the last [`Manager::add_archive`]; once built, the manager can be shared between
/// threads and read from concurrently.
///
/// ```no_run
/// # fn doit() -> tes_vfs::error::Result<()> {
/// use std::io::Read;
/// use tes_vfs::{FileSystemArchive, Manager, ManagerOptions, PackedArchive};
///
/// let mut vfs = Manager::new(ManagerOptions::default());
/// vfs.add_archive(PackedArchive::from_path("Data/Morrowind.bsa")?);
/// vfs.add_archive(FileSystemArchive::new("Data")?);
/// vfs.build_index();
///
/// for key in vfs.recursive_directory_iterator("meshes/") {
///     let mut buf = Vec::new();
///     vfs.get(key.as_str())?.read_to_end(&mut buf)?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Manager {
    options: ManagerOptions,
    archives: Vec<Box<dyn Archive>>,
    index: BTreeMap<PathKey, Location>,
}

impl Manager {
    pub fn new(options: ManagerOptions) -> Self {
        Self {
            options,
            archives: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    /// Normalizes `path` under this manager's folding policy
    pub fn key(&self, path: &str) -> PathKey {
        PathKey::new(path, self.options.case_folding)
    }

    /// Appends an archive; the index is unchanged until the next [`Manager::build_index`]
    pub fn add_archive(&mut self, archive: impl Archive + 'static) {
        self.add_boxed(Box::new(archive));
    }

    pub fn add_boxed(&mut self, archive: Box<dyn Archive>) {
        debug!(kind = %archive.kind(), name = archive.name(), "adding archive");
        self.archives.push(archive);
    }

    /// Rebuilds the index from every registered archive, in registration order
    #[instrument(skip(self), fields(archives = self.archives.len()))]
    pub fn build_index(&mut self) {
        self.index.clear();
        let folding = self.options.case_folding;

        for (archive_index, archive) in self.archives.iter().enumerate() {
            for entry in archive.entries() {
                let key = PathKey::new(entry.name, folding);
                let location = Location {
                    archive: archive_index,
                    entry: entry.id,
                };
                if let Some(previous) = self.index.insert(key, location) {
                    trace!(
                        name = entry.name,
                        shadowed = self.archives[previous.archive].name(),
                        by = archive.name(),
                        "shadowing entry"
                    );
                }
            }
        }

        debug!(keys = self.index.len(), "built index");
    }

    /// Opens the entry indexed under `path`
    pub fn get(&self, path: &str) -> Result<VfsFile<'_>> {
        let location = self
            .locate(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        self.archives[location.archive].open_entry(location.entry)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.locate(path).is_some()
    }

    /// The archive and entry `path` resolves to
    pub fn locate(&self, path: &str) -> Option<Location> {
        self.index.get(&self.key(path)).copied()
    }

    /// Format of the archive serving `path`
    pub fn archive_kind(&self, path: &str) -> Option<ArchiveKind> {
        self.locate(path)
            .map(|location| self.archives[location.archive].kind())
    }

    /// Host file backing `path`, when it is a loose file
    pub fn host_path(&self, path: &str) -> Option<PathBuf> {
        let location = self.locate(path)?;
        self.archives[location.archive].host_path(location.entry)
    }

    /// Every indexed key under `prefix`, in key order; an empty prefix yields all keys
    pub fn recursive_directory_iterator(&self, prefix: &str) -> impl Iterator<Item = &PathKey> {
        let prefix = PathKey::prefix(prefix, self.options.case_folding);
        self.index
            .range(PathKey::from_normalized(prefix.clone())..)
            .map(|(key, _)| key)
            .take_while(move |key| key.starts_with(&prefix))
    }

    /// Number of indexed keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Registered archives, in registration order
    pub fn archives(&self) -> impl Iterator<Item = &(dyn Archive + 'static)> {
        self.archives.iter().map(|archive| archive.as_ref())
    }
}
