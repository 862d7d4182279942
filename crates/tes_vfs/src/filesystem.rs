//! Loose files below a directory on the host file system

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::{
    archive::{Archive, ArchiveKind, Entry, EntryId, VfsFile},
    error::{Error, Result},
};

#[derive(Debug)]
struct LooseFile {
    /// Path relative to the root, components joined with `/`
    name: String,
    host: PathBuf,
}

/// A directory tree, listed once when constructed
#[derive(Debug)]
pub struct FileSystemArchive {
    name: String,
    root: PathBuf,
    files: Vec<LooseFile>,
}

impl FileSystemArchive {
    /// Walks `root` and records every regular file below it
    #[instrument(skip_all, fields(root = %root.as_ref().display()), err)]
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut files = Vec::new();

        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = match entry.path().strip_prefix(&root) {
                Ok(relative) if !relative.as_os_str().is_empty() => relative,
                _ => continue,
            };
            let Some(name) = relative_name(relative) else {
                warn!("skipping {}: name is not valid UTF-8", entry.path().display());
                continue;
            };
            files.push(LooseFile {
                name,
                host: entry.into_path(),
            });
        }

        debug!(files = files.len(), "listed directory");

        Ok(Self {
            name: root.display().to_string(),
            root,
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn relative_name(relative: &Path) -> Option<String> {
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

impl Archive for FileSystemArchive {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Directory
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> Vec<Entry<'_>> {
        self.files
            .iter()
            .enumerate()
            .map(|(i, file)| Entry {
                id: EntryId(i),
                name: &file.name,
            })
            .collect()
    }

    fn open_entry(&self, id: EntryId) -> Result<VfsFile<'_>> {
        let file = self
            .files
            .get(id.0)
            .ok_or_else(|| Error::NotFound(format!("{}#{}", self.name, id.0)))?;

        // the file may have gone since the directory was listed
        let handle = File::open(&file.host)?;
        let size = handle.metadata()?.len();
        Ok(VfsFile::new(size, BufReader::new(handle)))
    }

    fn host_path(&self, id: EntryId) -> Option<PathBuf> {
        self.files.get(id.0).map(|file| file.host.clone())
    }
}
