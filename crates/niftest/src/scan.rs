//! Walks inputs, mounts archives found along the way and decodes every model in them

use std::{fmt, fs, io::Read, path::Path};

use bon::Builder;
use tes_nif::{NifFile, NifOptions};
use tes_vfs::{
    ArchiveKind, CaseFolding, FileSystemArchive, Manager, ManagerOptions, PackedArchive, PathKey,
};
use tracing::{debug, error, info, instrument, trace, warn};

/// Extensions decoded as models
pub const MODEL_EXTENSIONS: [&str; 2] = ["nif", "kf"];

/// Extensions mounted as packed archives
pub const ARCHIVE_EXTENSIONS: [&str; 1] = ["bsa"];

/// Options for a scan
#[derive(Debug, Clone, Copy, Builder)]
pub struct ScanOptions {
    /// How models are decoded
    #[builder(default)]
    pub nif: NifOptions,

    /// How many archives deep nested mounts may go
    #[builder(default = 4)]
    pub max_depth: usize,

    /// Case folding of every mounted namespace
    #[builder(default)]
    pub case_folding: CaseFolding,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions::builder().build()
    }
}

/// What a path is scanned as, judged by its extension
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Model,
    Archive(ArchiveKind),
    Other,
}

impl EntryKind {
    pub fn from_extension(extension: Option<&str>) -> Self {
        let Some(extension) = extension else {
            return EntryKind::Other;
        };
        if MODEL_EXTENSIONS
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
        {
            EntryKind::Model
        } else if ARCHIVE_EXTENSIONS
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
        {
            EntryKind::Archive(ArchiveKind::Bsa)
        } else {
            EntryKind::Other
        }
    }
}

/// An entry that could not be scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Fully qualified virtual path
    pub path: String,
    pub message: String,
}

/// Why a nested archive was not mounted
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// An enclosing archive already has this format
    SameFormat(ArchiveKind),
    /// Mounting it would exceed the depth limit
    DepthLimit(usize),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SameFormat(kind) => write!(f, "already inside a {kind} archive"),
            SkipReason::DepthLimit(depth) => write!(f, "nesting limit of {depth} reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub path: String,
    pub reason: SkipReason,
}

/// Outcome of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Virtual paths of the models decoded without error
    pub decoded: Vec<String>,
    pub failures: Vec<Failure>,
    /// Nested archives that were found but not mounted
    pub skipped: Vec<Skipped>,
}

impl ScanReport {
    fn fail(&mut self, path: impl Into<String>, message: impl fmt::Display) {
        let path = path.into();
        let message = message.to_string();
        error!(path = %path, "{message}");
        self.failures.push(Failure { path, message });
    }

    fn skip(&mut self, path: String, reason: SkipReason) {
        warn!(path = %path, "not mounting nested archive: {reason}");
        self.skipped.push(Skipped { path, reason });
    }
}

/// A mounted namespace waiting to be walked
struct Task {
    manager: Manager,
    /// Prepended to every key to form virtual paths, ends with `/`
    prefix: String,
    /// Kinds of the archives enclosing this one, outermost first, this one last
    ancestry: Vec<ArchiveKind>,
    depth: usize,
}

/// Scans inputs with a fixed set of options
///
/// Nested archives are handled through a work list rather than recursion. One failing entry never
/// stops the scan; it is logged and recorded in the [`ScanReport`].
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scans every input: directories, BSA archives or model files
    pub fn scan<P: AsRef<Path>>(&self, inputs: &[P]) -> ScanReport {
        let mut report = ScanReport::default();
        for input in inputs {
            self.scan_input(input.as_ref(), &mut report);
        }
        report
    }

    #[instrument(skip(self, report))]
    fn scan_input(&self, input: &Path, report: &mut ScanReport) {
        let label = input.display().to_string();

        if input.is_dir() {
            match FileSystemArchive::new(input) {
                Ok(archive) => {
                    let manager = self.mount(archive);
                    self.run(
                        Task {
                            manager,
                            prefix: format!("{}/", label.trim_end_matches(['/', '\\'])),
                            ancestry: vec![ArchiveKind::Directory],
                            depth: 0,
                        },
                        report,
                    );
                }
                Err(e) => report.fail(label, e),
            }
            return;
        }

        let extension = input.extension().and_then(|e| e.to_str());
        match EntryKind::from_extension(extension) {
            EntryKind::Model => match fs::read(input) {
                Ok(data) => self.decode(&data, label, report),
                Err(e) => report.fail(label, e),
            },
            EntryKind::Archive(kind) => match PackedArchive::from_path(input) {
                Ok(archive) => {
                    let manager = self.mount(archive);
                    self.run(
                        Task {
                            manager,
                            prefix: format!("{label}/"),
                            ancestry: vec![kind],
                            depth: 0,
                        },
                        report,
                    );
                }
                Err(e) => report.fail(label, e),
            },
            EntryKind::Other if !input.exists() => report.fail(label, "no such file or directory"),
            EntryKind::Other => report.fail(label, "not a model, archive or directory"),
        }
    }

    fn mount(&self, archive: impl tes_vfs::Archive + 'static) -> Manager {
        let mut manager = Manager::new(
            ManagerOptions::builder()
                .case_folding(self.options.case_folding)
                .build(),
        );
        manager.add_archive(archive);
        manager.build_index();
        manager
    }

    fn run(&self, root: Task, report: &mut ScanReport) {
        let mut pending = vec![root];

        while let Some(task) = pending.pop() {
            info!(
                prefix = %task.prefix,
                entries = task.manager.len(),
                depth = task.depth,
                "scanning"
            );

            let keys: Vec<PathKey> = task
                .manager
                .recursive_directory_iterator("")
                .cloned()
                .collect();
            for key in keys {
                let path = format!("{}{}", task.prefix, key);
                match EntryKind::from_extension(key.extension()) {
                    EntryKind::Model => match read_entry(&task.manager, &key) {
                        Ok(data) => self.decode(&data, path, report),
                        Err(e) => report.fail(path, e),
                    },
                    EntryKind::Archive(kind) => {
                        if let Some(nested) = self.nest(&task, &key, kind, path, report) {
                            pending.push(nested);
                        }
                    }
                    EntryKind::Other => trace!(path = %path, "ignoring"),
                }
            }
        }
    }

    /// Mounts an archive found inside `task`, unless the guards refuse it
    fn nest(
        &self,
        task: &Task,
        key: &PathKey,
        kind: ArchiveKind,
        path: String,
        report: &mut ScanReport,
    ) -> Option<Task> {
        if task.ancestry.contains(&kind) {
            report.skip(path, SkipReason::SameFormat(kind));
            return None;
        }
        if task.depth >= self.options.max_depth {
            report.skip(path, SkipReason::DepthLimit(self.options.max_depth));
            return None;
        }

        let archive = match task.manager.host_path(key.as_str()) {
            Some(host) => PackedArchive::from_path(host),
            None => read_entry(&task.manager, key)
                .and_then(|data| PackedArchive::from_bytes(path.clone(), data)),
        };
        let archive = match archive {
            Ok(archive) => archive,
            Err(e) => {
                report.fail(path, e);
                return None;
            }
        };

        debug!(path = %path, "mounting nested archive");
        let mut ancestry = task.ancestry.clone();
        ancestry.push(kind);
        Some(Task {
            manager: self.mount(archive),
            prefix: format!("{path}/"),
            ancestry,
            depth: task.depth + 1,
        })
    }

    fn decode(&self, data: &[u8], path: String, report: &mut ScanReport) {
        match NifFile::parse(data, path, &self.options.nif) {
            Ok(nif) => {
                debug!(
                    path = nif.label(),
                    blocks = nif.blocks().len(),
                    "decoded"
                );
                report.decoded.push(nif.label().to_string());
            }
            Err(e) => report.fail(e.label, e.kind),
        }
    }
}

fn read_entry(manager: &Manager, key: &PathKey) -> tes_vfs::error::Result<Vec<u8>> {
    let mut file = manager.get(key.as_str())?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}
