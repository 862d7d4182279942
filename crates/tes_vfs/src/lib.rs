//! A virtual file system merging loose directories and **BSA** archives into one namespace, the
//! way *The Elder Scrolls* engines resolve their data paths.
//!
//! Archives are registered on a [`Manager`] in load order and indexed once. Every stored name is
//! turned into a [`PathKey`]: separators are unified to `/` and case is folded according to the
//! manager's [`CaseFolding`]. When two archives hold the same key, the one registered later wins.
//!
//! Backends implement [`Archive`]; [`FileSystemArchive`] walks a directory and [`PackedArchive`]
//! reads a BSA file through [`tes_bsa`].
//!

pub mod archive;
pub mod error;
pub mod filesystem;
pub mod manager;
pub mod packed;
pub mod path;

pub use archive::{Archive, ArchiveKind, Entry, EntryId, VfsFile};
pub use error::Error;
pub use filesystem::FileSystemArchive;
pub use manager::{Location, Manager, ManagerOptions};
pub use packed::{Backing, PackedArchive};
pub use path::{CaseFolding, PathKey};
