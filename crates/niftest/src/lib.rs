//! Batch decoding of NIF models across loose directories and BSA archives.
//!
//! Every input is classified by extension: models (`.nif`, `.kf`) are decoded, archives (`.bsa`)
//! are mounted and walked, directories are walked as loose file trees. Archives found inside a
//! scanned namespace are mounted in turn, except inside an archive of the same format.
//!

pub mod scan;

pub use scan::{Failure, ScanOptions, ScanReport, Scanner, SkipReason, Skipped};
