//! This library handles reading **BSA** archives used by *The Elder Scrolls* games.
//!
//! # BSA Archive Format Documentation
//!
//! A BSA file packs many game assets (meshes, textures, sounds) into one container. Two unrelated
//! layouts share the `.bsa` extension, and the first four bytes tell them apart. The archive is
//! read fully into a table of contents on open; entries are then served as bounded readers over
//! the backing bytes. Writing archives is not supported.
//!
//! ## TES3 (Morrowind)
//!
//! | Offset (bytes)        | Field             | Description                                            |
//! |-----------------------|-------------------|--------------------------------------------------------|
//! | 0x0000                | Version           | 4 bytes: Fixed value 0x00000100                        |
//! | 0x0004                | Hash Offset       | 4 bytes: Offset of the hash table after this header    |
//! | 0x0008                | File Count        | 4 bytes: Number of files in the archive                |
//! | 0x000C                | File Records      | 8 bytes each: size, then offset into the data region   |
//! | ...                   | Name Offsets      | 4 bytes each: offset into the name block               |
//! | ...                   | Name Block        | NUL terminated names                                   |
//! | 0x000C + Hash Offset  | Hashes            | 8 bytes each                                           |
//! | ...                   | Data Region       | Raw file data                                          |
//!
//! TES3 data is never compressed.
//!
//! ## TES4 (Oblivion onwards)
//!
//! | Offset (bytes) | Field                  | Description                                               |
//! |----------------|------------------------|-----------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "BSA\0"                                          |
//! | 0x0004         | Version                | 4 bytes: 103 (Oblivion), 104 (Fallout 3, Skyrim), 105 (SSE) |
//! | 0x0008         | Header Size            | 4 bytes: Fixed value 36                                   |
//! | 0x000C         | Archive Flags          | 4 bytes: see below                                        |
//! | 0x0010         | Folder Count           | 4 bytes: Number of folder records                         |
//! | 0x0014         | File Count             | 4 bytes: Number of file records                           |
//! | 0x0018         | Folder Names Length    | 4 bytes: Total length of the folder names                 |
//! | 0x001C         | File Names Length      | 4 bytes: Length of the file name block                    |
//! | 0x0020         | File Flags             | 2 bytes: Content hints                                    |
//! | 0x0022         | Padding                | 2 bytes                                                   |
//!
//! Folder records follow the header (16 bytes each, 24 bytes for version 105). After them, every
//! folder stores its name as a length prefixed, NUL terminated string followed by its file
//! records (hash, size, absolute offset). The file name block comes last.
//!
//! - **Archive Flags**:
//!   - bit 0: folder names are stored
//!   - bit 1: file names are stored
//!   - bit 2: files are compressed by default
//!   - bit 8: file data starts with the full path (version 104 and later)
//! - **File Size**: bit 30 inverts the default compression for that file.
//! - **Compressed Data**: starts with the 4 byte uncompressed size, then a zlib stream (103, 104)
//!   or an LZ4 frame (105).
//!
//! ## Additional Information
//!
//! - **File Extension**: `.bsa`
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod compression;
pub mod error;
pub mod read;
pub mod types;

pub use compression::CompressionMethod;
pub use read::{BsaArchive, BsaFile, Version};
