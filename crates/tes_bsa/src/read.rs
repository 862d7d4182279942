//! Types for reading BSA archives
//!

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use indexmap::IndexMap;
use std::{
    fmt::{self, Debug},
    io::{Cursor, Read},
    str,
};
use tracing::{debug, instrument, warn};

use crate::{
    compression::{BsaBlockReader, CompressionMethod},
    error::{Error, FileNotFoundError, Result},
    types::{
        Tes3Header, Tes3Record, Tes4FileRecord, Tes4FolderRecord, Tes4Header, TES3_HEADER_SIZE,
        TES4_HEADER_SIZE,
    },
};

/// Layout of the table of contents
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Morrowind
    Tes3,
    /// Oblivion, version 103
    Tes4,
    /// Fallout 3, New Vegas and Skyrim, version 104
    Fo3,
    /// Skyrim Special Edition, version 105
    Sse,
}

impl Version {
    /// The version word stored in the archive header
    pub fn id(&self) -> u32 {
        match self {
            Version::Tes3 => 0x100,
            Version::Tes4 => 103,
            Version::Fo3 => 104,
            Version::Sse => 105,
        }
    }
}

/// A struct for reading an entry from a BSA file
pub struct BsaFile<'a> {
    data: &'a BsaFileData,
    reader: BsaBlockReader<'a>,
}

impl Debug for BsaFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BsaFile({:#?})", self.data)
    }
}

/// Methods for retrieving information on BSA file entries
impl BsaFile<'_> {
    /// Get the name of the file as stored in the archive, folders joined with `\`
    ///
    /// # Warnings
    ///
    /// It is dangerous to use this name directly when extracting an archive.
    /// It may contain an absolute path or break out of the current directory (`..\runtime`).
    pub fn name(&self) -> &str {
        &self.data.file_name
    }

    /// Get the size of the file, in bytes, in the archive
    pub fn compressed_size(&self) -> u64 {
        self.data.compressed_size
    }

    /// Get the size of the file, in bytes, when uncompressed
    ///
    /// For compressed entries this is the size the archive declares. Reading fails with
    /// [`std::io::ErrorKind::InvalidData`] when the stored data does not decompress to exactly this
    /// many bytes.
    pub fn size(&self) -> u64 {
        self.data.uncompressed_size
    }

    /// Get the starting offset of the stored data
    pub fn data_start(&self) -> u64 {
        self.data.data_start
    }

    /// Get the compression method used for this file
    pub fn compression_method(&self) -> CompressionMethod {
        self.data.compression_method
    }

    /// Whether the stored data has to be decompressed
    pub fn is_compressed(&self) -> bool {
        self.data.compression_method != CompressionMethod::None
    }
}

impl Read for BsaFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Structure representing a BSA file entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BsaFileData {
    /// Name hash stored in the archive
    pub hash: u64,
    /// Method of compressing the file in the bsa
    pub compression_method: CompressionMethod,
    /// Size of the file in the bsa, without any prefix
    pub compressed_size: u64,
    /// Size of the file when extracted
    pub uncompressed_size: u64,
    /// Name of the file
    pub file_name: Box<str>,
    /// Specifies where the stored data of the file starts
    pub data_start: u64,
}

#[derive(Debug)]
struct Shared {
    version: Version,
    files: IndexMap<Box<str>, BsaFileData>,
}

/// BSA archive reader
///
/// The archive borrows every entry from `data`, so any byte container works: a memory map, a
/// `Vec<u8>` read from another archive or a static slice.
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn list_bsa_contents(data: Vec<u8>) -> tes_bsa::error::Result<()> {
///     let bsa = tes_bsa::BsaArchive::new(data)?;
///
///     for i in 0..bsa.len() {
///         let mut file = bsa.by_index(i)?;
///         println!("Filename: {}", file.name());
///         std::io::copy(&mut file, &mut std::io::stdout())?;
///     }
///
///     Ok(())
/// }
/// ```
pub struct BsaArchive<D> {
    data: D,
    shared: Shared,
}

impl<D> Debug for BsaArchive<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BsaArchive")
            .field("version", &self.shared.version)
            .field("files", &self.shared.files.len())
            .finish()
    }
}

impl<D> BsaArchive<D> {
    /// Total size of the files in the archive once decompressed.
    pub fn decompressed_size(&self) -> Option<u128> {
        let mut total = 0u128;
        for file in self.shared.files.values() {
            total = total.checked_add(file.uncompressed_size as u128)?;
        }
        Some(total)
    }

    /// Number of entries contained in this BSA.
    pub fn len(&self) -> usize {
        self.shared.files.len()
    }

    /// Whether this BSA archive contains no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Layout of this archive
    pub fn version(&self) -> Version {
        self.shared.version
    }

    /// Returns an iterator over all the file names in this archive.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.shared.files.keys().map(|s| s.as_ref())
    }

    /// Get the index of a file entry by its stored name, if it's present.
    #[inline(always)]
    pub fn index_for_name(&self, name: &str) -> Option<usize> {
        self.shared.files.get_index_of(name)
    }

    /// Get the name of a file entry, if it's present.
    #[inline(always)]
    pub fn name_for_index(&self, index: usize) -> Option<&str> {
        self.shared
            .files
            .get_index(index)
            .map(|(name, _)| name.as_ref())
    }

    /// Get the metadata of a file entry, if it's present.
    pub fn metadata(&self, index: usize) -> Option<&BsaFileData> {
        self.shared.files.get_index(index).map(|(_, data)| data)
    }

    /// Unwrap and return the backing bytes
    pub fn into_inner(self) -> D {
        self.data
    }
}

impl<D: AsRef<[u8]>> BsaArchive<D> {
    /// Read the table of contents of a BSA archive.
    ///
    /// Every entry is validated against the size of `data` here, so reading an entry later never
    /// leaves the archive.
    #[instrument(skip_all, err)]
    pub fn new(data: D) -> Result<BsaArchive<D>> {
        let shared = match Self::get_metadata(data.as_ref()) {
            Ok(shared) => shared,
            Err(err @ (Error::CorruptArchive(_) | Error::UnsupportedVersion(_))) => {
                return Err(err)
            }
            Err(err) => return Err(Error::CorruptArchive(err.to_string())),
        };

        debug!(
            version = ?shared.version,
            files = shared.files.len(),
            "read bsa table of contents"
        );

        Ok(BsaArchive { data, shared })
    }

    /// Search for a file entry by its stored name
    pub fn by_name(&self, name: &str) -> Result<BsaFile<'_>> {
        let Some(index) = self.shared.files.get_index_of(name) else {
            return Err(Error::FileNotFound(FileNotFoundError::Name(
                name.to_owned(),
            )));
        };
        self.by_index(index)
    }

    /// Get a contained file by index
    pub fn by_index(&self, file_number: usize) -> Result<BsaFile<'_>> {
        let (_, data) = self
            .shared
            .files
            .get_index(file_number)
            .ok_or(Error::FileNotFound(FileNotFoundError::Index(file_number)))?;

        let block = sub_slice(self.data.as_ref(), data.data_start, data.compressed_size)?;

        Ok(BsaFile {
            data,
            reader: BsaBlockReader::new(block, data.compression_method, data.uncompressed_size),
        })
    }

    fn get_metadata(data: &[u8]) -> Result<Shared> {
        let magic = data
            .get(..4)
            .ok_or_else(|| Error::corrupt("archive is shorter than its magic number"))?;

        match magic {
            b"\x00\x01\x00\x00" => Self::get_tes3_metadata(data),
            b"BSA\0" => Self::get_tes4_metadata(data),
            _ => Err(Error::UnsupportedVersion(u32::from_le_bytes([
                magic[0], magic[1], magic[2], magic[3],
            ]))),
        }
    }

    fn get_tes3_metadata(data: &[u8]) -> Result<Shared> {
        let len = data.len() as u64;
        let mut reader = Cursor::new(data);
        let header = Tes3Header::read(&mut reader)?;
        let count = header.files as u64;

        // records (8), name offsets (4) and hashes (8)
        if TES3_HEADER_SIZE + count * 20 > len {
            return Err(Error::corrupt(format!(
                "declared {count} entries but archive is only {len} bytes"
            )));
        }

        let records = (0..count)
            .map(|_| Tes3Record::read(&mut reader).map_err(Error::from))
            .collect::<Result<Vec<_>>>()?;
        let name_offsets = (0..count)
            .map(|_| reader.read_u32::<LittleEndian>().map_err(Error::from))
            .collect::<Result<Vec<_>>>()?;

        let names_start = reader.position();
        let hashes_start = TES3_HEADER_SIZE + header.hash_offset as u64;
        if hashes_start < names_start {
            return Err(Error::corrupt(format!(
                "hash table at {hashes_start} overlaps the file records"
            )));
        }
        let data_region = hashes_start + count * 8;
        if data_region > len {
            return Err(Error::corrupt(format!(
                "hash table at {hashes_start} extends past the end of the archive"
            )));
        }

        let names = sub_slice(data, names_start, hashes_start - names_start)?;
        let mut hashes = Cursor::new(sub_slice(data, hashes_start, count * 8)?);

        let mut files = IndexMap::with_capacity(records.len());
        for (record, name_offset) in records.into_iter().zip(name_offsets) {
            let name = read_name(names, name_offset as usize)?;
            let hash = hashes.read_u64::<LittleEndian>()?;

            let data_start = data_region + record.offset as u64;
            check_bounds(data, data_start, record.size as u64, name)?;

            let file = BsaFileData {
                hash,
                compression_method: CompressionMethod::None,
                compressed_size: record.size as u64,
                uncompressed_size: record.size as u64,
                file_name: name.into(),
                data_start,
            };
            insert_file(&mut files, file);
        }

        Ok(Shared {
            version: Version::Tes3,
            files,
        })
    }

    fn get_tes4_metadata(data: &[u8]) -> Result<Shared> {
        let len = data.len() as u64;
        let mut reader = Cursor::new(data);
        let header = Tes4Header::read(&mut reader)?;

        let version = match header.version {
            103 => Version::Tes4,
            104 => Version::Fo3,
            105 => Version::Sse,
            other => return Err(Error::UnsupportedVersion(other)),
        };

        if header.header_size as u64 != TES4_HEADER_SIZE {
            return Err(Error::corrupt(format!(
                "header declares {} bytes, expected {TES4_HEADER_SIZE}",
                header.header_size
            )));
        }
        if !header.file_strings() && !header.embedded_file_names() {
            return Err(Error::corrupt("archive retains no file names"));
        }

        let folder_count = header.folders as u64;
        let file_count = header.files as u64;
        if TES4_HEADER_SIZE + folder_count * header.folder_record_size() + file_count * 16 > len {
            return Err(Error::corrupt(format!(
                "declared {folder_count} folders and {file_count} files but archive is only {len} bytes"
            )));
        }

        let folders = (0..folder_count)
            .map(|_| {
                Tes4FolderRecord::read_args(&mut reader, (header.version,)).map_err(Error::from)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut entries = Vec::with_capacity(file_count as usize);
        for folder in &folders {
            let folder_name = if header.directory_strings() {
                Some(read_bzstring(&mut reader)?)
            } else {
                None
            };

            let remaining = len - reader.position();
            if folder.files as u64 * 16 > remaining {
                return Err(Error::corrupt(format!(
                    "folder declares {} files but only {remaining} bytes remain",
                    folder.files
                )));
            }

            for _ in 0..folder.files {
                entries.push((folder_name.clone(), Tes4FileRecord::read(&mut reader)?));
            }
        }

        if entries.len() as u64 != file_count {
            return Err(Error::corrupt(format!(
                "header declares {file_count} files but folders hold {}",
                entries.len()
            )));
        }

        let mut file_names = if header.file_strings() {
            let block = sub_slice(data, reader.position(), header.file_names_len as u64)?;
            Some(block.split(|b| *b == 0))
        } else {
            None
        };

        let mut files = IndexMap::with_capacity(entries.len());
        for (folder_name, record) in entries {
            let mut data_start = record.data_offset() as u64;
            let mut stored = record.data_size() as u64;
            check_bounds(data, data_start, stored, "file record")?;

            let mut name = match file_names.as_mut() {
                Some(names) => {
                    let raw = names
                        .next()
                        .ok_or_else(|| Error::corrupt("file name block has too few names"))?;
                    Some(decode_name(raw)?.to_owned())
                }
                None => None,
            };

            let mut folder_name = folder_name;
            if header.embedded_file_names() {
                let block = sub_slice(data, data_start, stored)?;
                let prefix = *block
                    .first()
                    .ok_or_else(|| Error::corrupt("embedded name is missing"))?
                    as u64;
                let full = decode_name(sub_slice(block, 1, prefix)?)?;
                data_start += prefix + 1;
                stored -= prefix + 1;

                match full.rsplit_once(['\\', '/']) {
                    Some((folder, file)) => {
                        folder_name.get_or_insert_with(|| folder.to_owned());
                        name.get_or_insert_with(|| file.to_owned());
                    }
                    None => {
                        name.get_or_insert_with(|| full.to_owned());
                    }
                }
            }

            let name =
                name.ok_or_else(|| Error::corrupt("file record has no associated name"))?;
            let file_name = match folder_name.as_deref() {
                Some(folder) if !folder.is_empty() && folder != "." => format!("{folder}\\{name}"),
                _ => name,
            };

            let compressed = header.compressed() != record.toggles_compression();
            let (compression_method, uncompressed_size) = if compressed {
                if stored < 4 {
                    return Err(Error::corrupt(format!(
                        "compressed entry {file_name} is too small for its length prefix"
                    )));
                }
                let mut prefix = sub_slice(data, data_start, 4)?;
                let original = prefix.read_u32::<LittleEndian>()? as u64;
                data_start += 4;
                stored -= 4;
                (CompressionMethod::for_tes4_version(header.version), original)
            } else {
                (CompressionMethod::None, stored)
            };

            let file = BsaFileData {
                hash: record.hash,
                compression_method,
                compressed_size: stored,
                uncompressed_size,
                file_name: file_name.into(),
                data_start,
            };
            insert_file(&mut files, file);
        }

        Ok(Shared { version, files })
    }
}

fn insert_file(files: &mut IndexMap<Box<str>, BsaFileData>, file: BsaFileData) {
    if let Some(previous) = files.insert(file.file_name.clone(), file) {
        warn!(name = %previous.file_name, "duplicate entry, keeping the later record");
    }
}

fn check_bounds(data: &[u8], start: u64, len: u64, what: &str) -> Result<()> {
    match start.checked_add(len) {
        Some(end) if end <= data.len() as u64 => Ok(()),
        _ => Err(Error::corrupt(format!(
            "{what} at {start}+{len} extends past the end of the archive ({} bytes)",
            data.len()
        ))),
    }
}

fn sub_slice(data: &[u8], start: u64, len: u64) -> Result<&[u8]> {
    check_bounds(data, start, len, "block")?;
    Ok(&data[start as usize..(start + len) as usize])
}

fn decode_name(raw: &[u8]) -> Result<&str> {
    str::from_utf8(raw).map_err(|_| {
        Error::corrupt(format!(
            "name {} is not valid text",
            String::from_utf8_lossy(raw)
        ))
    })
}

/// Reads the NUL terminated name starting at `offset` of the name block
fn read_name(names: &[u8], offset: usize) -> Result<&str> {
    let tail = names.get(offset..).ok_or_else(|| {
        Error::corrupt(format!(
            "name offset {offset} is outside the name block ({} bytes)",
            names.len()
        ))
    })?;
    let end = tail
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| Error::corrupt(format!("name at offset {offset} is not terminated")))?;
    decode_name(&tail[..end])
}

/// Reads a length prefixed string whose length counts its NUL terminator
fn read_bzstring(reader: &mut Cursor<&[u8]>) -> Result<String> {
    let len = reader.read_u8()? as u64;
    let start = reader.position();
    let data: &[u8] = *reader.get_ref();
    let raw = sub_slice(data, start, len)?;
    reader.set_position(start + len);

    let raw = raw.strip_suffix(&[0]).unwrap_or(raw);
    Ok(decode_name(raw)?.to_owned())
}
