//! Base types for the table of contents of BSA files.

use binrw::BinRead;

/// Size of the fixed TES3 header in bytes
pub const TES3_HEADER_SIZE: u64 = 12;

/// Size of the fixed TES4 header in bytes
pub const TES4_HEADER_SIZE: u64 = 36;

/// TES3 file header
///
/// Morrowind archives start with the version word `0x00000100` and never compress their data.
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[br(magic = b"\x00\x01\x00\x00", little)]
pub struct Tes3Header {
    /// Offset of the hash table, counted from the end of this header
    pub hash_offset: u32,

    /// The number of files stored in the archive
    pub files: u32,
}

/// TES3 file record
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct Tes3Record {
    /// The size of the data for this record
    pub size: u32,

    /// The offset to the data for this record from the start of the data region
    pub offset: u32,
}

/// TES4 file header
///
/// Shared by Oblivion (103), Fallout 3 / Skyrim (104) and Skyrim Special Edition (105).
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[br(magic = b"BSA\0", little)]
pub struct Tes4Header {
    /// Layout version
    pub version: u32,

    /// Size of this header, always 36
    pub header_size: u32,

    /// Archive wide flags, see [`Tes4Header::directory_strings`] and friends
    pub archive_flags: u32,

    /// The number of folder records
    pub folders: u32,

    /// The number of file records over all folders
    pub files: u32,

    /// Total length of all folder names, including their length prefix
    pub folder_names_len: u32,

    /// Total length of the file name block
    pub file_names_len: u32,

    /// Content type hints, unused when reading
    pub file_flags: u16,

    pub padding: u16,
}

impl Tes4Header {
    const DIRECTORY_STRINGS: u32 = 1 << 0;
    const FILE_STRINGS: u32 = 1 << 1;
    const COMPRESSED: u32 = 1 << 2;
    const EMBEDDED_FILE_NAMES: u32 = 1 << 8;

    /// Folder names are stored in front of each folder's file records
    pub fn directory_strings(&self) -> bool {
        self.archive_flags & Self::DIRECTORY_STRINGS != 0
    }

    /// File names are stored in a block after all file records
    pub fn file_strings(&self) -> bool {
        self.archive_flags & Self::FILE_STRINGS != 0
    }

    /// Files are compressed unless their record toggles it
    pub fn compressed(&self) -> bool {
        self.archive_flags & Self::COMPRESSED != 0
    }

    /// Each file's data starts with its full path. Only honored from version 104.
    pub fn embedded_file_names(&self) -> bool {
        self.version >= 104 && self.archive_flags & Self::EMBEDDED_FILE_NAMES != 0
    }

    /// Size of one folder record for this version
    pub fn folder_record_size(&self) -> u64 {
        if self.version >= 105 {
            24
        } else {
            16
        }
    }
}

/// TES4 folder record
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little, import(version: u32))]
pub struct Tes4FolderRecord {
    pub hash: u64,

    /// The number of file records belonging to this folder
    #[br(pad_after = if version >= 105 { 12 } else { 4 })]
    pub files: u32,
}

/// TES4 file record
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct Tes4FileRecord {
    pub hash: u64,

    /// Size of the stored data. Bit 30 toggles compression, bit 31 is reserved.
    pub size: u32,

    /// Absolute offset of the stored data. Bit 31 marks a secondary archive.
    pub offset: u32,
}

impl Tes4FileRecord {
    const COMPRESSION_TOGGLE: u32 = 1 << 30;
    const RESERVED: u32 = 1 << 31;

    pub fn toggles_compression(&self) -> bool {
        self.size & Self::COMPRESSION_TOGGLE != 0
    }

    pub fn data_size(&self) -> u32 {
        self.size & !(Self::COMPRESSION_TOGGLE | Self::RESERVED)
    }

    pub fn data_offset(&self) -> u32 {
        self.offset & !Self::RESERVED
    }
}
