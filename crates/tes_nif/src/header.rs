//! Header of NIF files: version, block type table, block sizes and the string table.

use std::{fmt, sync::Arc};

use binrw::Endian;
use tracing::{debug, instrument};

use crate::{
    blocks::KnownType,
    error::{Error, Result},
    read::NifOptions,
    stream::NifStream,
};

/// Packed `a.b.c.d` version number as stored in the header
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NifVersion(pub u32);

impl NifVersion {
    pub const V20_2_0_5: NifVersion = NifVersion::new(20, 2, 0, 5);
    pub const V20_2_0_7: NifVersion = NifVersion::new(20, 2, 0, 7);
    pub const V20_3_0_9: NifVersion = NifVersion::new(20, 3, 0, 9);

    pub const fn new(major: u8, minor: u8, patch: u8, build: u8) -> Self {
        NifVersion(
            (major as u32) << 24 | (minor as u32) << 16 | (patch as u32) << 8 | build as u32,
        )
    }

    /// Whether this decoder understands files of this version
    pub fn is_supported(&self) -> bool {
        (Self::V20_2_0_5..=Self::V20_3_0_9).contains(self)
    }
}

impl fmt::Display for NifVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, patch, build] = self.0.to_be_bytes();
        write!(f, "{major}.{minor}.{patch}.{build}")
    }
}

/// Exporter information written by Bethesda tools
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BsStreamHeader {
    pub version: u32,
    pub author: String,
    pub process_script: Option<String>,
    pub export_script: String,
    pub max_filepath: Option<String>,
}

/// Decoded NIF header
#[derive(Debug, Clone)]
pub struct Header {
    /// The text line opening the file, without its line feed
    pub description: String,
    pub version: NifVersion,
    pub endian: Endian,
    pub user_version: u32,
    pub bs_header: Option<BsStreamHeader>,
    /// Distinct block type names, indexed by [`Header::block_type_index`]
    pub block_types: Vec<Arc<str>>,
    /// Per block index into [`Header::block_types`]
    pub block_type_index: Vec<u16>,
    /// Per block payload length in bytes
    pub block_sizes: Vec<u32>,
    pub strings: Vec<Arc<str>>,
    pub max_string_length: u32,
    pub groups: Vec<u32>,
}

const SIGNATURES: [&str; 2] = [
    "Gamebryo File Format, Version ",
    "NetImmerse File Format, Version ",
];

const DESCRIPTION_LIMIT: usize = 256;

impl Header {
    /// Number of blocks following the header
    pub fn block_count(&self) -> usize {
        self.block_type_index.len()
    }

    /// The Bethesda stream version, 0 when the file has no Bethesda header
    pub fn bs_version(&self) -> u32 {
        self.bs_header.as_ref().map_or(0, |h| h.version)
    }

    /// Type name of the block at `index`
    pub fn block_type(&self, index: usize) -> Option<&Arc<str>> {
        let type_index = *self.block_type_index.get(index)?;
        self.block_types.get(type_index as usize)
    }

    #[instrument(skip_all, err)]
    pub(crate) fn read(stream: &mut NifStream<'_>, options: &NifOptions) -> Result<Header> {
        let description = stream
            .read_line(DESCRIPTION_LIMIT)
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .filter(|line| SIGNATURES.iter().any(|s| line.starts_with(s)))
            .ok_or_else(|| Error::UnsupportedVersion("unknown file signature".into()))?;

        let version = NifVersion(stream.read_u32_le()?);
        if !version.is_supported() {
            return Err(Error::UnsupportedVersion(version.to_string()));
        }

        let endian = match stream.read_u8()? {
            0 => Endian::Big,
            1 => Endian::Little,
            other => {
                return Err(Error::InvalidHeader(format!(
                    "endian flag {other} is neither 0 nor 1"
                )))
            }
        };
        stream.set_endian(endian);

        let user_version = stream.read_u32()?;
        let block_count = stream.read_u32()?;

        let bs_header = if version == NifVersion::V20_2_0_7 && user_version >= 3 {
            Some(Self::read_bs_header(stream)?)
        } else {
            None
        };

        let type_count = stream.read_u16()?;
        stream.ensure(type_count as u64, 4)?;
        let block_types = (0..type_count)
            .map(|_| stream.read_sized_string().map(Arc::from))
            .collect::<Result<Vec<Arc<str>>>>()?;

        for name in &block_types {
            if KnownType::from_name(name).is_none() {
                if !options.permissive {
                    return Err(Error::UnsupportedBlockType(name.to_string()));
                }
                debug!(block_type = %name, "keeping blocks of unsupported type opaque");
            }
        }

        // a type index and a size per block
        stream.ensure(block_count as u64, 6)?;
        let block_type_index = (0..block_count)
            .map(|i| {
                let index = stream.read_u16()? & 0x7FFF;
                if index >= type_count {
                    return Err(Error::InvalidHeader(format!(
                        "block {i} has type {index}, but only {type_count} types are declared"
                    )));
                }
                Ok(index)
            })
            .collect::<Result<Vec<_>>>()?;
        let block_sizes = (0..block_count)
            .map(|_| stream.read_u32())
            .collect::<Result<Vec<_>>>()?;

        let string_count = stream.read_u32()?;
        let max_string_length = stream.read_u32()?;
        stream.ensure(string_count as u64, 4)?;
        let strings = (0..string_count)
            .map(|_| stream.read_sized_string().map(Arc::from))
            .collect::<Result<Vec<Arc<str>>>>()?;

        let group_count = stream.read_u32()?;
        stream.ensure(group_count as u64, 4)?;
        let groups = (0..group_count)
            .map(|_| stream.read_u32())
            .collect::<Result<Vec<_>>>()?;

        debug!(
            %version,
            user_version,
            blocks = block_count,
            types = block_types.len(),
            strings = strings.len(),
            "read header"
        );

        Ok(Header {
            description,
            version,
            endian,
            user_version,
            bs_header,
            block_types,
            block_type_index,
            block_sizes,
            strings,
            max_string_length,
            groups,
        })
    }

    fn read_bs_header(stream: &mut NifStream<'_>) -> Result<BsStreamHeader> {
        let version = stream.read_u32_le()?;
        let author = stream.read_export_string()?;
        if version > 130 {
            let _unknown = stream.read_u32()?;
        }
        let process_script = if version < 131 {
            Some(stream.read_export_string()?)
        } else {
            None
        };
        let export_script = stream.read_export_string()?;
        let max_filepath = if version == 130 {
            Some(stream.read_export_string()?)
        } else {
            None
        };

        Ok(BsStreamHeader {
            version,
            author,
            process_script,
            export_script,
            max_filepath,
        })
    }
}
