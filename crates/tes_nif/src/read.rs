//! Types for decoding NIF files
//!

use bon::Builder;
use std::{io::Read, sync::Arc};
use tracing::{debug, instrument, Level};

use crate::{
    blocks::{read_ref, Block, BlockContext, BlockData, BlockRef, KnownType},
    error::{Error, NifError, Result},
    header::Header,
    stream::NifStream,
};

/// Options for how NIF files are decoded
#[derive(Debug, Clone, Copy, Builder)]
pub struct NifOptions {
    /// Keep blocks of unknown types as raw bytes instead of failing
    #[builder(default = true)]
    pub permissive: bool,
}

impl Default for NifOptions {
    fn default() -> Self {
        NifOptions::builder().build()
    }
}

/// A decoded NIF file
///
/// ```
/// # fn doit() -> Result<(), tes_nif::error::NifError>
/// # {
/// use tes_nif::{NifFile, NifOptions};
///
/// let bytes = std::fs::read("meshes/clutter/bucket01.nif").unwrap_or_default();
/// # if bytes.is_empty() { return Ok(()); }
/// let nif = NifFile::parse(&bytes, "meshes/clutter/bucket01.nif", &NifOptions::default())?;
///
/// for root in nif.roots() {
///     println!("root block {} is a {}", root.index(), nif.type_name(*root).unwrap_or("?"));
/// }
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct NifFile {
    label: String,
    header: Header,
    blocks: Vec<Block>,
    roots: Vec<BlockRef>,
}

impl NifFile {
    /// Reads a whole stream and decodes it
    ///
    /// `label` is used verbatim in every error raised for this file.
    pub fn read<R: Read>(
        mut reader: R,
        label: impl Into<String>,
        options: &NifOptions,
    ) -> std::result::Result<Self, NifError> {
        let label = label.into();
        let mut data = Vec::new();
        if let Err(e) = reader.read_to_end(&mut data) {
            return Err(NifError {
                label,
                kind: e.into(),
            });
        }
        Self::parse(&data, label, options)
    }

    /// Decodes a NIF file held in memory
    pub fn parse(
        data: &[u8],
        label: impl Into<String>,
        options: &NifOptions,
    ) -> std::result::Result<Self, NifError> {
        Self::parse_labeled(data, label.into(), options)
    }

    #[instrument(level = Level::DEBUG, skip(data, options), fields(len = data.len()), err)]
    fn parse_labeled(
        data: &[u8],
        label: String,
        options: &NifOptions,
    ) -> std::result::Result<Self, NifError> {
        match Self::decode(data, options) {
            Ok((header, blocks, roots)) => Ok(NifFile {
                label,
                header,
                blocks,
                roots,
            }),
            Err(kind) => Err(NifError { label, kind }),
        }
    }

    fn decode(data: &[u8], options: &NifOptions) -> Result<(Header, Vec<Block>, Vec<BlockRef>)> {
        let mut stream = NifStream::new(data);
        let header = Header::read(&mut stream, options)?;

        let mut blocks = Vec::with_capacity(header.block_count());
        for index in 0..header.block_count() {
            let Some(type_name) = header.block_type(index).cloned() else {
                return Err(Error::InvalidHeader(format!("block {index} has no type")));
            };
            let size = header.block_sizes[index];
            let payload = stream.take(size as u64)?;

            let data = match KnownType::from_name(&type_name) {
                Some(kind) => {
                    let context = BlockContext {
                        header: &header,
                        index,
                    };
                    let mut block_stream = NifStream::with_endian(payload, stream.endian());
                    context.read(kind, &mut block_stream)?
                }
                None => BlockData::Unsupported(payload.into()),
            };

            blocks.push(Block {
                type_name,
                size,
                data,
            });
        }

        let root_count = stream.read_u32()?;
        stream.ensure(root_count as u64, 4)?;
        let mut roots = Vec::with_capacity(root_count as usize);
        for _ in 0..root_count {
            roots.extend(read_ref(&mut stream, blocks.len(), || "footer".to_string())?);
        }

        debug!(
            blocks = blocks.len(),
            unsupported = blocks.iter().filter(|b| b.data.is_unsupported()).count(),
            roots = roots.len(),
            "decoded file"
        );

        Ok((header, blocks, roots))
    }

    /// The diagnostic label this file was decoded under
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Blocks in file order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, block: BlockRef) -> Option<&Block> {
        self.blocks.get(block.index())
    }

    /// Type name of a block
    pub fn type_name(&self, block: BlockRef) -> Option<&str> {
        self.block(block).map(|b| &*b.type_name)
    }

    /// Root blocks listed in the footer
    pub fn roots(&self) -> &[BlockRef] {
        &self.roots
    }

    /// Every block `block` points at, resolved
    pub fn children(&self, block: BlockRef) -> impl Iterator<Item = (BlockRef, &Block)> + '_ {
        self.block(block)
            .map(|b| b.data.references())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| self.block(r).map(|b| (r, b)))
    }

    /// Shared header string table
    pub fn strings(&self) -> &[Arc<str>] {
        &self.header.strings
    }
}
