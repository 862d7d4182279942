//! Entry decompression handling.

use std::io::{self, Read};

use flate2::read::ZlibDecoder;
use lz4_flex::frame::FrameDecoder;
use tracing::instrument;

/// Identifies how the data of a single entry is stored inside the BSA file
///
/// TES3 archives are always [`CompressionMethod::None`]. TES4 archives select zlib up to version
/// 104 and LZ4 frames from version 105 onwards.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Stores the data as it is
    #[default]
    None,

    /// Compressed using Zlib
    Zlib,

    /// Compressed as an LZ4 frame
    Lz4,
}

impl CompressionMethod {
    /// The method a TES4 archive of `version` uses for its compressed entries
    pub fn for_tes4_version(version: u32) -> Self {
        if version >= 105 {
            CompressionMethod::Lz4
        } else {
            CompressionMethod::Zlib
        }
    }
}

/// Bounded reader over one entry's stored bytes
pub(crate) enum BsaBlockReader<'a> {
    Raw(&'a [u8]),
    Zlib(Box<SizedReader<ZlibDecoder<&'a [u8]>>>),
    Lz4(Box<SizedReader<FrameDecoder<&'a [u8]>>>),
}

impl<'a> BsaBlockReader<'a> {
    /// `size` is the decompressed length the entry declares; raw blocks are their own length
    #[tracing::instrument(skip(block), fields(len = block.len()))]
    pub fn new(block: &'a [u8], compression: CompressionMethod, size: u64) -> Self {
        match compression {
            CompressionMethod::None => BsaBlockReader::Raw(block),
            CompressionMethod::Zlib => {
                BsaBlockReader::Zlib(Box::new(SizedReader::new(ZlibDecoder::new(block), size)))
            }
            CompressionMethod::Lz4 => {
                BsaBlockReader::Lz4(Box::new(SizedReader::new(FrameDecoder::new(block), size)))
            }
        }
    }
}

impl Read for BsaBlockReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BsaBlockReader::Raw(r) => r.read(buf),
            BsaBlockReader::Zlib(r) => r.read(buf),
            BsaBlockReader::Lz4(r) => r.read(buf),
        }
    }

    #[instrument(skip_all, err)]
    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        match self {
            BsaBlockReader::Raw(r) => r.read_to_end(buf),
            BsaBlockReader::Zlib(r) => r.read_to_end(buf),
            BsaBlockReader::Lz4(r) => r.read_to_end(buf),
        }
    }
}

/// Yields exactly `size` bytes of a decoder's output
///
/// Output past the declared size, or a stream ending before it, is an [`io::ErrorKind::InvalidData`]
/// error.
pub(crate) struct SizedReader<R> {
    inner: R,
    size: u64,
    remaining: u64,
}

impl<R: Read> SizedReader<R> {
    fn new(inner: R, size: u64) -> Self {
        Self {
            inner,
            size,
            remaining: size,
        }
    }
}

impl<R: Read> Read for SizedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.remaining == 0 {
            let mut extra = [0u8; 1];
            return match self.inner.read(&mut extra)? {
                0 => Ok(0),
                _ => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "entry decompresses to more than its declared {} bytes",
                        self.size
                    ),
                )),
            };
        }

        let max = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let read = self.inner.read(&mut buf[..max])?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "entry decompresses to {} bytes but declares {}",
                    self.size - self.remaining,
                    self.size
                ),
            ));
        }
        self.remaining -= read as u64;
        Ok(read)
    }
}
