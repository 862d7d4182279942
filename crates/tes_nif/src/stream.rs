//! Bounds checked primitive reader honoring the byte order a file declares.

use std::io::Cursor;

use binrw::{BinReaderExt, Endian};

use crate::error::{Error, Result};

macro_rules! read_primitive {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self) -> Result<$ty> {
                self.ensure(1, std::mem::size_of::<$ty>() as u64)?;
                Ok(self.cursor.read_type::<$ty>(self.endian)?)
            }
        )*
    };
}

pub(crate) struct NifStream<'a> {
    cursor: Cursor<&'a [u8]>,
    endian: Endian,
}

impl<'a> NifStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_endian(data, Endian::Little)
    }

    pub fn with_endian(data: &'a [u8], endian: Endian) -> Self {
        Self {
            cursor: Cursor::new(data),
            endian,
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn remaining(&self) -> u64 {
        (self.cursor.get_ref().len() as u64).saturating_sub(self.cursor.position())
    }

    /// Fails unless `count` items of `size` bytes each are left
    pub fn ensure(&self, count: u64, size: u64) -> Result<()> {
        let remaining = self.remaining();
        match count.checked_mul(size) {
            Some(needed) if needed <= remaining => Ok(()),
            needed => Err(Error::TruncatedFile {
                offset: self.position(),
                needed: needed.unwrap_or(u64::MAX),
                remaining,
            }),
        }
    }

    /// Borrows the next `len` bytes
    pub fn take(&mut self, len: u64) -> Result<&'a [u8]> {
        self.ensure(1, len)?;
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.cursor.position() as usize;
        self.cursor.set_position((start as u64) + len);
        Ok(&data[start..start + len as usize])
    }

    read_primitive! {
        read_u8 => u8,
        read_u16 => u16,
        read_u32 => u32,
        read_i32 => i32,
        read_f32 => f32,
    }

    /// Reads a `u32` in little endian regardless of the declared order
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.ensure(1, 4)?;
        Ok(self.cursor.read_le::<u32>()?)
    }

    /// `u32` length followed by that many bytes
    pub fn read_sized_string(&mut self) -> Result<String> {
        let len = self.read_u32()?;
        let raw = self.take(len as u64)?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    /// `u8` length, counting a trailing NUL, followed by that many bytes
    pub fn read_export_string(&mut self) -> Result<String> {
        let len = self.read_u8()?;
        let raw = self.take(len as u64)?;
        let raw = raw.strip_suffix(&[0]).unwrap_or(raw);
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    /// Bytes up to the next `\n`, searching at most `limit` bytes
    pub fn read_line(&mut self, limit: usize) -> Option<&'a [u8]> {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.cursor.position() as usize;
        let window = &data[start.min(data.len())..];
        let end = window.iter().take(limit).position(|b| *b == b'\n')?;
        self.cursor.set_position((start + end + 1) as u64);
        Some(&window[..end])
    }
}
