//! This library decodes the block graph of **NIF** model files used by *The Elder Scrolls* games.
//!
//! # NIF File Format Documentation
//!
//! A NIF file is a header followed by a flat list of typed blocks and a short footer. Blocks refer
//! to each other by their position in that list, so the graph may contain cycles. Only the
//! 20.2.0.5 to 20.3.0.9 family is understood; every header of that family records the payload
//! length of each block, so blocks of unknown types can be kept as raw bytes.
//!
//! ## Header
//!
//! | Field               | Type            | Description                                              |
//! |---------------------|-----------------|----------------------------------------------------------|
//! | Description         | line            | "Gamebryo File Format, Version 20.2.0.7" and a line feed |
//! | Version             | `u32` LE        | Packed `a.b.c.d`                                         |
//! | Endian              | `u8`            | 0 big endian, 1 little endian; applies to what follows   |
//! | User Version        | `u32`           |                                                          |
//! | Block Count         | `u32`           |                                                          |
//! | Bethesda Header     | optional        | Only for 20.2.0.7 with user version 3 or more            |
//! | Block Type Count    | `u16`           |                                                          |
//! | Block Types         | sized strings   | `u32` length then bytes                                  |
//! | Block Type Index    | `u16` per block | Bit 15 is masked off                                     |
//! | Block Sizes         | `u32` per block | Payload length in bytes                                  |
//! | String Count        | `u32`           |                                                          |
//! | Max String Length   | `u32`           |                                                          |
//! | Strings             | sized strings   | Referenced from blocks by index                          |
//! | Group Count         | `u32`           |                                                          |
//! | Groups              | `u32` each      |                                                          |
//!
//! The Bethesda header holds the stream version (`u32` LE), the author as an export string (`u8`
//! length including a NUL), an unknown `u32` past stream version 130, a process script before
//! stream version 131, the export script, and the max filepath at stream version 130.
//!
//! ## Blocks and Footer
//!
//! Payloads follow the header back to back. The footer is a `u32` root count and that many root
//! references. References are `i32` block indices with `-1` as null; string references are `u32`
//! indices into the header strings with `0xFFFFFFFF` as null.
//!

pub mod blocks;
pub mod error;
pub mod header;
pub mod read;
mod stream;

pub use blocks::{Block, BlockData, BlockRef};
pub use error::{Error, NifError};
pub use header::{Header, NifVersion};
pub use read::{NifFile, NifOptions};
