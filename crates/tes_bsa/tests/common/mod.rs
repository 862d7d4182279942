#![allow(dead_code)]

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};
use lz4_flex::frame::FrameEncoder;

/// Builds a Morrowind archive holding `files` in order
pub fn tes3(files: &[(&str, &[u8])]) -> Vec<u8> {
    let count = files.len() as u32;

    let mut names = Vec::new();
    let mut name_offsets = Vec::new();
    for (name, _) in files {
        name_offsets.push(names.len() as u32);
        names.extend_from_slice(name.as_bytes());
        names.push(0);
    }

    let mut out = Vec::new();
    out.extend_from_slice(&0x100u32.to_le_bytes());
    out.extend_from_slice(&(count * 12 + names.len() as u32).to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());

    let mut offset = 0u32;
    for (_, data) in files {
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        offset += data.len() as u32;
    }
    for name_offset in name_offsets {
        out.extend_from_slice(&name_offset.to_le_bytes());
    }
    out.extend_from_slice(&names);
    for _ in files {
        out.extend_from_slice(&0u64.to_le_bytes());
    }
    for (_, data) in files {
        out.extend_from_slice(data);
    }
    out
}

pub struct Tes4File<'a> {
    pub folder: &'a str,
    pub name: &'a str,
    pub data: &'a [u8],
    pub compress: bool,
}

pub struct Tes4Options {
    pub version: u32,
    pub file_strings: bool,
    pub embed_names: bool,
}

impl Default for Tes4Options {
    fn default() -> Self {
        Self {
            version: 104,
            file_strings: true,
            embed_names: false,
        }
    }
}

fn compress(version: u32, data: &[u8]) -> Vec<u8> {
    if version >= 105 {
        let mut encoder = FrameEncoder::new(Vec::new());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    } else {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }
}

/// Builds an Oblivion style archive. Files are grouped by folder in order of first appearance.
pub fn tes4(options: &Tes4Options, files: &[Tes4File]) -> Vec<u8> {
    let mut folders: Vec<(&str, Vec<&Tes4File>)> = Vec::new();
    for file in files {
        match folders.iter_mut().find(|(name, _)| *name == file.folder) {
            Some((_, entries)) => entries.push(file),
            None => folders.push((file.folder, vec![file])),
        }
    }

    let folder_record_size = if options.version >= 105 { 24 } else { 16 };
    let ordered: Vec<&Tes4File> = folders.iter().flat_map(|(_, f)| f.iter().copied()).collect();

    let mut file_names = Vec::new();
    if options.file_strings {
        for file in &ordered {
            file_names.extend_from_slice(file.name.as_bytes());
            file_names.push(0);
        }
    }

    let folder_blocks: usize = folders
        .iter()
        .map(|(name, entries)| name.len() + 2 + entries.len() * 16)
        .sum();
    let folder_names_len: usize = folders.iter().map(|(name, _)| name.len() + 1).sum();
    let data_start = 36 + folders.len() * folder_record_size + folder_blocks + file_names.len();

    let mut payloads = Vec::new();
    for file in &ordered {
        let mut payload = Vec::new();
        if options.embed_names {
            let full = format!("{}\\{}", file.folder, file.name);
            payload.push(full.len() as u8);
            payload.extend_from_slice(full.as_bytes());
        }
        if file.compress {
            payload.extend_from_slice(&(file.data.len() as u32).to_le_bytes());
            payload.extend_from_slice(&compress(options.version, file.data));
        } else {
            payload.extend_from_slice(file.data);
        }
        payloads.push(payload);
    }

    let mut flags = 1u32;
    if options.file_strings {
        flags |= 1 << 1;
    }
    if options.embed_names {
        flags |= 1 << 8;
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"BSA\0");
    out.extend_from_slice(&options.version.to_le_bytes());
    out.extend_from_slice(&36u32.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&(folders.len() as u32).to_le_bytes());
    out.extend_from_slice(&(ordered.len() as u32).to_le_bytes());
    out.extend_from_slice(&(folder_names_len as u32).to_le_bytes());
    out.extend_from_slice(&(file_names.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    for (_, entries) in &folders {
        out.extend_from_slice(&0u64.to_le_bytes());
        out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        if options.version >= 105 {
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&0u64.to_le_bytes());
        } else {
            out.extend_from_slice(&0u32.to_le_bytes());
        }
    }

    let mut offset = data_start;
    let mut index = 0;
    for (name, entries) in &folders {
        out.push(name.len() as u8 + 1);
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        for file in entries {
            let payload = &payloads[index];
            let mut size = payload.len() as u32;
            if file.compress {
                size |= 1 << 30;
            }
            out.extend_from_slice(&0u64.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
            out.extend_from_slice(&(offset as u32).to_le_bytes());
            offset += payload.len();
            index += 1;
        }
    }

    out.extend_from_slice(&file_names);
    assert_eq!(out.len(), data_start);
    for payload in payloads {
        out.extend_from_slice(&payload);
    }
    out
}
