#![allow(dead_code)]

use std::{fs, path::Path};

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

/// Payload of an `NiNode` without children, laid out for files without a Bethesda header
fn empty_node() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(-1i32).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0] {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(-1i32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out
}

/// A 20.2.0.7 file with one root block of `type_name`
fn single_block(type_name: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = b"Gamebryo File Format, Version 20.2.0.7\n".to_vec();
    out.extend_from_slice(&0x14020007u32.to_le_bytes());
    out.push(1);
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());

    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&(type_name.len() as u32).to_le_bytes());
    out.extend_from_slice(type_name.as_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());

    // strings, max string length, groups
    out.extend_from_slice(&[0; 12]);
    out.extend_from_slice(payload);

    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out
}

/// A decodable model
pub fn nif() -> Vec<u8> {
    single_block("NiNode", &empty_node())
}

/// A model whose only block has no decoder
pub fn opaque_nif() -> Vec<u8> {
    single_block("NiTriShapeData", &[7; 16])
}

/// Writes `files` below `root`, creating directories as needed
pub fn tree(root: &Path, files: &[(&str, &[u8])]) -> std::io::Result<()> {
    for (name, data) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
    }
    Ok(())
}
