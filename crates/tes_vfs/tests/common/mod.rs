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
