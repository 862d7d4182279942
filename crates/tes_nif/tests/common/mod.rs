#![allow(dead_code)]

pub const V20_2_0_5: u32 = 0x14020005;
pub const V20_2_0_7: u32 = 0x14020007;

/// Byte sink writing in the order a file declares
#[derive(Default)]
pub struct Out {
    pub big_endian: bool,
    pub buf: Vec<u8>,
}

impl Out {
    pub fn new(big_endian: bool) -> Self {
        Self {
            big_endian,
            buf: Vec::new(),
        }
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        let bytes = if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
        self.buf.extend_from_slice(&bytes);
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        let bytes = if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
        self.buf.extend_from_slice(&bytes);
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.u32(v as u32)
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.u32(v.to_bits())
    }

    pub fn refs(&mut self, refs: &[i32]) -> &mut Self {
        self.u32(refs.len() as u32);
        for r in refs {
            self.i32(*r);
        }
        self
    }

    pub fn sized(&mut self, s: &str) -> &mut Self {
        self.u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn export(&mut self, s: &str) -> &mut Self {
        self.u8(s.len() as u8 + 1);
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        self
    }
}

/// Description of a NIF file to generate
pub struct Nif {
    pub description: String,
    pub version: u32,
    pub big_endian: bool,
    pub user_version: u32,
    pub bs_version: u32,
    pub strings: Vec<String>,
    pub blocks: Vec<(String, Vec<u8>)>,
    pub roots: Vec<i32>,
}

impl Default for Nif {
    fn default() -> Self {
        Self {
            description: "Gamebryo File Format, Version 20.2.0.7".to_string(),
            version: V20_2_0_7,
            big_endian: false,
            user_version: 12,
            bs_version: 83,
            strings: Vec::new(),
            blocks: Vec::new(),
            roots: vec![0],
        }
    }
}

impl Nif {
    fn out(&self) -> Out {
        Out::new(self.big_endian)
    }

    /// Stream version the payloads are laid out for
    pub fn stream_version(&self) -> u32 {
        if self.version == V20_2_0_7 && self.user_version >= 3 {
            self.bs_version
        } else {
            0
        }
    }

    fn write_av(&self, out: &mut Out, name: Option<u32>) {
        let bs = self.stream_version();
        out.u32(name.unwrap_or(u32::MAX)).refs(&[]).i32(-1);
        if bs > 26 {
            out.u32(14);
        } else {
            out.u16(14);
        }
        out.f32(1.0).f32(2.0).f32(3.0);
        for value in [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0] {
            out.f32(value);
        }
        out.f32(1.0);
        if bs <= 34 {
            out.refs(&[]);
        }
        out.i32(-1);
    }

    /// Payload of an `NiNode`
    pub fn node(&self, name: Option<u32>, children: &[i32]) -> Vec<u8> {
        let mut out = self.out();
        self.write_av(&mut out, name);
        out.refs(children);
        if self.stream_version() < 130 {
            out.refs(&[]);
        }
        out.buf
    }

    /// Payload of an `NiTriShape`
    pub fn tri_shape(&self, name: Option<u32>, data: i32, alpha: i32) -> Vec<u8> {
        let mut out = self.out();
        self.write_av(&mut out, name);
        out.i32(data).i32(-1);
        out.u32(1).u32(name.unwrap_or(u32::MAX)).u32(0);
        out.i32(0);
        if self.version >= V20_2_0_7 {
            out.u8(1);
        }
        if self.stream_version() > 34 {
            out.i32(-1).i32(alpha);
        }
        out.buf
    }

    /// Payload of an `NiStringExtraData`
    pub fn string_extra(&self, name: u32, value: u32) -> Vec<u8> {
        let mut out = self.out();
        out.u32(name).u32(value);
        out.buf
    }

    /// Payload of an `NiAlphaProperty`
    pub fn alpha(&self, flags: u16, threshold: u8) -> Vec<u8> {
        let mut out = self.out();
        out.u32(u32::MAX).refs(&[]).i32(-1).u16(flags).u8(threshold);
        out.buf
    }

    pub fn push(&mut self, type_name: &str, payload: Vec<u8>) {
        self.blocks.push((type_name.to_string(), payload));
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut types: Vec<&str> = Vec::new();
        let mut type_index = Vec::new();
        for (name, _) in &self.blocks {
            let index = match types.iter().position(|t| *t == name.as_str()) {
                Some(index) => index,
                None => {
                    types.push(name.as_str());
                    types.len() - 1
                }
            };
            type_index.push(index as u16);
        }

        let mut out = self.out();
        out.buf.extend_from_slice(self.description.as_bytes());
        out.buf.push(b'\n');
        out.buf.extend_from_slice(&self.version.to_le_bytes());
        out.u8(if self.big_endian { 0 } else { 1 });
        out.u32(self.user_version).u32(self.blocks.len() as u32);

        if self.version == V20_2_0_7 && self.user_version >= 3 {
            out.buf.extend_from_slice(&self.bs_version.to_le_bytes());
            out.export("tester");
            if self.bs_version > 130 {
                out.u32(0);
            }
            if self.bs_version < 131 {
                out.export("process");
            }
            out.export("export");
            if self.bs_version == 130 {
                out.export("max path");
            }
        }

        out.u16(types.len() as u16);
        for name in &types {
            out.sized(name);
        }
        for index in &type_index {
            out.u16(*index);
        }
        for (_, payload) in &self.blocks {
            out.u32(payload.len() as u32);
        }

        let max_len = self.strings.iter().map(String::len).max().unwrap_or(0);
        out.u32(self.strings.len() as u32).u32(max_len as u32);
        for s in &self.strings {
            out.sized(s);
        }
        out.u32(0);

        for (_, payload) in &self.blocks {
            out.buf.extend_from_slice(payload);
        }

        out.refs(&self.roots);
        out.buf
    }
}
